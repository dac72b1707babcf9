//! The in-memory stubs behave as documented.
//! Run with: cargo test --features test-utils --test stubs

#![cfg(feature = "test-utils")]

use flow0::test_utils::{RecordingHook, RecordingSink, StaticStep, StubConnector, StubReasoner};
use flow0::*;
use std::sync::Arc;

#[tokio::test]
async fn stub_connector_plays_script_then_fallback() {
    let connector = StubConnector::returning("analytics", Capability::Fetch, Value::Int(7))
        .with_script(vec![Err(ConnectorError::Timeout("slow".into()))]);

    let first = connector.call(Value::text("q")).await;
    let second = connector.call(Value::Null).await;

    assert_eq!(first, Err(ConnectorError::Timeout("slow".into())));
    assert_eq!(second, Ok(Value::Int(7)));
    assert_eq!(connector.calls(), 2);
    assert_eq!(connector.requests()[0], Value::text("q"));
}

#[tokio::test]
async fn stub_connector_is_usable_as_dyn_connector() {
    let connector: Arc<dyn Connector> =
        Arc::new(StubConnector::returning("mail", Capability::Send, Value::Null));
    assert_eq!(connector.name().as_str(), "mail");
    assert_eq!(connector.capability(), Capability::Send);
}

#[tokio::test]
async fn stub_reasoner_echoes_prompt() {
    let reasoner = StubReasoner::echo();
    let response = reasoner
        .reason(ReasoningRequest::new("hello", ContextSnapshot::default()))
        .await
        .unwrap();
    assert_eq!(response.text, "reasoned: hello");
    assert_eq!(reasoner.prompts(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn stub_reasoner_script_overrides_answer() {
    let reasoner = StubReasoner::fixed("ok").with_script(vec![Err(ReasoningError::Quota {
        retry_after: None,
    })]);
    let request = ReasoningRequest::new("p", ContextSnapshot::default());
    assert!(reasoner.reason(request.clone()).await.is_err());
    assert_eq!(reasoner.reason(request).await.unwrap().text, "ok");
    assert_eq!(reasoner.calls(), 2);
}

#[tokio::test]
async fn static_step_records_inputs() {
    let step = StaticStep::new(
        StepDecl::new("s", StepKind::Transform).output("x"),
        Fragment::new().with("x", 1i64),
    );
    let out = step.run(ContextSnapshot::default()).await.unwrap();
    assert_eq!(out.get("x"), Some(&Value::Int(1)));
    assert_eq!(step.calls(), 1);
}

#[tokio::test]
async fn recording_sink_collects_and_fails_on_demand() {
    let sink = RecordingSink::new();
    sink.flush().await.unwrap();
    assert_eq!(sink.flushes(), 1);
    assert!(sink.entries().is_empty());

    let failing = RecordingSink::failing();
    assert!(failing.flush().await.is_err());
}

#[tokio::test]
async fn recording_hook_halts_only_before_its_step() {
    let hook = RecordingHook::halting_before("send");
    let base = HookContext::new(
        HookPoint::BeforeStep,
        RunId::new("r"),
        WorkflowName::new("wf"),
        RunStatus::Running,
    );

    let other = hook
        .on_event(&base.clone().with_step(0, StepName::new("fetch")))
        .await
        .unwrap();
    let target = hook
        .on_event(&base.with_step(1, StepName::new("send")))
        .await
        .unwrap();

    assert_eq!(other, HookAction::Continue);
    assert!(matches!(target, HookAction::Halt { .. }));
    assert_eq!(hook.points_seen(), vec![HookPoint::BeforeStep, HookPoint::BeforeStep]);
}
