//! A workflow document resolved by the catalog runs end to end.

use conductor_exec::ChainExecutor;
use conductor_steps::{Catalog, CatalogError};
use flow0::test_utils::{StubConnector, StubReasoner};
use flow0::*;
use std::sync::Arc;

const DOCUMENT: &str = r#"{
    "name": "weekly-report",
    "steps": [
        { "name": "fetch_analytics", "kind": "action", "connector": "analytics",
          "outputs": ["metrics"], "params": { "range": "7d" } },
        { "name": "summarize", "kind": "reasoning",
          "inputs": ["metrics"], "outputs": ["summary"],
          "prompt": "Summarize {metrics}", "retry": { "max_retries": 1 } },
        { "name": "shout", "kind": "transform", "transform": "upper",
          "inputs": ["summary"], "outputs": ["headline"] },
        { "name": "email_report", "kind": "action", "connector": "outbox",
          "inputs": ["headline"], "outputs": ["delivery_status"], "timeout_ms": 5000 }
    ]
}"#;

fn catalog(analytics: Arc<StubConnector>, outbox: Arc<StubConnector>) -> Catalog {
    Catalog::new()
        .with_connector(analytics)
        .with_connector(outbox)
        .with_reasoner(
            "default",
            Arc::new(StubReasoner::fixed("conversion up 14%").with_script(vec![Err(
                ReasoningError::Timeout("slow model".into()),
            )])),
        )
        .with_transform("upper", |input| {
            let text = input
                .get("summary")
                .map_err(|e| e.to_string())?
                .render()
                .to_uppercase();
            Ok(Fragment::new().with("headline", text))
        })
}

#[tokio::test]
async fn document_runs_through_the_executor() {
    let analytics = Arc::new(StubConnector::returning(
        "analytics",
        Capability::Fetch,
        Value::map([("conversion_delta", Value::Float(0.14))]),
    ));
    let outbox = Arc::new(StubConnector::returning(
        "outbox",
        Capability::Send,
        Value::text("sent"),
    ));
    let spec = WorkflowSpec::from_json_str(DOCUMENT).unwrap();
    let wf = catalog(analytics.clone(), outbox.clone()).build(&spec).unwrap();
    assert!(wf.check(Vec::<String>::new()).is_clean());

    let report = ChainExecutor::new().execute(&wf, Context::new()).await;

    assert!(report.is_completed(), "{:?}", report.error);
    assert_eq!(
        report.trace.step_names(),
        vec!["fetch_analytics", "summarize", "summarize", "shout", "email_report"]
    );
    assert_eq!(
        report.context.get("headline").unwrap(),
        &Value::text("CONVERSION UP 14%")
    );
    assert_eq!(report.context.get("delivery_status").unwrap(), &Value::text("sent"));
    assert_eq!(
        analytics.requests()[0].get("range"),
        Some(&Value::text("7d"))
    );
    assert_eq!(
        outbox.requests()[0].get("headline"),
        Some(&Value::text("CONVERSION UP 14%"))
    );
}

#[test]
fn unknown_transform_fails_to_resolve() {
    let spec = WorkflowSpec::from_json_str(
        r#"{"name": "wf", "steps": [
            {"name": "t", "kind": "transform", "transform": "missing", "outputs": ["x"]}
        ]}"#,
    )
    .unwrap();
    let err = Catalog::new().build(&spec).unwrap_err();
    assert_eq!(
        err,
        CatalogError::UnknownTransform {
            step: "t".into(),
            name: "missing".into()
        }
    );
}

#[test]
fn duplicate_step_names_fail_to_build() {
    let spec = WorkflowSpec::from_json_str(
        r#"{"name": "wf", "steps": [
            {"name": "t", "kind": "transform", "transform": "id", "outputs": ["x"]},
            {"name": "t", "kind": "transform", "transform": "id", "outputs": ["y"]}
        ]}"#,
    )
    .unwrap();
    let catalog = Catalog::new().with_transform("id", |_| Ok(Fragment::new()));
    assert_eq!(
        catalog.build(&spec).unwrap_err(),
        CatalogError::Definition(DefinitionError::DuplicateStep("t".into()))
    );
}
