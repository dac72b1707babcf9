//! Trace files written from real executor runs.

use conductor_exec::ChainExecutor;
use conductor_trace_fs::{JsonlSink, read_trace_json, read_trace_jsonl, write_trace_json};
use flow0::test_utils::StaticStep;
use flow0::*;
use std::sync::Arc;

fn workflow() -> WorkflowDefinition {
    let fetch = StaticStep::new(
        StepDecl::new("fetch", StepKind::Action).output("metrics"),
        Fragment::new().with("metrics", Value::map([("conversion_delta", Value::Float(0.14))])),
    );
    let summarize = StaticStep::new(
        StepDecl::new("summarize", StepKind::Reasoning)
            .input("metrics")
            .output("summary")
            .retry(RetryPolicy::new(1)),
        Fragment::new().with("summary", "conversion up"),
    )
    .with_script(vec![Err(StepFailure::Reasoning(ReasoningError::Timeout(
        "slow".into(),
    )))]);
    WorkflowDefinition::builder("trace-files")
        .step(fetch)
        .step(summarize)
        .build()
        .unwrap()
}

#[tokio::test]
async fn jsonl_sink_streams_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs").join("trace.jsonl");
    let sink = Arc::new(JsonlSink::new(&path));

    let report = ChainExecutor::new()
        .with_sink(sink)
        .execute(&workflow(), Context::new())
        .await;
    assert!(report.is_completed(), "{:?}", report.error);

    let entries = read_trace_jsonl(&path).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.step.as_str()).collect::<Vec<_>>(),
        vec!["fetch", "summarize", "summarize"]
    );
    assert_eq!(entries[1].failure().map(|f| f.kind.as_str()), Some("reasoning"));
    assert_eq!(entries, report.trace.into_iter().collect::<Vec<_>>());
}

#[tokio::test]
async fn jsonl_sink_appends_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.jsonl");
    let wf = workflow();

    let first = ChainExecutor::new()
        .with_sink(Arc::new(JsonlSink::new(&path)))
        .execute(&wf, Context::new())
        .await;
    let second = ChainExecutor::new()
        .with_sink(Arc::new(JsonlSink::new(&path)))
        .execute(&wf, Context::new())
        .await;

    let entries = read_trace_jsonl(&path).await.unwrap();
    assert_eq!(entries.len(), 6);
    assert!(entries[..3].iter().all(|e| e.run_id == first.run_id));
    assert!(entries[3..].iter().all(|e| e.run_id == second.run_id));
}

#[tokio::test]
async fn whole_trace_export_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("trace.json");

    let report = ChainExecutor::new().execute(&workflow(), Context::new()).await;
    write_trace_json(&path, &report.trace).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.trim_start().starts_with('['));
    let back = read_trace_json(&path).await.unwrap();
    assert_eq!(back, report.trace);
    assert!(back.same_execution(&report.trace));
}

#[tokio::test]
async fn export_replaces_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.json");
    std::fs::write(&path, "stale contents that are longer than an empty array").unwrap();

    write_trace_json(&path, &Trace::new()).await.unwrap();

    assert_eq!(read_trace_json(&path).await.unwrap(), Trace::new());
}

#[tokio::test]
async fn non_finite_floats_read_back_from_both_formats() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("trace.json");
    let jsonl_path = dir.path().join("trace.jsonl");
    let ratios = StaticStep::new(
        StepDecl::new("ratios", StepKind::Transform).outputs(["ratio", "growth", "drop"]),
        Fragment::new()
            .with("ratio", Value::Float(f64::NAN))
            .with("growth", Value::Float(f64::INFINITY))
            .with("drop", Value::Float(f64::NEG_INFINITY)),
    );
    let wf = WorkflowDefinition::builder("ratios")
        .step(ratios)
        .build()
        .unwrap();

    let report = ChainExecutor::new()
        .with_sink(Arc::new(JsonlSink::new(&jsonl_path)))
        .execute(&wf, Context::new())
        .await;
    assert!(report.is_completed(), "{:?}", report.error);
    write_trace_json(&json_path, &report.trace).await.unwrap();

    let from_json = read_trace_json(&json_path).await.unwrap();
    let from_jsonl = read_trace_jsonl(&jsonl_path).await.unwrap();
    for entry in [from_json.last().unwrap(), &from_jsonl[0]] {
        let output = |key: &str| entry.outputs.get(key).and_then(Value::as_f64).unwrap();
        assert!(output("ratio").is_nan());
        assert_eq!(output("growth"), f64::INFINITY);
        assert_eq!(output("drop"), f64::NEG_INFINITY);
    }
}
