//! The `demo`, `run` and `check` subcommands.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use conductor::connectors::{HttpConnector, HttpConnectorConfig};
use conductor::exec::{ChainExecutor, RunReport, TracingHook};
use conductor::flow0::{
    Capability, Context, Reasoner, StepKind, Value, WiringReport, WorkflowSpec,
};
use conductor::reasoner_anthropic::AnthropicReasoner;
use conductor::steps::{Catalog, DEFAULT_REASONER};
use conductor::trace_fs::{JsonlSink, write_trace_json};
use tokio_util::sync::CancellationToken;

use crate::cli::{CheckArgs, DemoArgs, ReasonerArgs, RunArgs};
use crate::demo::{self, DemoParts};
use crate::offline::OfflineReasoner;
use crate::report::{render_check, render_run};

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The run completed, or the check found nothing.
    Success,
    /// The run failed, or the check found issues.
    Failure,
}

impl Verdict {
    fn of(report: &RunReport) -> Self {
        if report.is_completed() {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }
}

fn anthropic(args: &ReasonerArgs) -> Option<Arc<dyn Reasoner>> {
    let key = args.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
    let mut reasoner = AnthropicReasoner::new(key).model(args.model.as_str());
    if let Some(url) = &args.base_url {
        reasoner = reasoner.base_url(url.as_str());
    }
    Some(Arc::new(reasoner))
}

fn executor(jsonl: Option<&Path>, cancel: CancellationToken) -> ChainExecutor {
    let mut executor = ChainExecutor::new()
        .with_hook(Arc::new(TracingHook::new()))
        .with_cancellation(cancel);
    if let Some(path) = jsonl {
        executor = executor.with_sink(Arc::new(JsonlSink::new(path)));
    }
    executor
}

async fn finish(report: RunReport, trace: Option<&Path>) -> anyhow::Result<Verdict> {
    if let Some(path) = trace {
        write_trace_json(path, &report.trace)
            .await
            .with_context(|| format!("writing trace to {}", path.display()))?;
        tracing::info!(path = %path.display(), entries = report.trace.len(), "conductor.cli.trace_saved");
    }
    print!("{}", render_run(&report));
    Ok(Verdict::of(&report))
}

/// `conductor demo`: run the built-in daily summary.
pub async fn demo(args: DemoArgs, cancel: CancellationToken) -> anyhow::Result<Verdict> {
    let reasoner: Arc<dyn Reasoner> = match anthropic(&args.reasoner) {
        Some(reasoner) if !args.offline => reasoner,
        _ => {
            tracing::info!("conductor.cli.offline_reasoner");
            Arc::new(OfflineReasoner::new())
        }
    };
    let parts = DemoParts::new(reasoner);
    let workflow = demo::workflow(&parts).context("building the demo workflow")?;
    let seed = Context::seeded(BTreeMap::from([(
        "report_date".to_string(),
        Value::text(chrono::Utc::now().format("%Y-%m-%d").to_string()),
    )]));

    let report = executor(args.jsonl.as_deref(), cancel)
        .execute(&workflow, seed)
        .await;
    for message in parts.sent.messages() {
        tracing::info!(to = ?message.to, subject = %message.subject, "conductor.cli.email");
    }
    finish(report, Some(&args.trace)).await
}

/// `conductor run`: resolve and run a workflow file.
pub async fn run(args: RunArgs, cancel: CancellationToken) -> anyhow::Result<Verdict> {
    let spec = load_workflow(&args.workflow).await?;
    let seed = load_seed(args.seed.as_deref()).await?;

    let reasoner = if args.offline {
        Some(Arc::new(OfflineReasoner::new()) as Arc<dyn Reasoner>)
    } else {
        anthropic(&args.reasoner)
    };
    if reasoner.is_none() && spec.steps.iter().any(|s| s.kind == StepKind::Reasoning) {
        bail!(
            "workflow {} has reasoning steps; set ANTHROPIC_API_KEY, pass --api-key or --offline",
            spec.name
        );
    }
    let workflow = run_catalog(&args, reasoner)
        .build(&spec)
        .with_context(|| format!("resolving {}", args.workflow.display()))?;
    let report = executor(args.jsonl.as_deref(), cancel)
        .execute(&workflow, seed)
        .await;
    finish(report, args.trace.as_deref()).await
}

fn run_catalog(args: &RunArgs, reasoner: Option<Arc<dyn Reasoner>>) -> Catalog {
    let mut catalog = demo::catalog();
    if let Some(reasoner) = reasoner {
        catalog = catalog
            .with_reasoner(DEFAULT_REASONER, reasoner.clone())
            .with_reasoner("anthropic", reasoner);
    }
    for (name, url) in &args.http {
        let mut config = HttpConnectorConfig::new(name.as_str(), Capability::Query, url.as_str());
        if let Some(token) = &args.http_token {
            config = config.bearer_token(token.as_str());
        }
        catalog = catalog.with_connector(Arc::new(HttpConnector::new(config)));
    }
    catalog
}

/// `conductor check`: report wiring issues without running anything.
///
/// Every reasoner the file names resolves to a placeholder, since nothing
/// is called.
pub async fn check(args: CheckArgs) -> anyhow::Result<Verdict> {
    let spec = load_workflow(&args.workflow).await?;
    let seed = load_seed(args.seed.as_deref()).await?;

    let placeholder: Arc<dyn Reasoner> = Arc::new(OfflineReasoner::new());
    let mut catalog = demo::catalog().with_reasoner(DEFAULT_REASONER, placeholder.clone());
    for name in spec.steps.iter().filter_map(|s| s.reasoner.as_deref()) {
        catalog = catalog.with_reasoner(name, placeholder.clone());
    }
    let workflow = catalog
        .build(&spec)
        .with_context(|| format!("resolving {}", args.workflow.display()))?;

    let report: WiringReport = workflow.check(seed.keys().cloned());
    print!("{}", render_check(&spec.name, &report));
    Ok(if report.is_clean() {
        Verdict::Success
    } else {
        Verdict::Failure
    })
}

/// Read a workflow file.
pub async fn load_workflow(path: &Path) -> anyhow::Result<WorkflowSpec> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    WorkflowSpec::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Read a seed file: a JSON object whose fields become context keys.
pub async fn load_seed(path: Option<&Path>) -> anyhow::Result<Context> {
    let Some(path) = path else {
        return Ok(Context::new());
    };
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let serde_json::Value::Object(fields) = json else {
        bail!("{} must hold a JSON object", path.display());
    };
    Ok(Context::seeded(
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect(),
    ))
}
