//! The built-in daily summary workflow.
//!
//! ```text
//! pull_data ─▶ summarize_metrics ─▶ build_action_plan ─▶ compose_email ─▶ send_email
//! ```
//!
//! The run is seeded with `report_date` so every step stays a function
//! of its inputs.

use std::sync::Arc;

use conductor::connectors::{Document, MemorySearch, Outbox, SentLog, StaticAnalytics};
use conductor::flow0::{
    Backoff, Connector, ContextSnapshot, DefinitionError, DurationMs, Fragment, Reasoner,
    RetryPolicy, StepDecl, StepKind, Value, WorkflowDefinition,
};
use conductor::steps::{ActionStep, Catalog, ReasoningStep, TransformStep};

/// Recipient of the summary email.
pub const RECIPIENT: &str = "growth-leads@example.com";

/// Name of the built-in analytics connector.
pub const ANALYTICS: &str = "analytics";

/// Name of the built-in email connector.
pub const EMAIL: &str = "email";

/// Name of the built-in search connector.
pub const SEARCH: &str = "search";

/// Messages the demo keeps for logging after a run.
const SENT_LOG_CAPACITY: usize = 16;

/// Prompt for the summary step.
pub const SUMMARY_PROMPT: &str = "You are a marketing analyst. These are this week's metrics:\n\
{raw_metrics}\n\n\
Reply with only a JSON object holding \"summary\" (two or three sentences), \
\"key_insight\" (one sentence) and \"recommendations\" (a list of three short actions).";

/// Weekly marketing metrics served by the built-in analytics connector.
pub fn sample_metrics() -> Value {
    Value::map([
        (
            "week_over_week",
            Value::map([
                ("conv_rate", Value::Float(0.14)),
                ("traffic", Value::Float(0.07)),
            ]),
        ),
        (
            "top_channels",
            Value::List(vec![
                Value::map([
                    ("name", Value::text("Organic")),
                    ("conv", Value::Float(0.036)),
                ]),
                Value::map([
                    ("name", Value::text("LinkedIn")),
                    ("conv", Value::Float(0.028)),
                ]),
            ]),
        ),
        (
            "notes",
            Value::text("Healthcare content gained traction among Pharma executives."),
        ),
    ])
}

/// Playbook notes served by the built-in search connector.
pub fn playbook() -> Vec<Document> {
    vec![
        Document::new(
            "linkedin-outreach",
            "LinkedIn outreach works best with short posts aimed at Pharma decision-makers.",
        ),
        Document::new(
            "organic-repurpose",
            "Repurpose top organic posts into short-form content for other channels.",
        ),
        Document::new(
            "creative-tests",
            "Run creative tests in pairs and keep one variable per test.",
        ),
    ]
}

/// Turn the recommendations into trackable tasks.
pub fn build_action_plan(input: &ContextSnapshot) -> Result<Fragment, String> {
    let recommendations = input
        .get("recommendations")
        .map_err(|e| e.to_string())?
        .as_list()
        .ok_or("recommendations is not a list")?;
    let plan = recommendations
        .iter()
        .zip(1i64..)
        .map(|(task, id)| {
            Value::map([
                ("id", Value::Int(id)),
                ("task", Value::text(task.render())),
                ("owner", Value::text("marketing")),
                ("due", Value::text("EOW")),
            ])
        })
        .collect();
    Ok(Fragment::new().with("action_plan", Value::List(plan)))
}

/// Write the subject and body of the summary email.
pub fn compose_email(input: &ContextSnapshot) -> Result<Fragment, String> {
    let text = |key: &str| {
        input
            .get(key)
            .map(Value::render)
            .map_err(|e| e.to_string())
    };
    let date = text("report_date")?;
    let mut body = format!(
        "Summary: {}\n\nKey Insight: {}\n\nAction Plan:",
        text("summary")?,
        text("key_insight")?
    );
    let plan = input.get("action_plan").map_err(|e| e.to_string())?;
    for item in plan.as_list().ok_or("action_plan is not a list")? {
        let field = |k: &str| item.get(k).map(Value::render).unwrap_or_default();
        body.push_str(&format!(
            "\n- {} (owner: {}, due: {})",
            field("task"),
            field("owner"),
            field("due")
        ));
    }
    Ok(Fragment::new()
        .with("subject", format!("[Daily Summary] {date}"))
        .with("body", body))
}

/// The collaborators the demo workflow calls.
pub struct DemoParts {
    /// Serves [`sample_metrics`].
    pub analytics: Arc<StaticAnalytics>,
    /// Receives the summary email.
    pub outbox: Arc<Outbox>,
    /// What the outbox accepted.
    pub sent: Arc<SentLog>,
    /// Writes the summary.
    pub reasoner: Arc<dyn Reasoner>,
}

impl DemoParts {
    /// Fresh built-in connectors around `reasoner`.
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        let sent = Arc::new(SentLog::new(SENT_LOG_CAPACITY));
        Self {
            analytics: Arc::new(StaticAnalytics::new(ANALYTICS, sample_metrics())),
            outbox: Arc::new(Outbox::new(EMAIL).with_log(sent.clone())),
            sent,
            reasoner,
        }
    }
}

/// Build the daily summary workflow.
pub fn workflow(parts: &DemoParts) -> Result<WorkflowDefinition, DefinitionError> {
    let analytics: Arc<dyn Connector> = parts.analytics.clone();
    let outbox: Arc<dyn Connector> = parts.outbox.clone();

    let pull_data = ActionStep::new(
        StepDecl::new("pull_data", StepKind::Action)
            .output("raw_metrics")
            .timeout(DurationMs::from_secs(10)),
        analytics,
    )?;
    let summarize = ReasoningStep::json(
        StepDecl::new("summarize_metrics", StepKind::Reasoning)
            .input("raw_metrics")
            .outputs(["summary", "key_insight", "recommendations"])
            .retry(RetryPolicy::new(2).with_backoff(Backoff::Exponential {
                initial: DurationMs::from_millis(500),
                factor: 2.0,
                max: DurationMs::from_secs(5),
            }))
            .timeout(DurationMs::from_secs(60)),
        parts.reasoner.clone(),
        SUMMARY_PROMPT,
    )?;
    let plan = TransformStep::new(
        StepDecl::new("build_action_plan", StepKind::Transform)
            .input("recommendations")
            .output("action_plan"),
        build_action_plan,
    )?;
    let compose = TransformStep::new(
        StepDecl::new("compose_email", StepKind::Transform)
            .inputs(["report_date", "summary", "key_insight", "action_plan"])
            .outputs(["subject", "body"]),
        compose_email,
    )?;
    let send = ActionStep::new(
        StepDecl::new("send_email", StepKind::Action)
            .inputs(["subject", "body"])
            .output("email_receipt"),
        outbox,
    )?
    .param("to", Value::List(vec![Value::text(RECIPIENT)]));

    WorkflowDefinition::builder("daily-summary")
        .step(pull_data)
        .step(summarize)
        .step(plan)
        .step(compose)
        .step(send)
        .build()
}

/// Catalog of fresh built-in connectors and transforms, for workflow files.
///
/// Connectors: `analytics`, `email`, `search`. Transforms: `action_plan`,
/// `compose_email`. Reasoners are added by the caller.
pub fn catalog() -> Catalog {
    Catalog::new()
        .with_connector(Arc::new(StaticAnalytics::new(ANALYTICS, sample_metrics())))
        .with_connector(Arc::new(Outbox::new(EMAIL)))
        .with_connector(Arc::new(MemorySearch::new(SEARCH, playbook())))
        .with_transform("action_plan", build_action_plan)
        .with_transform("compose_email", compose_email)
}
