//! A deterministic stand-in for a language model, used when no API key
//! is configured.

use async_trait::async_trait;
use conductor::flow0::{ReasoningError, ReasoningRequest, ReasoningResponse, Reasoner, Value};

/// Answers the daily-summary prompt from the metrics in the request
/// context, without calling out.
///
/// Reads `raw_metrics` (`week_over_week.conv_rate`, `top_channels[].name`,
/// `notes`) and answers with the JSON object the summary step expects.
/// Requests without `raw_metrics` fail with `InvalidOutput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineReasoner;

impl OfflineReasoner {
    /// Create the offline reasoner.
    pub fn new() -> Self {
        Self
    }
}

fn summarize(metrics: &Value) -> serde_json::Value {
    let delta = metrics
        .path(&["week_over_week", "conv_rate"])
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let channels: Vec<&str> = metrics
        .get("top_channels")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|c| c.get("name").and_then(Value::as_text))
        .collect();

    let direction = if delta < 0.0 { "fell" } else { "rose" };
    let percent = (delta.abs() * 100.0).round() as i64;
    let mut summary = format!("Conversion rate {direction} {percent}% week-over-week.");
    match channels.as_slice() {
        [] => {}
        [one] => summary.push_str(&format!(" {one} remains the leading channel.")),
        [first, second, ..] => {
            summary.push_str(&format!(" {first} and {second} remain leading channels."))
        }
    }
    if let Some(notes) = metrics.get("notes").and_then(Value::as_text) {
        summary.push(' ');
        summary.push_str(notes);
    }

    let lead = channels.first().copied().unwrap_or("Organic");
    serde_json::json!({
        "summary": summary,
        "key_insight": format!("{lead} content is driving higher-quality engagement."),
        "recommendations": [
            "Increase LinkedIn outreach toward Pharma decision-makers.",
            "Repurpose top organic posts into short-form LinkedIn content.",
            "Test two creative variations focused on clinical impact."
        ]
    })
}

#[async_trait]
impl Reasoner for OfflineReasoner {
    fn name(&self) -> &str {
        "offline"
    }

    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        let metrics = request.context.get("raw_metrics").map_err(|_| {
            ReasoningError::InvalidOutput("offline reasoner needs raw_metrics".into())
        })?;
        Ok(ReasoningResponse::new(summarize(metrics).to_string()))
    }
}
