//! Execution trace: one record per step attempt, in execution order.

use crate::context::{ContextSnapshot, Fragment};
use crate::duration::DurationMs;
use crate::error::{SinkError, StepFailure};
use crate::id::{RunId, StepName};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serializable description of a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDescriptor {
    /// Machine-readable failure kind (`missing_key`, `connector`, ...).
    pub kind: String,
    /// External cause for connector/reasoning failures (`timeout`, `auth`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Whether a retry policy could apply.
    pub retryable: bool,
}

impl From<&StepFailure> for FailureDescriptor {
    fn from(failure: &StepFailure) -> Self {
        let cause = match failure {
            StepFailure::Connector(e) => Some(e.cause().to_owned()),
            StepFailure::Reasoning(e) => Some(e.cause().to_owned()),
            _ => None,
        };
        Self {
            kind: failure.kind().to_owned(),
            cause,
            message: failure.to_string(),
            retryable: failure.is_retryable(),
        }
    }
}

/// How one attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The attempt produced its outputs and they were merged.
    Success,
    /// The attempt failed.
    Failure(FailureDescriptor),
}

/// One step attempt.
///
/// Holds enough to answer "what input produced what output" for this
/// stage without re-running anything: the exact input snapshot handed to
/// the step and the exact fragment it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Run this entry belongs to.
    pub run_id: RunId,
    /// Position of the step in the workflow (0-based).
    pub index: usize,
    /// Step name.
    pub step: StepName,
    /// Attempt number for this step (1-based).
    pub attempt: u32,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished.
    pub finished_at: DateTime<Utc>,
    /// `finished_at - started_at`.
    pub latency: DurationMs,
    /// Declared inputs as seen by the step.
    pub inputs: ContextSnapshot,
    /// Outputs returned by the step (empty when nothing was returned).
    pub outputs: Fragment,
    /// How the attempt ended.
    pub outcome: Outcome,
}

impl TraceEntry {
    /// Whether the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// The failure, if the attempt failed.
    pub fn failure(&self) -> Option<&FailureDescriptor> {
        match &self.outcome {
            Outcome::Failure(f) => Some(f),
            Outcome::Success => None,
        }
    }

    /// Equality ignoring run id, timestamps and latency: did the two
    /// entries describe the same execution?
    pub fn same_execution(&self, other: &TraceEntry) -> bool {
        self.index == other.index
            && self.step == other.step
            && self.attempt == other.attempt
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.outcome == other.outcome
    }
}

/// Append-only, ordered record of a run.
///
/// Entries can be added but never changed or removed. Serializes as a
/// plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// Entries in execution order.
    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    /// Entries recorded for one step, in attempt order.
    pub fn for_step<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a TraceEntry> {
        self.entries.iter().filter(move |e| e.step == step)
    }

    /// Step names in execution order, one per attempt.
    pub fn step_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.step.as_str()).collect()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&TraceEntry> {
        self.entries.last()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry-wise [`TraceEntry::same_execution`].
    pub fn same_execution(&self, other: &Trace) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.same_execution(b))
    }
}

impl IntoIterator for Trace {
    type Item = TraceEntry;
    type IntoIter = std::vec::IntoIter<TraceEntry>;

    /// Consume the trace as a one-shot sequence.
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// External consumer of trace entries, fed while the run is in progress.
///
/// Sinks observe; they cannot change the run. A failing sink is logged by
/// the executor and the run continues.
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Receive one entry, right after it was recorded.
    async fn accept(&self, entry: &TraceEntry) -> Result<(), SinkError>;

    /// Called once when the run reaches a terminal state.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use crate::value::Value;
    use chrono::TimeDelta;

    fn entry(step: &str, attempt: u32, outcome: Outcome) -> TraceEntry {
        let started_at = Utc::now();
        let finished_at = started_at + TimeDelta::milliseconds(3);
        TraceEntry {
            run_id: RunId::new("run-1"),
            index: 0,
            step: StepName::new(step),
            attempt,
            started_at,
            finished_at,
            latency: DurationMs::between(started_at, finished_at),
            inputs: ContextSnapshot::default(),
            outputs: Fragment::new().with("x", Value::Int(1)),
            outcome,
        }
    }

    #[test]
    fn failure_descriptor_carries_cause() {
        let failure = StepFailure::from(ConnectorError::Auth("token expired".into()));
        let desc = FailureDescriptor::from(&failure);
        assert_eq!(desc.kind, "connector");
        assert_eq!(desc.cause.as_deref(), Some("auth"));
        assert!(desc.retryable);
    }

    #[test]
    fn same_execution_ignores_timing_and_run_id() {
        let a = entry("fetch", 1, Outcome::Success);
        let mut b = entry("fetch", 1, Outcome::Success);
        b.run_id = RunId::new("run-2");
        b.started_at = a.started_at + TimeDelta::seconds(60);
        b.latency = DurationMs::from_millis(999);
        assert!(a.same_execution(&b));

        let c = entry("fetch", 2, Outcome::Success);
        assert!(!a.same_execution(&c));
    }

    #[test]
    fn trace_is_ordered_and_filterable() {
        let mut trace = Trace::new();
        trace.record(entry("a", 1, Outcome::Success));
        trace.record(entry("b", 1, Outcome::Success));
        trace.record(entry("b", 2, Outcome::Success));
        assert_eq!(trace.step_names(), vec!["a", "b", "b"]);
        assert_eq!(trace.for_step("b").count(), 2);
        assert_eq!(trace.last().map(|e| e.attempt), Some(2));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(Outcome::Failure(FailureDescriptor {
            kind: "missing_key".into(),
            cause: None,
            message: "missing key: metrics".into(),
            retryable: false,
        }))
        .unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["kind"], "missing_key");
        assert!(json.get("cause").is_none());
    }

    #[test]
    fn trace_json_round_trip() {
        let mut trace = Trace::new();
        trace.record(entry("a", 1, Outcome::Success));
        let json = serde_json::to_string(&trace).unwrap();
        let back: Trace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trace);
    }
}
