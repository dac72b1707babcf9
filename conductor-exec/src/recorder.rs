//! Trace recording with live sinks.

use flow0::trace::{Trace, TraceEntry, TraceSink};
use std::sync::Arc;

/// Appends entries to a run's [`Trace`] and forwards each one to every
/// registered [`TraceSink`] as it is recorded.
///
/// Sink failures are logged and swallowed; the in-memory trace is the
/// source of truth and is always complete.
pub struct TraceRecorder {
    trace: Trace,
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl TraceRecorder {
    /// A recorder with an empty trace.
    pub fn new(sinks: Vec<Arc<dyn TraceSink>>) -> Self {
        Self {
            trace: Trace::new(),
            sinks,
        }
    }

    /// Append an entry and hand it to every sink.
    pub async fn record(&mut self, entry: TraceEntry) {
        for sink in &self.sinks {
            if let Err(e) = sink.accept(&entry).await {
                tracing::warn!(
                    run_id = %entry.run_id,
                    step = %entry.step,
                    attempt = entry.attempt,
                    error = %e,
                    "conductor.trace.sink_error"
                );
            }
        }
        self.trace.record(entry);
    }

    /// Flush every sink. Called once, when the run is terminal.
    pub async fn flush(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.flush().await {
                tracing::warn!(error = %e, "conductor.trace.flush_error");
            }
        }
    }

    /// The trace recorded so far.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consume the recorder, keeping the trace.
    pub fn into_trace(self) -> Trace {
        self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use flow0::context::{ContextSnapshot, Fragment};
    use flow0::duration::DurationMs;
    use flow0::id::{RunId, StepName};
    use flow0::test_utils::RecordingSink;
    use flow0::trace::Outcome;

    fn entry(step: &str) -> TraceEntry {
        let now = Utc::now();
        TraceEntry {
            run_id: RunId::new("r"),
            index: 0,
            step: StepName::new(step),
            attempt: 1,
            started_at: now,
            finished_at: now,
            latency: DurationMs::ZERO,
            inputs: ContextSnapshot::default(),
            outputs: Fragment::new(),
            outcome: Outcome::Success,
        }
    }

    #[tokio::test]
    async fn entries_reach_sinks_in_order() {
        let sink = Arc::new(RecordingSink::new());
        let shared: Arc<dyn TraceSink> = sink.clone();
        let mut recorder = TraceRecorder::new(vec![shared]);
        recorder.record(entry("a")).await;
        recorder.record(entry("b")).await;
        recorder.flush().await;

        let names: Vec<String> = sink.entries().iter().map(|e| e.step.to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(sink.flushes(), 1);
        assert_eq!(recorder.trace().len(), 2);
    }

    #[tokio::test]
    async fn failing_sink_does_not_lose_entries() {
        let failing: Arc<dyn TraceSink> = Arc::new(RecordingSink::failing());
        let mut recorder = TraceRecorder::new(vec![failing]);
        recorder.record(entry("a")).await;
        recorder.flush().await;
        assert_eq!(recorder.into_trace().step_names(), vec!["a"]);
    }
}
