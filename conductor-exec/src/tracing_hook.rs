//! Concrete [`ExecHook`] using the [`tracing`] crate.

use async_trait::async_trait;
use flow0::error::HookError;
use flow0::hook::{ExecHook, HookAction, HookContext, HookPoint};
use flow0::trace::Outcome;

const ALL_POINTS: &[HookPoint] = &[
    HookPoint::RunStarted,
    HookPoint::BeforeStep,
    HookPoint::AfterAttempt,
    HookPoint::BeforeRetry,
    HookPoint::RunFinished,
];

/// An [`ExecHook`] that emits structured [`tracing`] events.
///
/// Always returns [`HookAction::Continue`]: observes but never controls.
///
/// | Point | Event | Level |
/// |-------|-------|-------|
/// | RunStarted | `conductor.run.started` | `INFO` |
/// | BeforeStep | `conductor.step.start` | `DEBUG` |
/// | AfterAttempt | `conductor.step.attempt` | `DEBUG` (`WARN` on failure) |
/// | BeforeRetry | `conductor.step.retry` | `INFO` |
/// | RunFinished | `conductor.run.finished` | `INFO` |
///
/// ```
/// use conductor_exec::{ChainExecutor, TracingHook};
/// use std::sync::Arc;
///
/// let executor = ChainExecutor::new().with_hook(Arc::new(TracingHook::new()));
/// ```
pub struct TracingHook;

impl TracingHook {
    /// Create a new `TracingHook`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecHook for TracingHook {
    fn points(&self) -> &[HookPoint] {
        ALL_POINTS
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        let step = ctx.step.as_ref().map(|s| s.as_str()).unwrap_or("");
        match ctx.point {
            HookPoint::RunStarted => {
                tracing::info!(run_id = %ctx.run_id, workflow = %ctx.workflow, "conductor.run.started");
            }
            HookPoint::BeforeStep => {
                tracing::debug!(run_id = %ctx.run_id, step, index = ?ctx.index, "conductor.step.start");
            }
            HookPoint::AfterAttempt => match ctx.entry.as_ref().map(|e| (&e.outcome, e.latency)) {
                Some((Outcome::Failure(failure), latency)) => {
                    tracing::warn!(
                        run_id = %ctx.run_id,
                        step,
                        attempt = ?ctx.attempt,
                        latency_ms = latency.as_millis(),
                        kind = %failure.kind,
                        cause = ?failure.cause,
                        retryable = failure.retryable,
                        "conductor.step.attempt"
                    );
                }
                Some((Outcome::Success, latency)) => {
                    tracing::debug!(
                        run_id = %ctx.run_id,
                        step,
                        attempt = ?ctx.attempt,
                        latency_ms = latency.as_millis(),
                        "conductor.step.attempt"
                    );
                }
                None => {}
            },
            HookPoint::BeforeRetry => {
                tracing::info!(run_id = %ctx.run_id, step, attempt = ?ctx.attempt, "conductor.step.retry");
            }
            HookPoint::RunFinished => {
                tracing::info!(run_id = %ctx.run_id, workflow = %ctx.workflow, status = %ctx.status, "conductor.run.finished");
            }
            _ => {}
        }
        Ok(HookAction::Continue)
    }
}
