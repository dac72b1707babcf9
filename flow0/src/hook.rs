//! The hook seam: observation of, and limited intervention in, a run.

use crate::error::HookError;
use crate::id::{RunId, StepName, WorkflowName};
use crate::trace::TraceEntry;
use crate::workflow::RunStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where in a run a hook fires.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// The run moved from `Idle` to `Running`.
    RunStarted,
    /// About to validate and invoke a step.
    BeforeStep,
    /// An attempt finished and its trace entry was recorded.
    AfterAttempt,
    /// About to wait and retry a failed attempt.
    BeforeRetry,
    /// The run reached a terminal state.
    RunFinished,
}

impl HookPoint {
    /// Whether a `Halt` returned at this point cancels the run.
    ///
    /// Only step boundaries can cancel; after an attempt or after the run
    /// there is nothing left to stop.
    pub fn can_halt(&self) -> bool {
        matches!(
            self,
            HookPoint::RunStarted | HookPoint::BeforeStep | HookPoint::BeforeRetry
        )
    }
}

/// What a hook sees. Read-only.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Current hook point.
    pub point: HookPoint,
    /// Run identifier.
    pub run_id: RunId,
    /// Workflow being run.
    pub workflow: WorkflowName,
    /// Current step (step-level points only).
    pub step: Option<StepName>,
    /// Current step position (step-level points only).
    pub index: Option<usize>,
    /// Attempt number (AfterAttempt and BeforeRetry).
    pub attempt: Option<u32>,
    /// The entry just recorded (AfterAttempt only).
    pub entry: Option<TraceEntry>,
    /// Run status at the time the hook fired.
    pub status: RunStatus,
}

impl HookContext {
    /// Create a context for a run-level point.
    pub fn new(point: HookPoint, run_id: RunId, workflow: WorkflowName, status: RunStatus) -> Self {
        Self {
            point,
            run_id,
            workflow,
            step: None,
            index: None,
            attempt: None,
            entry: None,
            status,
        }
    }

    /// Attach step identity.
    #[must_use]
    pub fn with_step(mut self, index: usize, step: StepName) -> Self {
        self.index = Some(index);
        self.step = Some(step);
        self
    }

    /// Attach an attempt number.
    #[must_use]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attach the recorded entry.
    #[must_use]
    pub fn with_entry(mut self, entry: TraceEntry) -> Self {
        self.entry = Some(entry);
        self
    }
}

/// What a hook decides.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Carry on.
    Continue,
    /// Cancel the run at this boundary. Ignored where
    /// [`HookPoint::can_halt`] is false.
    Halt {
        /// Why the run was halted.
        reason: String,
    },
}

/// An observer registered with the executor.
///
/// Hooks run inline on the executor's task, so they should be quick.
///
/// Implementations:
/// - `TracingHook`: structured `tracing` events per point
/// - `RecordingHook` (test-utils): records every context it sees
#[async_trait]
pub trait ExecHook: Send + Sync {
    /// Which points this hook fires at.
    fn points(&self) -> &[HookPoint];

    /// Called at each registered point. Errors are logged, not fatal.
    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError>;
}
