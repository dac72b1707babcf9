//! RecordingHook: records every event, optionally halts before one step.

use crate::error::HookError;
use crate::hook::{ExecHook, HookAction, HookContext, HookPoint};
use async_trait::async_trait;
use std::sync::Mutex;

/// A hook that records every context it sees.
///
/// Returns [`HookAction::Continue`] unless built with
/// [`RecordingHook::halting_before`], in which case it halts at
/// `BeforeStep` for the named step.
pub struct RecordingHook {
    points: Vec<HookPoint>,
    halt_before: Option<String>,
    events: Mutex<Vec<HookContext>>,
}

impl RecordingHook {
    /// Fire at every point and always continue.
    pub fn new() -> Self {
        Self {
            points: vec![
                HookPoint::RunStarted,
                HookPoint::BeforeStep,
                HookPoint::AfterAttempt,
                HookPoint::BeforeRetry,
                HookPoint::RunFinished,
            ],
            halt_before: None,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Halt the run just before `step` starts.
    pub fn halting_before(step: &str) -> Self {
        Self {
            halt_before: Some(step.to_owned()),
            ..Self::new()
        }
    }

    /// Every context seen, in order.
    pub fn events(&self) -> Vec<HookContext> {
        self.events.lock().unwrap().clone()
    }

    /// Points seen, in order.
    pub fn points_seen(&self) -> Vec<HookPoint> {
        self.events.lock().unwrap().iter().map(|e| e.point).collect()
    }
}

impl Default for RecordingHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecHook for RecordingHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        self.events.lock().unwrap().push(ctx.clone());
        let halts_here = ctx.point == HookPoint::BeforeStep
            && matches!((&self.halt_before, &ctx.step), (Some(target), Some(step)) if step == target.as_str());
        if halts_here {
            return Ok(HookAction::Halt {
                reason: format!("halted before {}", ctx.step.as_ref().map(|s| s.as_str()).unwrap_or("?")),
            });
        }
        Ok(HookAction::Continue)
    }
}
