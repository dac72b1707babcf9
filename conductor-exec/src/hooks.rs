//! Ordered hook pipeline.

use flow0::hook::{ExecHook, HookAction, HookContext};
use std::sync::Arc;

/// A registry that dispatches executor events to an ordered list of hooks.
///
/// Hooks are called in registration order. The pipeline stops at the first
/// `Halt`; later hooks are not called for that event. Hook errors are
/// logged and treated as `Continue`.
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn ExecHook>>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook to the end of the pipeline.
    pub fn add(&mut self, hook: Arc<dyn ExecHook>) {
        self.hooks.push(hook);
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Dispatch one event through the pipeline.
    pub async fn dispatch(&self, ctx: &HookContext) -> HookAction {
        for hook in &self.hooks {
            if !hook.points().contains(&ctx.point) {
                continue;
            }

            match hook.on_event(ctx).await {
                Ok(HookAction::Continue) => continue,
                Ok(action) => return action,
                Err(e) => {
                    tracing::warn!(
                        point = ?ctx.point,
                        run_id = %ctx.run_id,
                        error = %e,
                        "conductor.hook.error"
                    );
                    continue;
                }
            }
        }

        HookAction::Continue
    }
}
