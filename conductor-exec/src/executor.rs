use crate::hooks::HookRegistry;
use crate::recorder::TraceRecorder;
use chrono::Utc;
use flow0::context::{Context, ContextSnapshot, Fragment};
use flow0::duration::DurationMs;
use flow0::error::{RunError, StepError, StepFailure};
use flow0::hook::{ExecHook, HookAction, HookContext, HookPoint};
use flow0::id::{RunId, WorkflowName};
use flow0::step::{Step, StepDecl};
use flow0::trace::{FailureDescriptor, Outcome, Trace, TraceEntry, TraceSink};
use flow0::workflow::{RunStatus, WorkflowDefinition};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The outcome of one run: terminal status, the context as it stood when
/// the run ended, and every trace entry recorded.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Workflow that was run.
    pub workflow: WorkflowName,
    /// `Completed` or `Failed`.
    pub status: RunStatus,
    /// Final context on success, partial context on failure.
    pub context: Context,
    /// Every attempt, in execution order.
    pub trace: Trace,
    /// Why the run failed; `None` when it completed.
    pub error: Option<RunError>,
}

impl RunReport {
    /// Whether every step succeeded.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Final context and trace on success, the run error otherwise.
    pub fn into_result(self) -> Result<(Context, Trace), RunError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.context, self.trace)),
        }
    }
}

/// Runs workflows step by step.
///
/// The executor carries configuration only (hooks, sinks, a cancellation
/// token). Context, trace and status live inside one [`execute`] call, so
/// one executor can serve any number of runs, concurrently or not.
///
/// [`execute`]: ChainExecutor::execute
#[derive(Clone, Default)]
pub struct ChainExecutor {
    hooks: HookRegistry,
    sinks: Vec<Arc<dyn TraceSink>>,
    cancel: Option<CancellationToken>,
}

impl ChainExecutor {
    /// An executor with no hooks, no sinks and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook. Hooks are called in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn ExecHook>) -> Self {
        self.hooks.add(hook);
        self
    }

    /// Register a sink that receives every entry as it is recorded.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Observe `token` at step and attempt boundaries and during retry
    /// backoff. Once cancelled, every later run fails immediately.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run `workflow` from `context` under a fresh run id.
    pub async fn execute(&self, workflow: &WorkflowDefinition, context: Context) -> RunReport {
        self.execute_as(RunId::generate(), workflow, context).await
    }

    /// Run `workflow` from `context` under the given run id.
    pub async fn execute_as(
        &self,
        run_id: RunId,
        workflow: &WorkflowDefinition,
        context: Context,
    ) -> RunReport {
        let mut run = Run {
            id: run_id,
            workflow: workflow.name().clone(),
            status: RunStatus::Idle,
            context,
            recorder: TraceRecorder::new(self.sinks.clone()),
        };
        run.transition(RunStatus::Running);
        tracing::info!(
            run_id = %run.id,
            workflow = %run.workflow,
            steps = workflow.len(),
            seed_keys = run.context.len(),
            "conductor.run.start"
        );

        let result = self.drive(&mut run, workflow).await;
        self.finish(run, result.err()).await
    }

    async fn drive(&self, run: &mut Run, workflow: &WorkflowDefinition) -> Result<(), RunError> {
        self.boundary(run, run.hook_context(HookPoint::RunStarted))
            .await?;

        for (index, step) in workflow.steps().iter().enumerate() {
            let name = step.decl().name().clone();
            self.boundary(
                run,
                run.hook_context(HookPoint::BeforeStep)
                    .with_step(index, name),
            )
            .await?;
            self.run_step(run, index, step.as_ref()).await?;
        }
        Ok(())
    }

    async fn run_step(&self, run: &mut Run, index: usize, step: &dyn Step) -> Result<(), RunError> {
        let decl = step.decl();

        let input = match run.context.select(decl.input_keys()) {
            Ok(input) => input,
            Err(missing) => {
                let now = Utc::now();
                let present = present_inputs(&run.context, decl);
                let failure = StepFailure::from(missing);
                let entry = run.entry(index, decl, 1, now, now, present, Fragment::new(), Err(&failure));
                self.after_attempt(run, index, decl, entry).await;
                tracing::warn!(run_id = %run.id, step = %decl.name(), error = %failure, "conductor.step.failed");
                return Err(StepError::new(decl.name().clone(), failure).into());
            }
        };

        let max_attempts = decl.retry_policy().map_or(1, |p| p.max_attempts());
        let mut attempt: u32 = 1;
        loop {
            let started_at = Utc::now();
            let result = attempt_once(step, decl, input.clone()).await;
            let finished_at = Utc::now();

            let (outputs, failure) = match result {
                Ok(fragment) => {
                    let failure = check_outputs(decl, &fragment)
                        .and_then(|()| run.context.merge(fragment.clone()).map_err(StepFailure::from))
                        .err();
                    (fragment, failure)
                }
                Err(failure) => (Fragment::new(), Some(failure)),
            };

            let entry = run.entry(
                index,
                decl,
                attempt,
                started_at,
                finished_at,
                input.clone(),
                outputs,
                failure.as_ref().map_or(Ok(()), Err),
            );
            self.after_attempt(run, index, decl, entry).await;

            let Some(failure) = failure else {
                return Ok(());
            };

            if !failure.is_retryable() || attempt >= max_attempts {
                tracing::warn!(
                    run_id = %run.id,
                    step = %decl.name(),
                    attempt,
                    error = %failure,
                    "conductor.step.failed"
                );
                return Err(StepError::new(decl.name().clone(), failure).into());
            }

            let delay = decl
                .retry_policy()
                .map_or(DurationMs::ZERO, |p| p.delay_before(attempt, failure.retry_after()));
            tracing::debug!(
                run_id = %run.id,
                step = %decl.name(),
                attempt,
                delay_ms = delay.as_millis(),
                error = %failure,
                "conductor.step.backoff"
            );
            self.boundary(
                run,
                run.hook_context(HookPoint::BeforeRetry)
                    .with_step(index, decl.name().clone())
                    .with_attempt(attempt + 1),
            )
            .await?;
            self.pause(delay).await?;
            attempt += 1;
        }
    }

    async fn after_attempt(&self, run: &mut Run, index: usize, decl: &StepDecl, entry: TraceEntry) {
        let ctx = run
            .hook_context(HookPoint::AfterAttempt)
            .with_step(index, decl.name().clone())
            .with_attempt(entry.attempt)
            .with_entry(entry.clone());
        run.recorder.record(entry).await;
        self.notify(&ctx).await;
    }

    /// Check the cancellation token, then give hooks a chance to halt.
    async fn boundary(&self, run: &Run, ctx: HookContext) -> Result<(), RunError> {
        self.check_cancelled()?;
        match self.hooks.dispatch(&ctx).await {
            HookAction::Halt { reason } if ctx.point.can_halt() => {
                Err(RunError::Cancelled { reason })
            }
            HookAction::Halt { reason } => {
                tracing::debug!(run_id = %run.id, point = ?ctx.point, reason = %reason, "conductor.hook.halt_ignored");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Dispatch at a point that cannot halt.
    async fn notify(&self, ctx: &HookContext) {
        if let HookAction::Halt { reason } = self.hooks.dispatch(ctx).await {
            tracing::debug!(run_id = %ctx.run_id, point = ?ctx.point, reason = %reason, "conductor.hook.halt_ignored");
        }
    }

    fn check_cancelled(&self) -> Result<(), RunError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(cancelled()),
            _ => Ok(()),
        }
    }

    async fn pause(&self, delay: DurationMs) -> Result<(), RunError> {
        if delay == DurationMs::ZERO {
            return self.check_cancelled();
        }
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(cancelled()),
                    _ = tokio::time::sleep(delay.to_std()) => Ok(()),
                }
            }
            None => {
                tokio::time::sleep(delay.to_std()).await;
                Ok(())
            }
        }
    }

    async fn finish(&self, mut run: Run, error: Option<RunError>) -> RunReport {
        let status = if error.is_some() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        run.transition(status);

        self.notify(&run.hook_context(HookPoint::RunFinished)).await;
        run.recorder.flush().await;

        match &error {
            None => tracing::info!(
                run_id = %run.id,
                workflow = %run.workflow,
                entries = run.recorder.trace().len(),
                "conductor.run.completed"
            ),
            Some(err) => tracing::warn!(
                run_id = %run.id,
                workflow = %run.workflow,
                entries = run.recorder.trace().len(),
                error = %err,
                "conductor.run.failed"
            ),
        }

        RunReport {
            run_id: run.id,
            workflow: run.workflow,
            status: run.status,
            context: run.context,
            trace: run.recorder.into_trace(),
            error,
        }
    }
}

/// Per-run state. Created by `execute_as`, consumed by `finish`.
struct Run {
    id: RunId,
    workflow: WorkflowName,
    status: RunStatus,
    context: Context,
    recorder: TraceRecorder,
}

impl Run {
    fn transition(&mut self, next: RunStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.status
        );
        self.status = next;
    }

    fn hook_context(&self, point: HookPoint) -> HookContext {
        HookContext::new(point, self.id.clone(), self.workflow.clone(), self.status)
    }

    #[allow(clippy::too_many_arguments)]
    fn entry(
        &self,
        index: usize,
        decl: &StepDecl,
        attempt: u32,
        started_at: chrono::DateTime<Utc>,
        finished_at: chrono::DateTime<Utc>,
        inputs: ContextSnapshot,
        outputs: Fragment,
        result: Result<(), &StepFailure>,
    ) -> TraceEntry {
        TraceEntry {
            run_id: self.id.clone(),
            index,
            step: decl.name().clone(),
            attempt,
            started_at,
            finished_at,
            latency: DurationMs::between(started_at, finished_at),
            inputs,
            outputs,
            outcome: match result {
                Ok(()) => Outcome::Success,
                Err(failure) => Outcome::Failure(FailureDescriptor::from(failure)),
            },
        }
    }
}

/// One attempt, bounded by the step's timeout if it has one.
async fn attempt_once(
    step: &dyn Step,
    decl: &StepDecl,
    input: ContextSnapshot,
) -> Result<Fragment, StepFailure> {
    match decl.timeout_limit() {
        Some(limit) => match tokio::time::timeout(limit.to_std(), step.run(input)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(StepFailure::TimedOut { after: limit }),
        },
        None => step.run(input).await,
    }
}

/// The returned fragment must hold exactly the declared outputs.
fn check_outputs(decl: &StepDecl, fragment: &Fragment) -> Result<(), StepFailure> {
    if let Some(key) = fragment.keys().find(|k| !decl.declares_output(k)) {
        return Err(StepFailure::UndeclaredOutput { key: key.clone() });
    }
    if let Some(key) = decl
        .output_keys()
        .iter()
        .find(|k| fragment.get(k).is_none())
    {
        return Err(StepFailure::MissingOutput { key: key.clone() });
    }
    Ok(())
}

/// Declared inputs that are present, for the entry of a step that never ran.
fn present_inputs(context: &Context, decl: &StepDecl) -> ContextSnapshot {
    let present: BTreeMap<String, flow0::value::Value> = decl
        .input_keys()
        .iter()
        .filter_map(|k| context.get(k).ok().map(|v| (k.clone(), v.clone())))
        .collect();
    ContextSnapshot::from(present)
}

fn cancelled() -> RunError {
    RunError::Cancelled {
        reason: "cancellation requested".into(),
    }
}
