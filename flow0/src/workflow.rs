//! Workflow definitions and static wiring analysis.

use crate::error::DefinitionError;
use crate::id::{StepName, WorkflowName};
use crate::step::Step;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of one run: `Idle → Running → {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, not started.
    Idle,
    /// Executing steps.
    Running,
    /// Every step succeeded.
    Completed,
    /// A step failed or the run was cancelled.
    Failed,
}

impl RunStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Idle, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        })
    }
}

/// An immutable, ordered list of steps.
///
/// The order of `steps` is the execution order; there is no branching.
#[derive(Clone)]
pub struct WorkflowDefinition {
    name: WorkflowName,
    steps: Vec<Arc<dyn Step>>,
}

impl WorkflowDefinition {
    /// Start building a workflow.
    pub fn builder(name: impl Into<WorkflowName>) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &WorkflowName {
        &self.name
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Analyze the wiring without running anything.
    ///
    /// Walks the steps in order, tracking which keys exist given the seed
    /// keys, and reports inputs nobody produced before they are needed and
    /// outputs that would collide with an existing key.
    pub fn check<I, S>(&self, seed_keys: I) -> WiringReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // key -> producing step (None = seed)
        let mut available: BTreeMap<String, Option<StepName>> = seed_keys
            .into_iter()
            .map(|k| (k.into(), None))
            .collect();
        let mut issues = Vec::new();

        for step in &self.steps {
            let decl = step.decl();
            for key in decl.input_keys() {
                if !available.contains_key(key) {
                    issues.push(WiringIssue::UnsatisfiedInput {
                        step: decl.name().clone(),
                        key: key.clone(),
                    });
                }
            }
            for key in decl.output_keys() {
                match available.get(key) {
                    Some(first) => issues.push(WiringIssue::DuplicateProducer {
                        step: decl.name().clone(),
                        key: key.clone(),
                        first: first.clone(),
                    }),
                    None => {
                        available.insert(key.clone(), Some(decl.name().clone()));
                    }
                }
            }
        }

        WiringReport { issues }
    }
}

impl fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowDefinition")
            .field("name", &self.name)
            .field(
                "steps",
                &self
                    .steps
                    .iter()
                    .map(|s| s.decl().name().as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`WorkflowDefinition`].
pub struct WorkflowBuilder {
    name: WorkflowName,
    steps: Vec<Arc<dyn Step>>,
}

impl WorkflowBuilder {
    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Append a shared step.
    #[must_use]
    pub fn shared_step(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Validate every declaration and freeze the workflow.
    ///
    /// Rejects empty names, duplicate step names and inconsistent step
    /// declarations. Cross-step collisions are not rejected here; they are
    /// reported by [`WorkflowDefinition::check`] and enforced at run time.
    pub fn build(self) -> Result<WorkflowDefinition, DefinitionError> {
        if self.name.as_str().trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        let mut names = BTreeSet::new();
        for step in &self.steps {
            let decl = step.decl();
            decl.validate()?;
            if !names.insert(decl.name().clone()) {
                return Err(DefinitionError::DuplicateStep(decl.name().to_string()));
            }
        }
        Ok(WorkflowDefinition {
            name: self.name,
            steps: self.steps,
        })
    }
}

/// One problem found by [`WorkflowDefinition::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum WiringIssue {
    /// `step` reads `key`, but neither the seed nor an earlier step writes it.
    UnsatisfiedInput {
        /// Reading step.
        step: StepName,
        /// Unavailable key.
        key: String,
    },
    /// `step` writes `key`, which already exists by then.
    DuplicateProducer {
        /// Second writer.
        step: StepName,
        /// Colliding key.
        key: String,
        /// First writer; `None` when the key comes from the seed.
        first: Option<StepName>,
    },
}

impl fmt::Display for WiringIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WiringIssue::UnsatisfiedInput { step, key } => {
                write!(f, "{step}: input {key} is not available")
            }
            WiringIssue::DuplicateProducer {
                step,
                key,
                first: Some(first),
            } => write!(f, "{step}: output {key} is already produced by {first}"),
            WiringIssue::DuplicateProducer {
                step,
                key,
                first: None,
            } => write!(f, "{step}: output {key} is already present in the seed"),
        }
    }
}

/// Result of a static wiring check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WiringReport {
    /// Problems in step order.
    pub issues: Vec<WiringIssue>,
}

impl WiringReport {
    /// Whether no issue was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
