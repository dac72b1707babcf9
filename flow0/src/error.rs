//! Error types for each seam.
//!
//! All errors here are `Clone + PartialEq`: they end up inside trace
//! entries, and traces from two runs must be comparable.

use crate::duration::DurationMs;
use crate::id::StepName;
use thiserror::Error;

/// Context access errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A key was read that no step (or seed) has written.
    #[error("missing key: {key}")]
    MissingKey {
        /// The absent key.
        key: String,
    },

    /// A key was written that is already present.
    #[error("key collision: {key} is already present")]
    KeyCollision {
        /// The key that was already present.
        key: String,
    },
}

/// Failures of a single connector call.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// The external system did not answer in time.
    #[error("connector timed out: {0}")]
    Timeout(String),

    /// Credentials were rejected.
    #[error("connector auth failed: {0}")]
    Auth(String),

    /// The external system asked us to slow down.
    #[error("connector rate limited")]
    RateLimit {
        /// How long the external system asked us to wait, if it said.
        retry_after: Option<DurationMs>,
    },

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request was rejected before the external system was contacted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network failure that is neither a timeout nor an HTTP status.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ConnectorError {
    /// Short machine-readable cause, as written to traces.
    pub fn cause(&self) -> &'static str {
        match self {
            ConnectorError::Timeout(_) => "timeout",
            ConnectorError::Auth(_) => "auth",
            ConnectorError::RateLimit { .. } => "rate_limit",
            ConnectorError::MalformedResponse(_) => "malformed_response",
            ConnectorError::InvalidRequest(_) => "invalid_request",
            ConnectorError::Transport(_) => "transport",
        }
    }
}

/// Failures of the reasoning capability.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReasoningError {
    /// The model did not answer in time.
    #[error("reasoning timed out: {0}")]
    Timeout(String),

    /// Quota or rate limit exhausted.
    #[error("reasoning quota exhausted")]
    Quota {
        /// How long the provider asked us to wait, if it said.
        retry_after: Option<DurationMs>,
    },

    /// The generated output did not satisfy the step's contract.
    #[error("invalid reasoning output: {0}")]
    InvalidOutput(String),

    /// Credentials were rejected.
    #[error("reasoning auth failed: {0}")]
    Auth(String),

    /// Any other provider or network failure.
    #[error("reasoning transport error: {0}")]
    Transport(String),
}

impl ReasoningError {
    /// Short machine-readable cause, as written to traces.
    pub fn cause(&self) -> &'static str {
        match self {
            ReasoningError::Timeout(_) => "timeout",
            ReasoningError::Quota { .. } => "quota",
            ReasoningError::InvalidOutput(_) => "invalid_output",
            ReasoningError::Auth(_) => "auth",
            ReasoningError::Transport(_) => "transport",
        }
    }
}

/// Why a step attempt failed. Wrapped with the step's name in [`StepError`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepFailure {
    /// A declared input was not present in the context.
    #[error("missing key: {key}")]
    MissingKey {
        /// The absent input key.
        key: String,
    },

    /// A produced output was already present in the context.
    #[error("key collision: {key} is already present")]
    KeyCollision {
        /// The colliding output key.
        key: String,
    },

    /// The step returned a key it did not declare.
    #[error("undeclared output: {key}")]
    UndeclaredOutput {
        /// The undeclared key.
        key: String,
    },

    /// The step did not return a key it declared.
    #[error("missing declared output: {key}")]
    MissingOutput {
        /// The declared key that was not produced.
        key: String,
    },

    /// A connector call failed.
    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// A reasoning call failed.
    #[error("reasoning error: {0}")]
    Reasoning(#[from] ReasoningError),

    /// The attempt exceeded the step's configured timeout.
    #[error("step timed out after {after}")]
    TimedOut {
        /// The configured timeout.
        after: DurationMs,
    },

    /// A pure transform rejected its input.
    #[error("transform failed: {0}")]
    Transform(String),
}

impl StepFailure {
    /// Short machine-readable kind, as written to traces.
    pub fn kind(&self) -> &'static str {
        match self {
            StepFailure::MissingKey { .. } => "missing_key",
            StepFailure::KeyCollision { .. } => "key_collision",
            StepFailure::UndeclaredOutput { .. } => "undeclared_output",
            StepFailure::MissingOutput { .. } => "missing_output",
            StepFailure::Connector(_) => "connector",
            StepFailure::Reasoning(_) => "reasoning",
            StepFailure::TimedOut { .. } => "timed_out",
            StepFailure::Transform(_) => "transform",
        }
    }

    /// Whether a configured retry policy applies to this failure.
    ///
    /// Wiring and contract violations are never retried: running the same
    /// step on the same input would fail the same way.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StepFailure::Connector(_) | StepFailure::Reasoning(_) | StepFailure::TimedOut { .. }
        )
    }

    /// Minimum wait the external system asked for, if any.
    pub fn retry_after(&self) -> Option<DurationMs> {
        match self {
            StepFailure::Connector(ConnectorError::RateLimit { retry_after })
            | StepFailure::Reasoning(ReasoningError::Quota { retry_after }) => *retry_after,
            _ => None,
        }
    }
}

impl From<ContextError> for StepFailure {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::MissingKey { key } => StepFailure::MissingKey { key },
            ContextError::KeyCollision { key } => StepFailure::KeyCollision { key },
        }
    }
}

/// A step failure with the failing step's identity attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step {step} failed: {cause}")]
pub struct StepError {
    /// The step that failed.
    pub step: StepName,
    /// What went wrong.
    pub cause: StepFailure,
}

impl StepError {
    /// Attach a step name to a failure.
    pub fn new(step: StepName, cause: impl Into<StepFailure>) -> Self {
        Self {
            step,
            cause: cause.into(),
        }
    }
}

/// Why a run ended in the `Failed` state.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// A step failed and no retries remained.
    #[error(transparent)]
    Step(#[from] StepError),

    /// The run was cancelled at a step boundary.
    #[error("run cancelled: {reason}")]
    Cancelled {
        /// Who or what cancelled the run.
        reason: String,
    },
}

/// Workflow construction errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A step or workflow name was empty.
    #[error("empty name")]
    EmptyName,

    /// Two steps share a name.
    #[error("duplicate step name: {0}")]
    DuplicateStep(String),

    /// A step lists the same input twice.
    #[error("step {step} declares input {key} twice")]
    DuplicateInput {
        /// Offending step.
        step: String,
        /// Repeated key.
        key: String,
    },

    /// A step lists the same output twice.
    #[error("step {step} declares output {key} twice")]
    DuplicateOutput {
        /// Offending step.
        step: String,
        /// Repeated key.
        key: String,
    },

    /// A step declaration is unusable for its kind.
    #[error("step {step} is invalid: {reason}")]
    Invalid {
        /// Offending step.
        step: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A declarative workflow document could not be parsed.
    #[error("workflow parse error: {0}")]
    Parse(String),
}

/// Trace sink errors. Logged by the executor; they never fail a run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the sink failed.
    #[error("sink io error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be serialized.
    #[error("sink serialization error: {0}")]
    Serialization(String),
}

/// Hook errors. Logged by the executor; they never halt a run
/// (use `HookAction::Halt` to halt).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook execution failed.
    #[error("hook failed: {0}")]
    Failed(String),
}
