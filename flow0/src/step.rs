//! The Step seam: one named unit of work with a declared key contract.

use crate::context::{ContextSnapshot, Fragment};
use crate::duration::DurationMs;
use crate::error::{DefinitionError, StepFailure};
use crate::id::StepName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// One call to a reasoning capability.
    Reasoning,
    /// One call to a connector.
    Action,
    /// Pure in-process computation.
    Transform,
}

/// Delay between retry attempts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same delay before every retry.
    Fixed {
        /// Delay before each retry.
        delay: DurationMs,
    },
    /// `initial * factor^(retry - 1)`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        initial: DurationMs,
        /// Growth factor per retry.
        factor: f64,
        /// Upper bound on any single delay.
        max: DurationMs,
    },
}

impl Backoff {
    /// Delay before the `retry`-th retry (1-based).
    pub fn delay_for(&self, retry: u32) -> DurationMs {
        match self {
            Backoff::None => DurationMs::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
                initial.scaled(factor.powi(exponent)).min(*max)
            }
        }
    }
}

/// Bounded retry policy for one step.
///
/// A step with `max_retries = R` is attempted at most `R + 1` times.
/// Only retryable failures (see [`StepFailure::is_retryable`]) consume
/// retries; contract violations fail immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay strategy between attempts.
    #[serde(default)]
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry up to `max_retries` times with no delay.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// Set the delay strategy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts allowed, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// How long to wait before the `retry`-th retry, never less than the
    /// external system's own `retry_after` hint.
    pub fn delay_before(&self, retry: u32, hint: Option<DurationMs>) -> DurationMs {
        let delay = self.backoff.delay_for(retry);
        match hint {
            Some(hint) => delay.max(hint),
            None => delay,
        }
    }
}

/// The static half of a step: identity, key contract and policies.
///
/// Built once, validated when the workflow is built, never mutated.
///
/// ```
/// use flow0::{RetryPolicy, StepDecl, StepKind};
///
/// let decl = StepDecl::new("summarize", StepKind::Reasoning)
///     .input("metrics")
///     .output("summary")
///     .retry(RetryPolicy::new(2));
/// assert!(decl.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StepDecl {
    name: StepName,
    kind: StepKind,
    inputs: Vec<String>,
    outputs: Vec<String>,
    retry: Option<RetryPolicy>,
    timeout: Option<DurationMs>,
}

impl StepDecl {
    /// Start a declaration with no keys and no policies.
    pub fn new(name: impl Into<StepName>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            retry: None,
            timeout: None,
        }
    }

    /// Declare a required input key.
    #[must_use]
    pub fn input(mut self, key: impl Into<String>) -> Self {
        self.inputs.push(key.into());
        self
    }

    /// Declare several required input keys.
    #[must_use]
    pub fn inputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Declare a produced output key.
    #[must_use]
    pub fn output(mut self, key: impl Into<String>) -> Self {
        self.outputs.push(key.into());
        self
    }

    /// Declare several produced output keys.
    #[must_use]
    pub fn outputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Attach a retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Bound every attempt by a timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: DurationMs) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Step name.
    pub fn name(&self) -> &StepName {
        &self.name
    }

    /// Step kind.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Required input keys, in declaration order.
    pub fn input_keys(&self) -> &[String] {
        &self.inputs
    }

    /// Produced output keys, in declaration order.
    pub fn output_keys(&self) -> &[String] {
        &self.outputs
    }

    /// Retry policy, if any.
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }

    /// Per-attempt timeout, if any.
    pub fn timeout_limit(&self) -> Option<DurationMs> {
        self.timeout
    }

    /// Whether `key` is a declared output.
    pub fn declares_output(&self, key: &str) -> bool {
        self.outputs.iter().any(|k| k == key)
    }

    /// Check the declaration for internal consistency.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.as_str().trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        let step = self.name.to_string();

        let mut seen = BTreeSet::new();
        for key in &self.inputs {
            if !seen.insert(key.as_str()) {
                return Err(DefinitionError::DuplicateInput {
                    step,
                    key: key.clone(),
                });
            }
        }

        let mut produced = BTreeSet::new();
        for key in &self.outputs {
            if key.is_empty() {
                return Err(DefinitionError::Invalid {
                    step,
                    reason: "empty output key".into(),
                });
            }
            if !produced.insert(key.as_str()) {
                return Err(DefinitionError::DuplicateOutput {
                    step,
                    key: key.clone(),
                });
            }
            if seen.contains(key.as_str()) {
                return Err(DefinitionError::Invalid {
                    step,
                    reason: format!("{key} is both an input and an output"),
                });
            }
        }

        if self.kind == StepKind::Reasoning && self.outputs.is_empty() {
            return Err(DefinitionError::Invalid {
                step,
                reason: "reasoning steps must declare at least one output".into(),
            });
        }
        Ok(())
    }
}

/// A single named unit of work.
///
/// The executor calls [`Step::run`] with a snapshot holding exactly the
/// declared inputs, after checking they are all present. The returned
/// fragment must hold exactly the declared outputs; the executor rejects
/// anything else before touching the context.
///
/// Steps must not keep anything from one call to the next that depends on
/// the run they were called from.
#[async_trait]
pub trait Step: Send + Sync {
    /// The step's static declaration.
    fn decl(&self) -> &StepDecl;

    /// Execute one attempt.
    async fn run(&self, input: ContextSnapshot) -> Result<Fragment, StepFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_grows_and_caps() {
        let backoff = Backoff::Exponential {
            initial: DurationMs::from_millis(100),
            factor: 2.0,
            max: DurationMs::from_millis(350),
        };
        assert_eq!(backoff.delay_for(1).as_millis(), 100);
        assert_eq!(backoff.delay_for(2).as_millis(), 200);
        assert_eq!(backoff.delay_for(3).as_millis(), 350);
    }

    #[test]
    fn retry_hint_raises_delay() {
        let policy = RetryPolicy::new(3).with_backoff(Backoff::Fixed {
            delay: DurationMs::from_millis(10),
        });
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_before(1, None).as_millis(), 10);
        assert_eq!(
            policy
                .delay_before(1, Some(DurationMs::from_millis(500)))
                .as_millis(),
            500
        );
    }

    #[test]
    fn retry_policy_deserializes_with_default_backoff() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_retries": 2}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(2));
        let policy: RetryPolicy = serde_json::from_str(
            r#"{"max_retries": 1, "backoff": {"strategy": "fixed", "delay": 250}}"#,
        )
        .unwrap();
        assert_eq!(
            policy.backoff,
            Backoff::Fixed {
                delay: DurationMs::from_millis(250)
            }
        );
    }

    #[test]
    fn validate_rejects_duplicate_outputs() {
        let decl = StepDecl::new("s", StepKind::Action)
            .output("a")
            .output("a");
        assert_eq!(
            decl.validate(),
            Err(DefinitionError::DuplicateOutput {
                step: "s".into(),
                key: "a".into()
            })
        );
    }

    #[test]
    fn validate_rejects_read_write_of_same_key() {
        let decl = StepDecl::new("s", StepKind::Transform)
            .input("a")
            .output("a");
        assert!(matches!(
            decl.validate(),
            Err(DefinitionError::Invalid { .. })
        ));
    }

    #[test]
    fn validate_requires_reasoning_outputs() {
        let decl = StepDecl::new("think", StepKind::Reasoning).input("q");
        assert!(decl.validate().is_err());
        assert_eq!(
            StepDecl::new("  ", StepKind::Action).validate(),
            Err(DefinitionError::EmptyName)
        );
    }
}
