//! Transform steps: pure in-process functions.

use async_trait::async_trait;
use flow0::context::{ContextSnapshot, Fragment};
use flow0::error::{DefinitionError, StepFailure};
use flow0::step::{Step, StepDecl, StepKind};
use std::sync::Arc;

/// The function behind a transform step.
///
/// Must be deterministic: the same snapshot always yields the same result.
/// An `Err` becomes a fatal [`StepFailure::Transform`].
pub type TransformFn = Arc<dyn Fn(&ContextSnapshot) -> Result<Fragment, String> + Send + Sync>;

/// A step that runs a pure function over its inputs.
pub struct TransformStep {
    decl: StepDecl,
    f: TransformFn,
}

impl TransformStep {
    /// Build a transform step from a closure.
    pub fn new<F>(decl: StepDecl, f: F) -> Result<Self, DefinitionError>
    where
        F: Fn(&ContextSnapshot) -> Result<Fragment, String> + Send + Sync + 'static,
    {
        Self::shared(decl, Arc::new(f))
    }

    /// Build a transform step from a shared function.
    pub fn shared(decl: StepDecl, f: TransformFn) -> Result<Self, DefinitionError> {
        decl.validate()?;
        if decl.kind() != StepKind::Transform {
            return Err(DefinitionError::Invalid {
                step: decl.name().to_string(),
                reason: format!("expected a transform step, got {:?}", decl.kind()),
            });
        }
        Ok(Self { decl, f })
    }
}

#[async_trait]
impl Step for TransformStep {
    fn decl(&self) -> &StepDecl {
        &self.decl
    }

    async fn run(&self, input: ContextSnapshot) -> Result<Fragment, StepFailure> {
        (self.f)(&input).map_err(StepFailure::Transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow0::value::Value;
    use std::collections::BTreeMap;

    fn double() -> TransformStep {
        TransformStep::new(
            StepDecl::new("double", StepKind::Transform)
                .input("n")
                .output("doubled"),
            |input| {
                let n = input
                    .get("n")
                    .map_err(|e| e.to_string())?
                    .as_i64()
                    .ok_or("n is not an integer")?;
                Ok(Fragment::new().with("doubled", n * 2))
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn runs_the_function() {
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Value::Int(21));
        let out = double().run(map.into()).await.unwrap();
        assert_eq!(out.get("doubled"), Some(&Value::Int(42)));
    }

    #[tokio::test]
    async fn errors_are_transform_failures() {
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Value::text("x"));
        let err = double().run(map.into()).await.unwrap_err();
        assert_eq!(err, StepFailure::Transform("n is not an integer".into()));
        assert!(!err.is_retryable());
    }
}
