//! Reasoning steps: one call to a [`Reasoner`] per attempt.

use crate::template::PromptTemplate;
use async_trait::async_trait;
use flow0::context::{ContextSnapshot, Fragment};
use flow0::error::{DefinitionError, ReasoningError, StepFailure};
use flow0::reasoning::{Reasoner, ReasoningRequest};
use flow0::step::{Step, StepDecl, StepKind};
use flow0::value::Value;
use std::sync::Arc;

/// A step that renders a prompt from its inputs and asks a reasoner.
///
/// In text mode the step declares exactly one output and stores the
/// generated text under it. In JSON mode the generated text must be a JSON
/// object holding every declared output; extra fields are ignored.
pub struct ReasoningStep {
    decl: StepDecl,
    reasoner: Arc<dyn Reasoner>,
    template: PromptTemplate,
    json_output: bool,
}

impl ReasoningStep {
    /// Build a text-mode reasoning step.
    ///
    /// Fails when the declaration is not a reasoning declaration, when the
    /// prompt does not parse, when it references a key that is not a
    /// declared input, or when more than one output is declared.
    pub fn new(
        decl: StepDecl,
        reasoner: Arc<dyn Reasoner>,
        prompt: &str,
    ) -> Result<Self, DefinitionError> {
        Self::build(decl, reasoner, prompt, false)
    }

    /// Build a JSON-mode reasoning step.
    pub fn json(
        decl: StepDecl,
        reasoner: Arc<dyn Reasoner>,
        prompt: &str,
    ) -> Result<Self, DefinitionError> {
        Self::build(decl, reasoner, prompt, true)
    }

    fn build(
        decl: StepDecl,
        reasoner: Arc<dyn Reasoner>,
        prompt: &str,
        json_output: bool,
    ) -> Result<Self, DefinitionError> {
        decl.validate()?;
        let invalid = |reason: String| DefinitionError::Invalid {
            step: decl.name().to_string(),
            reason,
        };
        if decl.kind() != StepKind::Reasoning {
            return Err(invalid(format!("expected a reasoning step, got {:?}", decl.kind())));
        }
        if !json_output && decl.output_keys().len() != 1 {
            return Err(invalid(
                "text-mode reasoning steps declare exactly one output".into(),
            ));
        }
        let template = PromptTemplate::parse(prompt).map_err(|e| invalid(e.to_string()))?;
        if let Some(key) = template
            .placeholders()
            .find(|k| !decl.input_keys().iter().any(|i| i.as_str() == *k))
        {
            return Err(invalid(format!(
                "prompt references {key}, which is not a declared input"
            )));
        }
        Ok(Self {
            decl,
            reasoner,
            template,
            json_output,
        })
    }

    /// The parsed prompt template.
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Whether the output is parsed as JSON.
    pub fn is_json(&self) -> bool {
        self.json_output
    }

    fn parse_json(&self, text: &str) -> Result<Fragment, ReasoningError> {
        let parsed: serde_json::Value = serde_json::from_str(strip_fences(text))
            .map_err(|e| ReasoningError::InvalidOutput(format!("not JSON: {e}")))?;
        let serde_json::Value::Object(mut object) = parsed else {
            return Err(ReasoningError::InvalidOutput("expected a JSON object".into()));
        };
        let mut fragment = Fragment::new();
        for key in self.decl.output_keys() {
            let value = object
                .remove(key)
                .ok_or_else(|| ReasoningError::InvalidOutput(format!("missing field {key}")))?;
            fragment.insert(key.clone(), Value::from(value));
        }
        Ok(fragment)
    }
}

/// Models like to wrap JSON in a Markdown code fence.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl Step for ReasoningStep {
    fn decl(&self) -> &StepDecl {
        &self.decl
    }

    async fn run(&self, input: ContextSnapshot) -> Result<Fragment, StepFailure> {
        let prompt = self.template.render(&input)?;
        tracing::debug!(
            step = %self.decl.name(),
            reasoner = self.reasoner.name(),
            prompt_len = prompt.len(),
            "conductor.reasoning.request"
        );
        let response = self
            .reasoner
            .reason(ReasoningRequest::new(prompt, input))
            .await?;

        if self.json_output {
            return Ok(self.parse_json(&response.text)?);
        }
        let mut fragment = Fragment::new();
        if let Some(key) = self.decl.output_keys().first() {
            fragment.insert(key.clone(), Value::Text(response.text));
        }
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow0::test_utils::StubReasoner;
    use std::collections::BTreeMap;

    fn decl() -> StepDecl {
        StepDecl::new("summarize", StepKind::Reasoning)
            .input("metrics")
            .output("summary")
    }

    fn input() -> ContextSnapshot {
        let mut map = BTreeMap::new();
        map.insert("metrics".to_string(), Value::map([("visits", Value::Int(3))]));
        map.into()
    }

    #[tokio::test]
    async fn text_mode_stores_generated_text() {
        let reasoner = Arc::new(StubReasoner::echo());
        let step = ReasoningStep::new(decl(), reasoner.clone(), "Summarize {metrics}").unwrap();

        let fragment = step.run(input()).await.unwrap();

        assert_eq!(
            fragment.get("summary"),
            Some(&Value::text(r#"reasoned: Summarize {"visits":3}"#))
        );
        assert_eq!(reasoner.prompts(), vec![r#"Summarize {"visits":3}"#.to_string()]);
    }

    #[tokio::test]
    async fn json_mode_extracts_declared_fields() {
        let reasoner = Arc::new(StubReasoner::fixed(
            "```json\n{\"summary\": \"up 14%\", \"insight\": [\"organic\"], \"extra\": 1}\n```",
        ));
        let decl = decl().output("insight");
        let step = ReasoningStep::json(decl, reasoner, "{metrics}").unwrap();

        let fragment = step.run(input()).await.unwrap();

        assert_eq!(fragment.len(), 2);
        assert_eq!(fragment.get("summary"), Some(&Value::text("up 14%")));
        assert_eq!(
            fragment.get("insight"),
            Some(&Value::List(vec![Value::text("organic")]))
        );
    }

    #[tokio::test]
    async fn json_mode_rejects_missing_fields() {
        let reasoner = Arc::new(StubReasoner::fixed(r#"{"other": 1}"#));
        let step = ReasoningStep::json(decl(), reasoner, "{metrics}").unwrap();
        let err = step.run(input()).await.unwrap_err();
        assert!(matches!(
            err,
            StepFailure::Reasoning(ReasoningError::InvalidOutput(_))
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn json_mode_rejects_non_objects() {
        let reasoner = Arc::new(StubReasoner::fixed("[1, 2]"));
        let step = ReasoningStep::json(decl(), reasoner, "{metrics}").unwrap();
        assert!(step.run(input()).await.is_err());
    }

    #[tokio::test]
    async fn reasoner_errors_pass_through() {
        let reasoner = Arc::new(StubReasoner::failing(ReasoningError::Quota {
            retry_after: None,
        }));
        let step = ReasoningStep::new(decl(), reasoner, "{metrics}").unwrap();
        assert_eq!(
            step.run(input()).await.unwrap_err(),
            StepFailure::Reasoning(ReasoningError::Quota { retry_after: None })
        );
    }

    #[test]
    fn construction_rejects_bad_wiring() {
        let reasoner: Arc<dyn Reasoner> = Arc::new(StubReasoner::echo());
        assert!(ReasoningStep::new(decl(), reasoner.clone(), "{nope}").is_err());
        assert!(ReasoningStep::new(decl(), reasoner.clone(), "{metrics").is_err());
        assert!(ReasoningStep::new(decl().output("b"), reasoner.clone(), "x").is_err());
        let action = StepDecl::new("a", StepKind::Action).output("x");
        assert!(ReasoningStep::new(action, reasoner, "x").is_err());
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_fences("  {}  "), "{}");
        assert_eq!(strip_fences("```\n{\"a\":1}```"), "{\"a\":1}");
    }
}
