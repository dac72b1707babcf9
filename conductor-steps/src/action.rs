//! Action steps: exactly one connector call per attempt.

use async_trait::async_trait;
use flow0::connector::Connector;
use flow0::context::{ContextSnapshot, Fragment};
use flow0::error::{ConnectorError, DefinitionError, StepFailure};
use flow0::step::{Step, StepDecl, StepKind};
use flow0::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A step that calls one connector.
///
/// The request is a map of the static parameters overlaid with the
/// declared inputs (inputs win). With one declared output the whole
/// response is stored under it; with several, the response must be a map
/// holding each of them.
pub struct ActionStep {
    decl: StepDecl,
    connector: Arc<dyn Connector>,
    params: BTreeMap<String, Value>,
}

impl ActionStep {
    /// Build an action step with no static parameters.
    pub fn new(decl: StepDecl, connector: Arc<dyn Connector>) -> Result<Self, DefinitionError> {
        decl.validate()?;
        if decl.kind() != StepKind::Action {
            return Err(DefinitionError::Invalid {
                step: decl.name().to_string(),
                reason: format!("expected an action step, got {:?}", decl.kind()),
            });
        }
        Ok(Self {
            decl,
            connector,
            params: BTreeMap::new(),
        })
    }

    /// Add a static request parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add every entry of a map of static parameters.
    #[must_use]
    pub fn params(mut self, params: BTreeMap<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    /// The connector this step calls.
    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    fn request(&self, input: &ContextSnapshot) -> Value {
        let mut request = self.params.clone();
        for (key, value) in input.iter() {
            request.insert(key.clone(), value.clone());
        }
        Value::Map(request)
    }

    fn split(&self, response: Value) -> Result<Fragment, ConnectorError> {
        let outputs = self.decl.output_keys();
        match outputs {
            [] => return Ok(Fragment::new()),
            [only] => return Ok(Fragment::new().with(only.clone(), response)),
            _ => {}
        }
        let Value::Map(mut fields) = response else {
            return Err(ConnectorError::MalformedResponse(format!(
                "expected a map holding {}, got {}",
                outputs.join(", "),
                response.kind()
            )));
        };
        let mut fragment = Fragment::new();
        for key in outputs {
            let value = fields.remove(key).ok_or_else(|| {
                ConnectorError::MalformedResponse(format!("response has no field {key}"))
            })?;
            fragment.insert(key.clone(), value);
        }
        Ok(fragment)
    }
}

#[async_trait]
impl Step for ActionStep {
    fn decl(&self) -> &StepDecl {
        &self.decl
    }

    async fn run(&self, input: ContextSnapshot) -> Result<Fragment, StepFailure> {
        let request = self.request(&input);
        tracing::debug!(
            step = %self.decl.name(),
            connector = %self.connector.name(),
            capability = %self.connector.capability(),
            "conductor.action.call"
        );
        let response = self.connector.call(request).await?;
        Ok(self.split(response)?)
    }
}
