//! Resolving declarative workflow documents into runnable workflows.

use crate::action::ActionStep;
use crate::reasoning::ReasoningStep;
use crate::transform::{TransformFn, TransformStep};
use flow0::connector::Connector;
use flow0::context::{ContextSnapshot, Fragment};
use flow0::error::DefinitionError;
use flow0::reasoning::Reasoner;
use flow0::spec::{StepDescriptor, WorkflowSpec};
use flow0::step::{Step, StepDecl, StepKind};
use flow0::value::Value;
use flow0::workflow::WorkflowDefinition;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Reasoner used by reasoning steps that do not name one.
pub const DEFAULT_REASONER: &str = "default";

/// Errors resolving a [`WorkflowSpec`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// An action step names a connector the catalog does not hold.
    #[error("step {step}: unknown connector {name}")]
    UnknownConnector {
        /// Referencing step.
        step: String,
        /// Unresolved name.
        name: String,
    },
    /// A reasoning step names a reasoner the catalog does not hold.
    #[error("step {step}: unknown reasoner {name}")]
    UnknownReasoner {
        /// Referencing step.
        step: String,
        /// Unresolved name.
        name: String,
    },
    /// A transform step names a transform the catalog does not hold.
    #[error("step {step}: unknown transform {name}")]
    UnknownTransform {
        /// Referencing step.
        step: String,
        /// Unresolved name.
        name: String,
    },
    /// A step lacks a field its kind requires.
    #[error("step {step}: missing required field {field}")]
    MissingField {
        /// Offending step.
        step: String,
        /// The absent field.
        field: &'static str,
    },
    /// The resolved steps do not form a valid workflow.
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Named connectors, reasoners and transforms that workflow documents can
/// reference.
///
/// Connectors are registered under their own [`Connector::name`].
#[derive(Default, Clone)]
pub struct Catalog {
    connectors: BTreeMap<String, Arc<dyn Connector>>,
    reasoners: BTreeMap<String, Arc<dyn Reasoner>>,
    transforms: BTreeMap<String, TransformFn>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under its own name.
    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connectors
            .insert(connector.name().to_string(), connector);
        self
    }

    /// Register a reasoner.
    #[must_use]
    pub fn with_reasoner(mut self, name: impl Into<String>, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoners.insert(name.into(), reasoner);
        self
    }

    /// Register a pure transform.
    #[must_use]
    pub fn with_transform<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ContextSnapshot) -> Result<Fragment, String> + Send + Sync + 'static,
    {
        self.transforms.insert(name.into(), Arc::new(f));
        self
    }

    /// Registered connector names.
    pub fn connector_names(&self) -> impl Iterator<Item = &str> {
        self.connectors.keys().map(String::as_str)
    }

    /// Registered reasoner names.
    pub fn reasoner_names(&self) -> impl Iterator<Item = &str> {
        self.reasoners.keys().map(String::as_str)
    }

    /// Registered transform names.
    pub fn transform_names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }

    /// Resolve every step of `spec` and build the workflow.
    pub fn build(&self, spec: &WorkflowSpec) -> Result<WorkflowDefinition, CatalogError> {
        let mut builder = WorkflowDefinition::builder(spec.name.as_str());
        for desc in &spec.steps {
            builder = builder.shared_step(self.build_step(desc)?);
        }
        Ok(builder.build()?)
    }

    /// Resolve one step.
    pub fn build_step(&self, desc: &StepDescriptor) -> Result<Arc<dyn Step>, CatalogError> {
        reject_foreign_fields(desc)?;
        let decl = decl_of(desc);
        let missing = |field: &'static str| CatalogError::MissingField {
            step: desc.name.clone(),
            field,
        };

        let step: Arc<dyn Step> = match desc.kind {
            StepKind::Action => {
                let name = desc.connector.as_deref().ok_or_else(|| missing("connector"))?;
                let connector = self.connectors.get(name).cloned().ok_or_else(|| {
                    CatalogError::UnknownConnector {
                        step: desc.name.clone(),
                        name: name.to_owned(),
                    }
                })?;
                let params = params_of(desc)?;
                Arc::new(ActionStep::new(decl, connector)?.params(params))
            }
            StepKind::Reasoning => {
                let name = desc.reasoner.as_deref().unwrap_or(DEFAULT_REASONER);
                let reasoner = self.reasoners.get(name).cloned().ok_or_else(|| {
                    CatalogError::UnknownReasoner {
                        step: desc.name.clone(),
                        name: name.to_owned(),
                    }
                })?;
                let prompt = desc.prompt.as_deref().ok_or_else(|| missing("prompt"))?;
                if desc.json_output {
                    Arc::new(ReasoningStep::json(decl, reasoner, prompt)?)
                } else {
                    Arc::new(ReasoningStep::new(decl, reasoner, prompt)?)
                }
            }
            StepKind::Transform => {
                let name = desc.transform.as_deref().ok_or_else(|| missing("transform"))?;
                let f = self.transforms.get(name).cloned().ok_or_else(|| {
                    CatalogError::UnknownTransform {
                        step: desc.name.clone(),
                        name: name.to_owned(),
                    }
                })?;
                Arc::new(TransformStep::shared(decl, f)?)
            }
        };
        Ok(step)
    }
}

fn decl_of(desc: &StepDescriptor) -> StepDecl {
    let mut decl = StepDecl::new(desc.name.as_str(), desc.kind)
        .inputs(desc.inputs.iter().cloned())
        .outputs(desc.outputs.iter().cloned());
    if let Some(policy) = &desc.retry {
        decl = decl.retry(policy.clone());
    }
    if let Some(timeout) = desc.timeout_ms {
        decl = decl.timeout(timeout);
    }
    decl
}

fn params_of(desc: &StepDescriptor) -> Result<BTreeMap<String, Value>, DefinitionError> {
    match &desc.params {
        None => Ok(BTreeMap::new()),
        Some(serde_json::Value::Object(map)) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect()),
        Some(_) => Err(DefinitionError::Invalid {
            step: desc.name.clone(),
            reason: "params must be a JSON object".into(),
        }),
    }
}

/// Fields that only make sense for another kind are a wiring mistake.
fn reject_foreign_fields(desc: &StepDescriptor) -> Result<(), DefinitionError> {
    let foreign = match desc.kind {
        StepKind::Action => vec![
            ("reasoner", desc.reasoner.is_some()),
            ("prompt", desc.prompt.is_some()),
            ("json_output", desc.json_output),
            ("transform", desc.transform.is_some()),
        ],
        StepKind::Reasoning => vec![
            ("connector", desc.connector.is_some()),
            ("params", desc.params.is_some()),
            ("transform", desc.transform.is_some()),
        ],
        StepKind::Transform => vec![
            ("connector", desc.connector.is_some()),
            ("params", desc.params.is_some()),
            ("reasoner", desc.reasoner.is_some()),
            ("prompt", desc.prompt.is_some()),
            ("json_output", desc.json_output),
        ],
    };
    match foreign.iter().find(|(_, present)| *present) {
        Some((field, _)) => Err(DefinitionError::Invalid {
            step: desc.name.clone(),
            reason: format!("{field} does not apply to {:?} steps", desc.kind),
        }),
        None => Ok(()),
    }
}
