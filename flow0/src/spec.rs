//! Declarative workflow documents.
//!
//! A [`WorkflowSpec`] names connectors, reasoners and transforms by string;
//! something that owns the actual implementations (the `Catalog` in
//! `conductor-steps`) resolves it into a runnable
//! [`WorkflowDefinition`](crate::WorkflowDefinition).
//!
//! ```json
//! {
//!   "name": "weekly-report",
//!   "steps": [
//!     { "name": "fetch_analytics", "kind": "action", "connector": "analytics",
//!       "outputs": ["metrics"] },
//!     { "name": "summarize", "kind": "reasoning", "reasoner": "default",
//!       "inputs": ["metrics"], "outputs": ["summary"],
//!       "prompt": "Summarize these metrics: {metrics}",
//!       "retry": { "max_retries": 2 } }
//!   ]
//! }
//! ```

use crate::duration::DurationMs;
use crate::error::DefinitionError;
use crate::step::{RetryPolicy, StepKind};
use serde::{Deserialize, Serialize};

/// A workflow as written in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Workflow name.
    pub name: String,
    /// Steps in execution order.
    pub steps: Vec<StepDescriptor>,
}

impl WorkflowSpec {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::Parse(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, DefinitionError> {
        serde_json::to_string_pretty(self).map_err(|e| DefinitionError::Parse(e.to_string()))
    }
}

/// One step as written in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDescriptor {
    /// Step name.
    pub name: String,
    /// Step kind.
    pub kind: StepKind,
    /// Required input keys.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Produced output keys.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Connector reference (action steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    /// Reasoner reference (reasoning steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoner: Option<String>,
    /// Transform reference (transform steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    /// Prompt template (reasoning steps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Static request parameters (action steps). Plain JSON object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Parse the reasoning output as a JSON object holding every output.
    #[serde(default)]
    pub json_output: bool,
    /// Retry policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    /// Per-attempt timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<DurationMs>,
}

impl StepDescriptor {
    /// A descriptor with only name and kind set.
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            connector: None,
            reasoner: None,
            transform: None,
            prompt: None,
            params: None,
            json_output: false,
            retry: None,
            timeout_ms: None,
        }
    }
}
