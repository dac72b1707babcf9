#![deny(missing_docs)]
//! Step implementations for conductor workflows.
//!
//! Three kinds of step, one per [`StepKind`](flow0::StepKind):
//!
//! | Step | Calls | Output |
//! |------|-------|--------|
//! | [`ReasoningStep`] | one [`Reasoner`](flow0::Reasoner) | generated text, or fields of a JSON object |
//! | [`ActionStep`] | one [`Connector`](flow0::Connector) | the response, or fields of a map response |
//! | [`TransformStep`] | a pure function | whatever the function returns |
//!
//! [`Catalog`] turns a declarative [`WorkflowSpec`](flow0::WorkflowSpec)
//! into a runnable [`WorkflowDefinition`](flow0::WorkflowDefinition) by
//! resolving connector, reasoner and transform names.

mod action;
mod catalog;
mod reasoning;
mod template;
mod transform;

pub use action::ActionStep;
pub use catalog::{Catalog, CatalogError, DEFAULT_REASONER};
pub use reasoning::ReasoningStep;
pub use template::{PromptTemplate, TemplateError};
pub use transform::{TransformFn, TransformStep};
