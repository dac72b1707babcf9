//! # flow0: Protocol types for step-chained agentic workflows
//!
//! This crate defines the vocabulary every other conductor crate speaks:
//! the values threaded between steps, the seams where external systems
//! plug in, and the records a run leaves behind.
//!
//! ## The Seams
//!
//! | Seam | Trait | What it does |
//! |------|-------|-------------|
//! | Connector | [`Connector`] | One external integration (fetch, send, query) |
//! | Reasoning | [`Reasoner`] | Opaque text generation from a prompt + context |
//! | Step | [`Step`] | One named unit of work with declared inputs/outputs |
//! | Trace sink | [`TraceSink`] | Receives trace entries as they are recorded |
//! | Hook | [`ExecHook`] | Observes executor events, may halt at step boundaries |
//!
//! ## The Data
//!
//! | Type | What it is |
//! |------|-----------|
//! | [`Value`] | Tagged union for everything stored in a context |
//! | [`Context`] | Append-only key/value bag owned by one run |
//! | [`TraceEntry`] / [`Trace`] | One record per step attempt, in execution order |
//! | [`WorkflowDefinition`] | Immutable, ordered list of steps |
//! | [`WorkflowSpec`] | Declarative (serde) description of a workflow |
//!
//! ## Design Principle
//!
//! Steps declare the keys they read and write. The executor checks the
//! declaration before the step runs and checks the returned fragment
//! after it runs, so wiring mistakes surface at the boundary instead of
//! deep inside a connector call.

#![deny(missing_docs)]

pub mod connector;
pub mod context;
pub mod duration;
pub mod error;
pub mod hook;
pub mod id;
pub mod reasoning;
pub mod spec;
pub mod step;
pub mod trace;
pub mod value;
pub mod workflow;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use connector::{Capability, Connector};
pub use context::{Context, ContextSnapshot, Fragment};
pub use duration::DurationMs;
pub use error::{
    ConnectorError, ContextError, DefinitionError, HookError, ReasoningError, RunError,
    SinkError, StepError, StepFailure,
};
pub use hook::{ExecHook, HookAction, HookContext, HookPoint};
pub use id::{ConnectorName, RunId, StepName, WorkflowName};
pub use reasoning::{Reasoner, ReasoningRequest, ReasoningResponse};
pub use spec::{StepDescriptor, WorkflowSpec};
pub use step::{Backoff, RetryPolicy, Step, StepDecl, StepKind};
pub use trace::{FailureDescriptor, Outcome, Trace, TraceEntry, TraceSink};
pub use value::{Value, ValueKind};
pub use workflow::{RunStatus, WiringIssue, WiringReport, WorkflowBuilder, WorkflowDefinition};
