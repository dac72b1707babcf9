#![deny(missing_docs)]
//! The chain executor for conductor workflows.
//!
//! [`ChainExecutor`] runs a [`WorkflowDefinition`](flow0::WorkflowDefinition)
//! one step at a time, threading a [`Context`](flow0::Context) through the
//! steps and recording one trace entry per attempt. It owns no run state:
//! every call to [`ChainExecutor::execute`] starts a fresh run and returns
//! a [`RunReport`] holding the final (or partial) context and the trace.
//!
//! Failure policy is fail-fast. A step that fails with no retries left
//! ends the run; nothing after it is invoked.

mod executor;
mod hooks;
mod recorder;
mod tracing_hook;

pub use executor::{ChainExecutor, RunReport};
pub use hooks::HookRegistry;
pub use recorder::TraceRecorder;
pub use tracing_hook::TracingHook;
