#![deny(missing_docs)]
//! # conductor: umbrella crate
//!
//! One import surface for building step-chained workflows. Re-exports the
//! protocol crate and the implementation crates behind feature flags, plus
//! a `prelude` for the happy path.
//!
//! | Feature | Crate |
//! |---------|-------|
//! | `core` (default) | `flow0`, `conductor-exec` |
//! | `steps` (default) | `conductor-steps` |
//! | `connectors` (default) | `conductor-connectors` |
//! | `reasoner-anthropic` | `conductor-reasoner-anthropic` |
//! | `trace-fs` | `conductor-trace-fs` |

#[cfg(feature = "connectors")]
pub use conductor_connectors as connectors;
#[cfg(feature = "core")]
pub use conductor_exec as exec;
#[cfg(feature = "reasoner-anthropic")]
pub use conductor_reasoner_anthropic as reasoner_anthropic;
#[cfg(feature = "steps")]
pub use conductor_steps as steps;
#[cfg(feature = "trace-fs")]
pub use conductor_trace_fs as trace_fs;
#[cfg(feature = "core")]
pub use flow0;

/// Happy-path imports for composing workflows.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use flow0::{
        Backoff, Capability, Connector, ConnectorError, Context, ContextSnapshot, DurationMs,
        ExecHook, Fragment, HookAction, HookContext, HookPoint, Reasoner, ReasoningError,
        RetryPolicy, RunError, RunStatus, Step, StepDecl, StepFailure, StepKind, Trace,
        TraceEntry, TraceSink, Value, WorkflowDefinition, WorkflowSpec,
    };

    #[cfg(feature = "core")]
    pub use conductor_exec::{ChainExecutor, RunReport, TracingHook};

    #[cfg(feature = "steps")]
    pub use conductor_steps::{ActionStep, Catalog, ReasoningStep, TransformStep};

    #[cfg(feature = "connectors")]
    pub use conductor_connectors::{
        Document, HttpConnector, HttpConnectorConfig, MemorySearch, Outbox, SentLog,
        StaticAnalytics,
    };

    #[cfg(feature = "reasoner-anthropic")]
    pub use conductor_reasoner_anthropic::AnthropicReasoner;

    #[cfg(feature = "trace-fs")]
    pub use conductor_trace_fs::{JsonlSink, read_trace_json, write_trace_json};
}
