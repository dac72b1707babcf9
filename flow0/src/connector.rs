//! The Connector seam: one external integration behind one call.

use crate::error::ConnectorError;
use crate::id::ConnectorName;
use crate::value::Value;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a connector does to its external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Pull data (analytics, documents).
    Fetch,
    /// Push data (messages, email).
    Send,
    /// Ask a question (search, lookup).
    Query,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Fetch => "fetch",
            Capability::Send => "send",
            Capability::Query => "query",
        })
    }
}

/// A stateless wrapper around one external system.
///
/// Credentials, endpoints and sessions are injected when the connector
/// is constructed; [`Connector::call`] receives nothing but the request.
/// Connectors hold no per-run state, so one `Arc<dyn Connector>` can serve
/// any number of concurrent runs.
///
/// Connectors do not retry. Retry policy belongs to the step that calls
/// them and is applied by the executor.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The name workflows use to refer to this connector.
    fn name(&self) -> &ConnectorName;

    /// What this connector does.
    fn capability(&self) -> Capability;

    /// Perform one request/response exchange with the external system.
    async fn call(&self, request: Value) -> Result<Value, ConnectorError>;
}
