#![deny(missing_docs)]
//! Concrete [`Connector`](flow0::Connector) implementations.
//!
//! | Connector | Capability | External system |
//! |-----------|-----------|-----------------|
//! | [`StaticAnalytics`] | fetch | A fixed metrics payload |
//! | [`Outbox`] | send | An in-process mailbox, optionally logging to a [`SentLog`] |
//! | [`MemorySearch`] | query | Keyword search over documents held in memory |
//! | [`HttpConnector`] | any | A JSON-over-HTTP endpoint |
//!
//! Configuration is passed at construction. `call` receives only the
//! request, and no connector retries on its own.

mod analytics;
pub(crate) mod error;
mod http;
mod outbox;
mod search;

pub use analytics::StaticAnalytics;
pub use http::{HttpConnector, HttpConnectorConfig};
pub use outbox::{Outbox, SentLog, SentMessage};
pub use search::{Document, MemorySearch};

use flow0::error::ConnectorError;
use flow0::value::Value;

/// The request as a map, or `InvalidRequest`.
pub(crate) fn request_map(
    request: &Value,
) -> Result<&std::collections::BTreeMap<String, Value>, ConnectorError> {
    match request {
        Value::Map(map) => Ok(map),
        other => Err(ConnectorError::InvalidRequest(format!(
            "expected a map request, got {}",
            other.kind()
        ))),
    }
}
