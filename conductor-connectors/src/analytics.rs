//! A fetch connector serving a fixed metrics payload.

use crate::request_map;
use async_trait::async_trait;
use flow0::connector::{Capability, Connector};
use flow0::error::ConnectorError;
use flow0::id::ConnectorName;
use flow0::value::Value;
use std::collections::BTreeMap;

/// Serves the same metrics on every call.
///
/// A request may carry `fields`, a list of top-level payload keys; the
/// response then holds only those keys. Asking for a key the payload does
/// not have is an invalid request.
pub struct StaticAnalytics {
    name: ConnectorName,
    payload: Value,
}

impl StaticAnalytics {
    /// Serve `payload` under `name`.
    pub fn new(name: impl Into<ConnectorName>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The full payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    fn select(&self, fields: &Value) -> Result<Value, ConnectorError> {
        let Some(wanted) = fields.as_list() else {
            return Err(ConnectorError::InvalidRequest(
                "fields must be a list of names".into(),
            ));
        };
        let Value::Map(payload) = &self.payload else {
            return Err(ConnectorError::InvalidRequest(format!(
                "cannot select fields from a {} payload",
                self.payload.kind()
            )));
        };
        let mut selected = BTreeMap::new();
        for field in wanted {
            let key = field.as_text().ok_or_else(|| {
                ConnectorError::InvalidRequest("fields must be a list of names".into())
            })?;
            let value = payload
                .get(key)
                .ok_or_else(|| ConnectorError::InvalidRequest(format!("unknown field {key}")))?;
            selected.insert(key.to_owned(), value.clone());
        }
        Ok(Value::Map(selected))
    }
}

#[async_trait]
impl Connector for StaticAnalytics {
    fn name(&self) -> &ConnectorName {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::Fetch
    }

    async fn call(&self, request: Value) -> Result<Value, ConnectorError> {
        let response = match request_map(&request)?.get("fields") {
            Some(fields) => self.select(fields)?,
            None => self.payload.clone(),
        };
        tracing::debug!(connector = %self.name, "conductor.analytics.fetch");
        Ok(response)
    }
}
