//! StubConnector: scripted responses, captured requests.

use crate::connector::{Capability, Connector};
use crate::error::ConnectorError;
use crate::id::ConnectorName;
use crate::value::Value;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A connector that answers from a script, then from a fallback forever.
pub struct StubConnector {
    name: ConnectorName,
    capability: Capability,
    script: Mutex<VecDeque<Result<Value, ConnectorError>>>,
    fallback: Result<Value, ConnectorError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Value>>,
}

impl StubConnector {
    /// Always answer with `response`.
    pub fn returning(name: &str, capability: Capability, response: Value) -> Self {
        Self::with_fallback(name, capability, Ok(response))
    }

    /// Always fail with `error`.
    pub fn failing(name: &str, capability: Capability, error: ConnectorError) -> Self {
        Self::with_fallback(name, capability, Err(error))
    }

    fn with_fallback(
        name: &str,
        capability: Capability,
        fallback: Result<Value, ConnectorError>,
    ) -> Self {
        Self {
            name: ConnectorName::new(name),
            capability,
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer these first, in order, before falling back.
    #[must_use]
    pub fn with_script(self, script: Vec<Result<Value, ConnectorError>>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    /// Sleep this long inside every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for StubConnector {
    fn name(&self) -> &ConnectorName {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn call(&self, request: Value) -> Result<Value, ConnectorError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}
