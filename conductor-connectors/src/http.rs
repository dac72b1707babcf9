//! A connector speaking JSON over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use flow0::connector::{Capability, Connector};
use flow0::error::ConnectorError;
use flow0::id::ConnectorName;
use flow0::value::Value;

use crate::error::{map_http_status, map_reqwest_error};

/// Configuration for an [`HttpConnector`].
///
/// ```
/// use conductor_connectors::HttpConnectorConfig;
/// use flow0::Capability;
/// use std::time::Duration;
///
/// let config = HttpConnectorConfig::new("crm", Capability::Query, "https://crm.internal/api/lookup")
///     .bearer_token("secret")
///     .timeout(Duration::from_secs(10))
///     .header("x-team", "growth");
/// assert_eq!(config.endpoint(), "https://crm.internal/api/lookup");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConnectorConfig {
    name: ConnectorName,
    capability: Capability,
    endpoint: String,
    bearer_token: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
}

impl HttpConnectorConfig {
    /// A connector posting to `endpoint`.
    pub fn new(
        name: impl Into<ConnectorName>,
        capability: Capability,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            capability,
            endpoint: endpoint.into(),
            bearer_token: None,
            timeout: None,
            headers: Vec::new(),
        }
    }

    /// Send `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Fail a request that takes longer than `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send an extra header with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// POSTs each request as a JSON body and returns the JSON response.
///
/// An empty success body becomes [`Value::Null`]. Status mapping: 401/403
/// are auth failures, 429 is a rate limit (with `Retry-After` seconds when
/// sent), other non-2xx statuses are transport failures. A body that is not
/// JSON is a malformed response.
pub struct HttpConnector {
    config: HttpConnectorConfig,
    client: reqwest::Client,
}

impl HttpConnector {
    /// Create a connector from its configuration.
    pub fn new(config: HttpConnectorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// The configuration this connector was built with.
    pub fn config(&self) -> &HttpConnectorConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for HttpConnector {
    fn name(&self) -> &ConnectorName {
        &self.config.name
    }

    fn capability(&self) -> Capability {
        self.config.capability
    }

    async fn call(&self, request: Value) -> Result<Value, ConnectorError> {
        let url = &self.config.endpoint;
        tracing::debug!(connector = %self.config.name, url = %url, "conductor.http.request");

        let mut http = self.client.post(url).json(&request.to_json());
        if let Some(token) = &self.config.bearer_token {
            http = http.bearer_auth(token);
        }
        if let Some(timeout) = self.config.timeout {
            http = http.timeout(timeout);
        }
        for (name, value) in &self.config.headers {
            http = http.header(name.as_str(), value.as_str());
        }

        let response = http.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            tracing::debug!(connector = %self.config.name, status = status.as_u16(), "conductor.http.error_status");
            return Err(map_http_status(status, &headers, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let json: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ConnectorError::MalformedResponse(format!("invalid JSON response: {e}")))?;
        Ok(Value::from(json))
    }
}
