//! Anthropic API client struct and builder.

use std::time::Duration;

use async_trait::async_trait;
use flow0::error::ReasoningError;
use flow0::reasoning::{Reasoner, ReasoningRequest, ReasoningResponse};

use crate::error::{map_http_status, map_reqwest_error};
use crate::types::{Message, MessagesRequest, MessagesResponse};

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default Anthropic API base URL.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default output budget per request.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Reasoner backed by the Anthropic Messages API.
///
/// Holds no per-run state; one instance can serve concurrent runs.
/// Never retries: a failed call surfaces as a [`ReasoningError`] and the
/// step's retry policy decides what happens next.
///
/// # Example
///
/// ```no_run
/// use conductor_reasoner_anthropic::AnthropicReasoner;
/// use std::time::Duration;
///
/// let reasoner = AnthropicReasoner::new("sk-ant-...")
///     .model("claude-opus-4-5")
///     .max_tokens(2048)
///     .timeout(Duration::from_secs(60));
/// ```
pub struct AnthropicReasoner {
    /// Anthropic API key (`ANTHROPIC_API_KEY`).
    pub(crate) api_key: String,
    /// Model identifier.
    pub(crate) model: String,
    /// API base URL (override for testing or proxies).
    pub(crate) base_url: String,
    pub(crate) max_tokens: u32,
    pub(crate) system: Option<String>,
    pub(crate) timeout: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl AnthropicReasoner {
    /// Create a new reasoner with the given API key and sensible defaults.
    ///
    /// Default model: `claude-sonnet-4-20250514`.
    /// Default base URL: `https://api.anthropic.com`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            system: None,
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the output token budget.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Send a system prompt with every request.
    #[must_use]
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Give up on a request after `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured model.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Build the messages endpoint URL.
    pub(crate) fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Reasoner for AnthropicReasoner {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        let url = self.messages_url();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: self.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        tracing::debug!(
            url = %url,
            model = %self.model,
            "conductor.reasoning.anthropic.request"
        );

        let mut http = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let response = http.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        let headers = response.headers().clone();
        let response_text = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(map_http_status(status, &headers, &response_text));
        }

        let parsed: MessagesResponse = serde_json::from_str(&response_text)
            .map_err(|e| ReasoningError::InvalidOutput(format!("invalid JSON response: {e}")))?;
        let text = parsed
            .text()
            .ok_or_else(|| ReasoningError::InvalidOutput("response has no text content".into()))?;
        Ok(ReasoningResponse::new(text))
    }
}
