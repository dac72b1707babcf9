//! The reasoning seam: an opaque text generator.
//!
//! Prompt construction and model choice live outside this crate. A
//! [`Reasoner`] is handed a rendered prompt plus the inputs it was rendered
//! from and answers with text.

use crate::context::ContextSnapshot;
use crate::error::ReasoningError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One request to the reasoning capability.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    /// Rendered prompt.
    pub prompt: String,
    /// The inputs the prompt was rendered from.
    pub context: ContextSnapshot,
}

impl ReasoningRequest {
    /// Create a new request.
    pub fn new(prompt: impl Into<String>, context: ContextSnapshot) -> Self {
        Self {
            prompt: prompt.into(),
            context,
        }
    }
}

/// The generated answer.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningResponse {
    /// Generated text.
    pub text: String,
}

impl ReasoningResponse {
    /// Create a new response.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A language-reasoning capability.
///
/// Implementations:
/// - `AnthropicReasoner`: Anthropic Messages API over HTTP
/// - `StubReasoner` (test-utils): canned or templated answers
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Name used in logs and workflow files.
    fn name(&self) -> &str;

    /// Generate text for one request.
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningResponse, ReasoningError>;
}
