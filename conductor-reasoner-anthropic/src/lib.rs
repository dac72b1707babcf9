//! # conductor-reasoner-anthropic
//!
//! A [`Reasoner`](flow0::Reasoner) backed by the Anthropic Messages API.
//!
//! Each reasoning request becomes one non-streaming `POST /v1/messages`
//! call with a single user message. The text blocks of the reply are
//! concatenated into the response.
//!
//! ```no_run
//! use conductor_reasoner_anthropic::AnthropicReasoner;
//!
//! let reasoner = AnthropicReasoner::new("sk-ant-...")
//!     .model("claude-sonnet-4-20250514")
//!     .system("You are a concise marketing analyst.");
//! ```
//!
//! HTTP failures map onto [`ReasoningError`](flow0::ReasoningError):
//!
//! | Upstream | Error |
//! |----------|-------|
//! | 401, 403 | `Auth` |
//! | 429, 529 | `Quota` (with `Retry-After` when sent) |
//! | request timeout | `Timeout` |
//! | unparseable body, no text | `InvalidOutput` |
//! | anything else | `Transport` |

#![deny(missing_docs)]

pub mod client;
pub(crate) mod error;
pub(crate) mod types;

pub use client::{AnthropicReasoner, DEFAULT_MODEL};
