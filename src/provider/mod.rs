//! Generation provider module
//!
//! Abstracts the external generative-language service behind a small trait
//! so handlers and tests can plug in alternative backends.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

/// Error from a generation call
///
/// Every variant is opaque to the relay handler: callers only ever see the
/// generic failure response, the detail goes to the operator log.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure, timeout, or undecodable response body
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success HTTP status
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Provider answered 200 but the payload carried no generated text
    #[error("provider response contained no generated text")]
    EmptyResponse,
}

/// A text-generation backend
///
/// Implementations must be safe to share across concurrent requests
/// without per-call mutation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the given prompt, one provider call per invocation
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
