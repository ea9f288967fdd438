//! LLM Provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Provider not available")]
    NotAvailable,
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::ConnectionFailed(_) | LlmError::RateLimited | LlmError::Timeout(_) => true,
            LlmError::RequestFailed { status, .. } => *status >= 500 || *status == 429,
            LlmError::InvalidResponse(_) | LlmError::NotAvailable => false,
        }
    }

    /// Map a transport-level reqwest failure.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else {
            LlmError::ConnectionFailed(err.to_string())
        }
    }

    /// Turn a non-success HTTP response into an error, reading its body.
    pub(crate) async fn from_status(response: reqwest::Response) -> Self {
        let status = response.status();
        if status.as_u16() == 429 {
            return LlmError::RateLimited;
        }
        let body = response.text().await.unwrap_or_default();
        LlmError::RequestFailed {
            status: status.as_u16(),
            body,
        }
    }
}

/// A request to an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System prompt (role/persona)
    pub system: String,
    /// User message
    pub prompt: String,
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl LlmRequest {
    /// Create a simple request with default settings
    pub fn simple(prompt: &str) -> Self {
        Self {
            system: "You are a helpful assistant.".to_string(),
            prompt: prompt.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    /// Create a request with a specific role
    pub fn with_role(system: &str, prompt: &str) -> Self {
        Self {
            system: system.to_string(),
            prompt: prompt.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    /// Override sampling temperature and output budget
    pub fn with_limits(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from an LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,
    /// Model used
    pub model: String,
    /// Tokens used (if available)
    pub tokens_used: Option<u32>,
    /// Time taken in milliseconds
    pub latency_ms: u64,
}

/// Trait for LLM providers
///
/// This is the single generation capability the debate and extraction stages
/// depend on; concrete backends are picked by configuration.
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Generate a completion
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Generate with a simple prompt (convenience method)
    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.complete(LlmRequest::simple(prompt)).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::ConnectionFailed("reset".into()).is_transient());
        assert!(LlmError::Timeout(30).is_transient());
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::RequestFailed { status: 503, body: String::new() }.is_transient());
        assert!(!LlmError::RequestFailed { status: 401, body: String::new() }.is_transient());
        assert!(!LlmError::InvalidResponse("bad json".into()).is_transient());
    }

    #[test]
    fn test_request_limits() {
        let request = LlmRequest::with_role("judge", "hello").with_limits(0.2, 64);
        assert_eq!(request.system, "judge");
        assert_eq!(request.max_tokens, 64);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }
}
