//! # Mizan LLM
//!
//! Text generation backends for Mizan debaters and citation extraction.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI | API | `OPENAI_API_KEY` |
//! | Anthropic | API | `ANTHROPIC_API_KEY` |
//! | Ollama | Local | None |
//! | Mock | Testing | None |
//!
//! Callers depend only on [`LlmProvider`]; [`LlmConfig::provider`] picks the
//! concrete backend and wraps it in a [`ResilientProvider`] so every call has a
//! timeout and a bounded retry budget.
//!
//! ## Quick Start
//!
//! ```rust
//! use mizan_llm::{MockProvider, LlmProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let llm = MockProvider::constant("The proposition holds.");
//!     let response = llm.ask("Argue for the proposition").await.unwrap();
//!     assert_eq!(response, "The proposition holds.");
//! }
//! ```
//!
//! ## With Ollama
//!
//! ```rust,ignore
//! use mizan_llm::{LlmBackend, LlmConfig};
//!
//! let config = LlmConfig::from_env()?;
//! let llm = config.provider(LlmBackend::Ollama, "llama3")?;
//! let response = llm.ask("Summarize the debate").await?;
//! ```

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod resilient_provider;

pub use anthropic::AnthropicProvider;
pub use config::{ConfigError, LlmBackend, LlmConfig, MizanConfig};
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};
pub use resilient_provider::{ResilientProvider, RetryPolicy};
