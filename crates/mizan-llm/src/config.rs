//! Configuration management for Mizan
//!
//! Handles API keys, backend selection, and timeout/retry settings. Everything
//! is read from the environment once at startup.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    AnthropicProvider, LlmProvider, MockProvider, OllamaProvider, OpenAIProvider,
    ResilientProvider, RetryPolicy,
};

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generation backend selected at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    OpenAi,
    Anthropic,
    Ollama,
    Mock,
}

impl LlmBackend {
    /// Every backend, in display order
    pub const ALL: [LlmBackend; 4] = [
        LlmBackend::OpenAi,
        LlmBackend::Anthropic,
        LlmBackend::Ollama,
        LlmBackend::Mock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::OpenAi => "openai",
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::Ollama => "ollama",
            LlmBackend::Mock => "mock",
        }
    }

    /// Environment variable holding this backend's credential, if it needs one
    pub fn credential_var(&self) -> Option<&'static str> {
        match self {
            LlmBackend::OpenAi => Some("OPENAI_API_KEY"),
            LlmBackend::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmBackend::Ollama | LlmBackend::Mock => None,
        }
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmBackend::OpenAi),
            "anthropic" => Ok(LlmBackend::Anthropic),
            "ollama" => Ok(LlmBackend::Ollama),
            "mock" => Ok(LlmBackend::Mock),
            other => Err(ConfigError::Invalid(format!("unsupported LLM backend: {other}"))),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI API key (env: OPENAI_API_KEY)
    pub openai_api_key: Option<String>,
    /// Anthropic API key (env: ANTHROPIC_API_KEY)
    pub anthropic_api_key: Option<String>,
    /// Ollama base URL (default: http://localhost:11434)
    pub ollama_url: String,
    /// Timeout and retry policy applied to every generation call
    #[serde(skip, default = "RetryPolicy::generation")]
    pub retry: RetryPolicy,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            retry: RetryPolicy::generation(),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let retry = RetryOverrides::from_env()?.apply(RetryPolicy::generation());

        Ok(Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            retry,
        })
    }

    /// Get API key for a backend
    pub fn api_key(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::OpenAi => self.openai_api_key.as_deref(),
            LlmBackend::Anthropic => self.anthropic_api_key.as_deref(),
            LlmBackend::Ollama | LlmBackend::Mock => None,
        }
    }

    /// Check if a backend is configured
    pub fn is_configured(&self, backend: LlmBackend) -> bool {
        backend.credential_var().is_none() || self.api_key(backend).is_some()
    }

    /// List available backends
    pub fn available_backends(&self) -> Vec<LlmBackend> {
        LlmBackend::ALL
            .into_iter()
            .filter(|b| self.is_configured(*b))
            .collect()
    }

    /// Build the selected backend, wrapped with this config's retry policy
    pub fn provider(
        &self,
        backend: LlmBackend,
        model: &str,
    ) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::Invalid("model name must not be empty".into()));
        }
        let retry = self.retry.clone();
        let provider: Arc<dyn LlmProvider> = match backend {
            LlmBackend::OpenAi => {
                let key = self.require_key(backend)?;
                Arc::new(ResilientProvider::new(OpenAIProvider::new(key, model), retry))
            }
            LlmBackend::Anthropic => {
                let key = self.require_key(backend)?;
                Arc::new(ResilientProvider::new(AnthropicProvider::new(key, model), retry))
            }
            LlmBackend::Ollama => Arc::new(ResilientProvider::new(
                OllamaProvider::with_url(&self.ollama_url, model),
                retry,
            )),
            LlmBackend::Mock => Arc::new(MockProvider::smart()),
        };
        tracing::debug!(backend = %backend, model, "Generation backend ready");
        Ok(provider)
    }

    fn require_key(&self, backend: LlmBackend) -> Result<&str, ConfigError> {
        self.api_key(backend).ok_or_else(|| {
            ConfigError::MissingEnvVar(backend.credential_var().unwrap_or_default().to_string())
        })
    }
}

/// Full Mizan configuration
#[derive(Debug, Clone)]
pub struct MizanConfig {
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Verse lookup service base URL (env: QURAN_API_URL)
    pub quran_api_url: String,
    /// Timeout and retry policy for verse lookups
    pub lookup_retry: RetryPolicy,
}

impl Default for MizanConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            quran_api_url: "https://api.quran.com".to_string(),
            lookup_retry: RetryPolicy::lookup(),
        }
    }
}

impl MizanConfig {
    /// Load from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm = LlmConfig::from_env()?;
        let lookup_retry = RetryOverrides::from_env()?.apply(RetryPolicy::lookup());

        Ok(Self {
            llm,
            quran_api_url: env::var("QURAN_API_URL")
                .unwrap_or_else(|_| "https://api.quran.com".to_string()),
            lookup_retry,
        })
    }
}

/// `MIZAN_REQUEST_TIMEOUT_SECS` and `MIZAN_MAX_RETRIES`, applied on top of a
/// default policy. Both generation and verse lookups honour them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RetryOverrides {
    attempt_timeout: Option<Duration>,
    max_attempts: Option<u32>,
}

impl RetryOverrides {
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(
            env::var("MIZAN_REQUEST_TIMEOUT_SECS").ok().as_deref(),
            env::var("MIZAN_MAX_RETRIES").ok().as_deref(),
        )
    }

    fn parse(timeout_secs: Option<&str>, retries: Option<&str>) -> Result<Self, ConfigError> {
        let attempt_timeout = match parse_number::<u64>("MIZAN_REQUEST_TIMEOUT_SECS", timeout_secs)? {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "MIZAN_REQUEST_TIMEOUT_SECS must be at least 1".into(),
                ))
            }
            other => other.map(Duration::from_secs),
        };
        let max_attempts = match parse_number::<u32>("MIZAN_MAX_RETRIES", retries)? {
            Some(retries) => Some(retries.checked_add(1).ok_or_else(|| {
                ConfigError::Invalid(format!("MIZAN_MAX_RETRIES={retries} is too large"))
            })?),
            None => None,
        };
        Ok(Self {
            attempt_timeout,
            max_attempts,
        })
    }

    fn apply(self, mut policy: RetryPolicy) -> RetryPolicy {
        if let Some(timeout) = self.attempt_timeout {
            policy.attempt_timeout = timeout;
        }
        if let Some(attempts) = self.max_attempts {
            policy.max_attempts = attempts;
        }
        policy
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: FromStr>(name: &str, raw: Option<&str>) -> Result<Option<T>, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name}='{raw}' is not a valid number"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert!(config.is_configured(LlmBackend::Mock));
        assert!(config.is_configured(LlmBackend::Ollama));
        assert!(!config.is_configured(LlmBackend::OpenAi));
    }

    #[test]
    fn test_available_backends() {
        let config = LlmConfig {
            anthropic_api_key: Some("sk-ant".into()),
            ..LlmConfig::default()
        };
        let backends = config.available_backends();
        assert!(backends.contains(&LlmBackend::Anthropic));
        assert!(backends.contains(&LlmBackend::Mock));
        assert!(!backends.contains(&LlmBackend::OpenAi));
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let config = LlmConfig::default();
        let err = config.provider(LlmBackend::OpenAi, "gpt-4o").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref var) if var == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_provider_selection() {
        let config = LlmConfig {
            openai_api_key: Some("sk-test".into()),
            ..LlmConfig::default()
        };
        let provider = config.provider(LlmBackend::OpenAi, "gpt-4o").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");

        let local = config.provider(LlmBackend::Ollama, "llama3").unwrap();
        assert_eq!(local.name(), "ollama");
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = LlmConfig::default().provider(LlmBackend::Mock, " ").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_retry_overrides() {
        let overrides = RetryOverrides::parse(Some("45"), Some("0")).unwrap();
        let generation = overrides.apply(RetryPolicy::generation());
        let lookup = overrides.apply(RetryPolicy::lookup());
        assert_eq!(generation.attempt_timeout, Duration::from_secs(45));
        assert_eq!(lookup.attempt_timeout, Duration::from_secs(45));
        assert_eq!(generation.max_attempts, 1);
        assert_eq!(lookup.max_attempts, 1);

        let untouched = RetryOverrides::parse(None, None).unwrap().apply(RetryPolicy::lookup());
        assert_eq!(untouched.attempt_timeout, RetryPolicy::lookup().attempt_timeout);
    }

    #[test]
    fn test_bad_retry_values_are_config_errors() {
        let max = u32::MAX.to_string();
        assert!(matches!(RetryOverrides::parse(None, Some(&max)), Err(ConfigError::Invalid(_))));
        assert!(matches!(RetryOverrides::parse(None, Some("-1")), Err(ConfigError::Invalid(_))));
        assert!(matches!(RetryOverrides::parse(Some("0"), None), Err(ConfigError::Invalid(_))));
        assert!(matches!(RetryOverrides::parse(Some("soon"), None), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("OpenAI".parse::<LlmBackend>().unwrap(), LlmBackend::OpenAi);
        assert_eq!(LlmBackend::Ollama.to_string(), "ollama");
        assert!("gemini".parse::<LlmBackend>().is_err());
    }
}
