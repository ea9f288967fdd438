//! Integration tests that require a real LLM API
//!
//! The network tests are marked with #[ignore] and require environment variables:
//! - OPENAI_API_KEY for OpenAI tests
//! - ANTHROPIC_API_KEY for Anthropic tests
//!
//! Run with: cargo test -p mizan-llm --test llm_integration -- --ignored

use std::time::Duration;

use mizan_llm::{
    AnthropicProvider, LlmBackend, LlmConfig, LlmProvider, LlmRequest, MockProvider,
    OpenAIProvider, ResilientProvider, RetryPolicy,
};

/// Test OpenAI provider with real API
#[tokio::test]
#[ignore = "Requires OPENAI_API_KEY"]
async fn test_openai_real_request() {
    let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set for this test");

    let provider = OpenAIProvider::new(&api_key, "gpt-4o-mini");

    let request = LlmRequest {
        prompt: "What is 2 + 2? Answer with just the number.".to_string(),
        system: "You are a helpful assistant. Be extremely concise.".to_string(),
        temperature: 0.0,
        max_tokens: 10,
    };

    let response = provider.complete(request).await;
    assert!(response.is_ok(), "Request should succeed: {:?}", response);

    let response = response.unwrap();
    assert!(response.content.contains('4'), "Response should contain '4'");
    println!("OpenAI response: {}", response.content);
}

/// Test Anthropic provider with real API
#[tokio::test]
#[ignore = "Requires ANTHROPIC_API_KEY"]
async fn test_anthropic_real_request() {
    let api_key =
        std::env::var("ANTHROPIC_API_KEY").expect("ANTHROPIC_API_KEY must be set for this test");

    let provider = AnthropicProvider::new(&api_key, "claude-3-5-haiku-latest");
    let response = provider.ask("Say 'hello' in one word").await;
    assert!(response.is_ok(), "Request should succeed: {:?}", response);
    assert!(!response.unwrap().is_empty());
}

/// Test error handling with invalid API key
#[tokio::test]
#[ignore = "Makes real API call"]
async fn test_invalid_api_key() {
    let provider = OpenAIProvider::new("invalid-key-12345", "gpt-4o-mini");

    let err = provider.ask("Hello").await.unwrap_err();
    assert!(!err.is_transient(), "auth failures must not be retried: {err}");
}

/// An unreachable local backend surfaces a connection error rather than empty text
#[tokio::test]
async fn test_unreachable_backend_is_an_error() {
    let config = LlmConfig {
        ollama_url: "http://127.0.0.1:9".to_string(),
        retry: RetryPolicy::no_retry(Duration::from_secs(5)),
        ..LlmConfig::default()
    };
    let provider = config.provider(LlmBackend::Ollama, "llama3").unwrap();

    let err = provider.ask("Hello").await.unwrap_err();
    assert!(err.is_transient(), "expected a transport error, got {err}");
}

/// The resilient wrapper is transparent for a healthy backend
#[tokio::test]
async fn test_resilient_mock_round_trip() {
    let provider = ResilientProvider::wrap(MockProvider::constant("Agreed."));

    let response = provider
        .complete(LlmRequest::with_role("You are a debater.", "Open the debate.").with_limits(0.0, 32))
        .await
        .unwrap();
    assert_eq!(response.content, "Agreed.");
    assert_eq!(response.model, "mock-model");
    assert_eq!(provider.inner().prompts(), vec!["Open the debate.".to_string()]);
}
