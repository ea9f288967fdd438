//! Mock LLM provider for testing and dry runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns predefined responses
///
/// Every prompt it receives is recorded, which lets tests assert exactly what
/// a caller sent and in which order.
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    /// Canned responses (cycles through them)
    responses: Vec<String>,
    /// Number of calls made so far
    calls: AtomicUsize,
    /// Simulated latency
    latency: Duration,
    /// Calls with index < this fail with a transient error
    fail_first: usize,
    /// Calls with index >= this fail with a permanent error
    fail_from: Option<usize>,
    /// Prompts received, in call order
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            responses,
            calls: AtomicUsize::new(0),
            latency: Duration::from_millis(5),
            fail_first: 0,
            fail_from: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock that answers based on what the prompt asks for
    ///
    /// Debate prompts get short position statements carrying a Quran
    /// citation, extraction prompts get well-formed JSON, so a whole
    /// debate → extract → verify pipeline can run offline.
    pub fn smart() -> Self {
        Self {
            name: "smart-mock".to_string(),
            ..Self::new(Vec::new())
        }
    }

    /// Set simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the first `n` calls with a connection error
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Succeed for the first `n` calls, then fail every call after
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_from = Some(n);
        self
    }

    /// Number of calls made so far (including failed ones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn generate_smart_response(&self, request: &LlmRequest) -> String {
        let prompt_lower = request.prompt.to_lowercase();
        let side = if prompt_lower.contains("you are against") {
            "against"
        } else {
            "for"
        };

        if prompt_lower.contains("identify all citations") {
            return r#"[{"source": "Quran 1:1", "quote": "In the name of Allah, the Entirely Merciful, the Especially Merciful."}]"#
                .to_string();
        }

        if prompt_lower.contains("named entities") {
            return r#"{"person": [], "organizations": [], "work_of_art": ["The Clear Quran"]}"#
                .to_string();
        }

        if prompt_lower.contains("concluding statement") {
            return format!(
                "In conclusion, I remain {side} the proposition. The key points stand \
                 as argued throughout this debate."
            );
        }

        if prompt_lower.contains("respond to those arguments") {
            return format!(
                "Responding {side} the proposition: my opponent's latest argument \
                 overlooks the evidence already cited."
            );
        }

        if prompt_lower.contains("opening argument") {
            return format!(
                "I argue {side} the proposition. As Quran 1:1 reads: \"In the name of \
                 Allah, the Entirely Merciful, the Especially Merciful.\""
            );
        }

        format!(
            "I understand you're asking about: \"{}\"",
            request.prompt.chars().take(50).collect::<String>()
        )
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn is_available(&self) -> bool {
        true // Mock is always available
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if idx < self.fail_first {
            return Err(LlmError::ConnectionFailed(format!("mock failure #{}", idx + 1)));
        }
        if self.fail_from.is_some_and(|n| idx >= n) {
            return Err(LlmError::RequestFailed {
                status: 400,
                body: "mock provider exhausted".to_string(),
            });
        }

        let content = if self.responses.is_empty() {
            self.generate_smart_response(&request)
        } else {
            self.responses[idx % self.responses.len()].clone()
        };

        Ok(LlmResponse {
            content,
            model: self.model().to_string(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider() {
        let mock = MockProvider::constant("Hello, world!");
        let response = mock.ask("test").await.unwrap();
        assert_eq!(response, "Hello, world!");
        assert_eq!(mock.prompts(), vec!["test".to_string()]);
    }

    #[tokio::test]
    async fn test_responses_cycle() {
        let mock = MockProvider::new(vec!["a".into(), "b".into()]);
        assert_eq!(mock.ask("1").await.unwrap(), "a");
        assert_eq!(mock.ask("2").await.unwrap(), "b");
        assert_eq!(mock.ask("3").await.unwrap(), "a");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_after() {
        let mock = MockProvider::constant("fine").failing_after(1);
        assert!(mock.ask("first").await.is_ok());
        let err = mock.ask("second").await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_smart_mock_positions() {
        let mock = MockProvider::smart();
        let response = mock
            .ask("You are against the proposition. Make a convincing opening argument")
            .await
            .unwrap();
        assert!(response.contains("against"));
        assert!(response.contains("Quran 1:1"));

        let extracted = mock
            .ask("Please identify all citations and quotations in the following text")
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&extracted).unwrap();
        assert!(parsed.is_array());
    }
}
