//! Ollama LLM provider for local inference
//!
//! Ollama streams newline-delimited JSON chunks from `/api/generate`; the
//! provider concatenates the `response` fields until a chunk reports `done`.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// Ollama API request format
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    system: Option<String>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// One streamed chunk
#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Accumulates a streamed reply across arbitrarily split byte chunks.
#[derive(Debug, Default)]
struct StreamAssembler {
    pending: Vec<u8>,
    text: String,
    model: Option<String>,
    eval_count: Option<u32>,
    done: bool,
}

impl StreamAssembler {
    /// Feed raw bytes; returns true once the final chunk has been seen.
    fn feed(&mut self, bytes: &[u8]) -> Result<bool, LlmError> {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.consume_line(&line)?;
            if self.done {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Flush a trailing line that had no newline terminator. A stream that
    /// ended without a `done` chunk is truncated and rejected.
    fn finish(mut self) -> Result<(String, Option<String>, Option<u32>), LlmError> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.consume_line(&rest)?;
        }
        if !self.done {
            return Err(LlmError::InvalidResponse(format!(
                "stream ended before completion after {} chars",
                self.text.len()
            )));
        }
        Ok((self.text.trim().to_string(), self.model, self.eval_count))
    }

    fn consume_line(&mut self, line: &[u8]) -> Result<(), LlmError> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let chunk: OllamaChunk = serde_json::from_str(line)
            .map_err(|e| LlmError::InvalidResponse(format!("bad stream chunk: {e}")))?;
        if let Some(piece) = chunk.response {
            self.text.push_str(&piece);
        }
        if chunk.model.is_some() {
            self.model = chunk.model;
        }
        if chunk.done {
            self.eval_count = chunk.eval_count;
            self.done = true;
        }
        Ok(())
    }
}

/// Ollama provider for local LLM inference
#[derive(Debug)]
pub struct OllamaProvider {
    /// Base URL for Ollama API
    base_url: String,
    /// Model to use (e.g., "llama3", "mistral")
    model: String,
    /// HTTP client
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings
    pub fn new(model: &str) -> Self {
        Self::with_url("http://localhost:11434", model)
    }

    /// Create with custom base URL
    pub fn with_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let url = format!("{}/api/generate", self.base_url);

        let ollama_request = OllamaRequest {
            model: self.model.clone(),
            prompt: request.prompt,
            system: Some(request.system),
            stream: true,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        if !response.status().is_success() {
            return Err(LlmError::from_status(response).await);
        }

        let mut assembler = StreamAssembler::default();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(LlmError::from_transport)?;
            if assembler.feed(&bytes)? {
                break;
            }
        }
        let (content, model, eval_count) = assembler.finish()?;

        Ok(LlmResponse {
            content,
            model: model.unwrap_or_else(|| self.model.clone()),
            tokens_used: eval_count,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_assembly_across_split_chunks() {
        let mut assembler = StreamAssembler::default();
        let body = concat!(
            "{\"model\":\"llama3\",\"response\":\"  Hello\",\"done\":false}\n",
            "{\"model\":\"llama3\",\"response\":\", world\",\"done\":false}\n",
            "{\"model\":\"llama3\",\"response\":\"\",\"done\":true,\"eval_count\":7}\n",
            "{\"model\":\"llama3\",\"response\":\"ignored\",\"done\":false}\n",
        );
        let (first, second) = body.as_bytes().split_at(30);
        assert!(!assembler.feed(first).unwrap());
        assert!(assembler.feed(second).unwrap());

        let (text, model, eval_count) = assembler.finish().unwrap();
        assert_eq!(text, "Hello, world");
        assert_eq!(model.as_deref(), Some("llama3"));
        assert_eq!(eval_count, Some(7));
    }

    #[test]
    fn test_unterminated_final_line_is_flushed() {
        let mut assembler = StreamAssembler::default();
        assembler
            .feed(b"{\"response\":\"partial\",\"done\":false}\n{\"response\":\" end\",\"done\":true}")
            .unwrap();
        let (text, _, _) = assembler.finish().unwrap();
        assert_eq!(text, "partial end");
    }

    #[test]
    fn test_stream_without_done_is_rejected() {
        let mut assembler = StreamAssembler::default();
        assert!(!assembler
            .feed(b"{\"response\":\"half an arg\",\"done\":false}\n")
            .unwrap());
        let err = assembler.finish().unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));

        assert!(StreamAssembler::default().finish().is_err());
    }

    #[test]
    fn test_garbage_chunk_is_invalid_response() {
        let mut assembler = StreamAssembler::default();
        let err = assembler.feed(b"not json\n").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    #[ignore] // Requires Ollama running locally
    async fn test_ollama_available() {
        let provider = OllamaProvider::new("llama3");
        if provider.is_available().await {
            let response = provider.ask("Say hello in one word").await.unwrap();
            assert!(!response.is_empty());
        }
    }
}
