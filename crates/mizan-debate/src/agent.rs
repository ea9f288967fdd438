//! Position-bound debater

use mizan_llm::{LlmProvider, LlmRequest};

use crate::debate::DebateError;
use crate::transcript::{Position, TranscriptSnapshot, TurnKind};

const DEBATER_ROLE: &str = "You are a skilled debater who argues one side of a proposition.";

/// One side of a debate
///
/// Identity is (position, topic, model). The agent keeps its own turns in the
/// order they were committed; it never sees anything but the snapshot it is
/// handed when asked to speak.
#[derive(Debug, Clone)]
pub struct DebateAgent {
    pub position: Position,
    pub topic: String,
    pub model: String,
    turns: Vec<String>,
}

impl DebateAgent {
    pub fn new(position: Position, topic: &str, model: &str) -> Self {
        tracing::debug!(position = %position, "Debater initialized");
        Self {
            position,
            topic: topic.to_string(),
            model: model.to_string(),
            turns: Vec::new(),
        }
    }

    /// Committed turns, oldest first
    pub fn turns(&self) -> &[String] {
        &self.turns
    }

    pub fn latest_turn(&self) -> Option<&str> {
        self.turns.last().map(String::as_str)
    }

    pub(crate) fn record_turn(&mut self, text: String) {
        self.turns.push(text);
    }

    /// Opening prompt: built from topic and position only
    pub fn opening_prompt(&self) -> String {
        format!(
            "You are participating in a debate on the topic: '{topic}'. \
             You are {position} the proposition. Make a convincing opening \
             argument for your position. Please also provide relevant citations \
             supporting your position.",
            topic = self.topic,
            position = self.position,
        )
    }

    /// Response prompt: this agent's view of the history, then the instruction
    ///
    /// The view holds the agent's own turns and the opponent turns it has
    /// answered or is answering now (see [`TranscriptSnapshot::view_for`]).
    pub fn response_prompt(&self, history: &TranscriptSnapshot) -> String {
        format!(
            "You are participating in a debate on the topic: '{topic}'. \
             You are {position} the proposition. Here's the debate history so far:\n\n\
             {history}\n\n\
             Now, carefully consider the opponent's latest arguments and, maintaining \
             your position {position} the proposition, respond to those arguments. \
             Please provide relevant citations supporting your argument.",
            topic = self.topic,
            position = self.position,
            history = history.view_for(self.position).render_for(self.position),
        )
    }

    /// Conclusion prompt: the entire history, then a request to sum up
    pub fn conclusion_prompt(&self, history: &TranscriptSnapshot) -> String {
        format!(
            "You have been participating in a debate on the topic: '{topic}'. \
             You are {position} the proposition. Here's the entire debate history:\n\n\
             {history}\n\n\
             Now, provide a concluding statement for the debate, summarizing your \
             position and the key points you've made.",
            topic = self.topic,
            position = self.position,
            history = history.render_for(self.position),
        )
    }

    /// Send one prompt to the backend.
    ///
    /// Nothing is recorded here; the orchestrator commits the text once the
    /// whole step has succeeded.
    pub async fn speak(
        &self,
        llm: &dyn LlmProvider,
        kind: TurnKind,
        prompt: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, DebateError> {
        tracing::info!(position = %self.position, kind = %kind, "Generating turn");
        let request = LlmRequest::with_role(DEBATER_ROLE, &prompt).with_limits(temperature, max_tokens);

        let response = llm.complete(request).await.map_err(|source| DebateError::Generation {
            position: self.position,
            kind,
            source,
        })?;

        let text = response.content.trim().to_string();
        if text.is_empty() {
            return Err(DebateError::EmptyGeneration {
                position: self.position,
                kind,
            });
        }
        tracing::debug!(
            position = %self.position,
            kind = %kind,
            chars = text.len(),
            latency_ms = response.latency_ms,
            "Turn generated"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Transcript, TranscriptEntry};
    use mizan_llm::MockProvider;

    #[test]
    fn test_opening_prompt_depends_on_topic_and_position_only() {
        let agent = DebateAgent::new(Position::Against, "Tea beats coffee", "gpt-4o");
        let prompt = agent.opening_prompt();
        assert!(prompt.contains("'Tea beats coffee'"));
        assert!(prompt.contains("You are against the proposition."));
        assert!(prompt.contains("citations"));
    }

    #[test]
    fn test_response_prompt_embeds_history() {
        let agent = DebateAgent::new(Position::For, "X", "m");
        let mut transcript = Transcript::new();
        transcript.extend([TranscriptEntry::new(
            Position::Against,
            TurnKind::Opening,
            None,
            "coffee wins".into(),
        )]);

        let prompt = agent.response_prompt(&transcript.snapshot());
        assert!(prompt.contains("Here's the debate history so far:\n\nOpponent's opening argument: coffee wins"));
        assert!(prompt.contains("maintaining your position for the proposition"));
    }

    #[tokio::test]
    async fn test_blank_generation_is_rejected() {
        let agent = DebateAgent::new(Position::For, "X", "m");
        let llm = MockProvider::constant("   ");
        let err = agent
            .speak(&llm, TurnKind::Opening, agent.opening_prompt(), 0.7, 256)
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::EmptyGeneration { position: Position::For, .. }));
        assert!(agent.turns().is_empty());
    }
}
