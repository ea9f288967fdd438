//! Debate orchestration: Opening → Round(1..=N) → Concluding → Done

use chrono::Local;
use mizan_llm::{LlmError, LlmProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::agent::DebateAgent;
use crate::record::{DebateMetadata, DebateRecord, DebateSections, SidePair};
use crate::transcript::{Position, Transcript, TranscriptEntry, TurnKind};

/// Errors that abort a debate
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("{position} {kind} generation failed: {source}")]
    Generation {
        position: Position,
        kind: TurnKind,
        #[source]
        source: LlmError,
    },
    #[error("{position} {kind} generation returned no text")]
    EmptyGeneration { position: Position, kind: TurnKind },
    #[error("Debate already finished")]
    AlreadyFinished,
}

/// Debate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    pub topic: String,
    pub model: String,
    /// Backend name recorded in the metadata
    pub mode: String,
    /// Exchange rounds between openings and conclusions
    pub num_rounds: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl DebateConfig {
    pub fn new(topic: &str, model: &str, mode: &str) -> Self {
        Self {
            topic: topic.to_string(),
            model: model.to_string(),
            mode: mode.to_string(),
            num_rounds: 3,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }

    pub fn with_rounds(mut self, num_rounds: u32) -> Self {
        self.num_rounds = num_rounds;
        self
    }

    pub fn with_limits(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

/// Where the orchestrator is in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateState {
    Opening,
    /// Exchange round `k`, 1-based
    Round(u32),
    Concluding,
    Done,
}

impl fmt::Display for DebateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebateState::Opening => f.write_str("opening"),
            DebateState::Round(k) => write!(f, "round {k}"),
            DebateState::Concluding => f.write_str("concluding"),
            DebateState::Done => f.write_str("done"),
        }
    }
}

/// A two-sided debate driven step by step against one backend.
///
/// The orchestrator owns the transcript and both agents. Each step either
/// commits every turn it generated or none of them, so a failed step leaves
/// the debate exactly where it was.
pub struct Debate {
    run_id: Uuid,
    llm: Arc<dyn LlmProvider>,
    config: DebateConfig,
    for_agent: DebateAgent,
    against_agent: DebateAgent,
    transcript: Transcript,
    sections: DebateSections,
    state: DebateState,
    date: String,
    started: Instant,
    record: Option<DebateRecord>,
}

impl fmt::Debug for Debate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debate")
            .field("run_id", &self.run_id)
            .field("backend", &self.llm.name())
            .field("config", &self.config)
            .field("state", &self.state)
            .field("turns", &self.transcript.len())
            .finish()
    }
}

impl Debate {
    pub fn new(llm: Arc<dyn LlmProvider>, config: DebateConfig) -> Self {
        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            topic = %config.topic,
            backend = llm.name(),
            rounds = config.num_rounds,
            "Debate created"
        );
        Self {
            run_id,
            for_agent: DebateAgent::new(Position::For, &config.topic, &config.model),
            against_agent: DebateAgent::new(Position::Against, &config.topic, &config.model),
            llm,
            config,
            transcript: Transcript::new(),
            sections: DebateSections::default(),
            state: DebateState::Opening,
            date: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            started: Instant::now(),
            record: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn state(&self) -> DebateState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn agent(&self, position: Position) -> &DebateAgent {
        match position {
            Position::For => &self.for_agent,
            Position::Against => &self.against_agent,
        }
    }

    /// The frozen record, once the debate is done
    pub fn record(&self) -> Option<&DebateRecord> {
        self.record.as_ref()
    }

    /// Advance one state. Returns the state reached.
    pub async fn step(&mut self) -> Result<DebateState, DebateError> {
        let next = match self.state {
            DebateState::Opening => {
                self.opening().await?;
                if self.config.num_rounds == 0 {
                    DebateState::Concluding
                } else {
                    DebateState::Round(1)
                }
            }
            DebateState::Round(k) => {
                self.round(k).await?;
                if k < self.config.num_rounds {
                    DebateState::Round(k + 1)
                } else {
                    DebateState::Concluding
                }
            }
            DebateState::Concluding => {
                self.conclude().await?;
                self.finish();
                DebateState::Done
            }
            DebateState::Done => return Err(DebateError::AlreadyFinished),
        };
        tracing::info!(run_id = %self.run_id, from = %self.state, to = %next, "Debate advanced");
        self.state = next;
        Ok(next)
    }

    /// Drive the debate to completion and return its record
    pub async fn run(&mut self) -> Result<DebateRecord, DebateError> {
        if self.state == DebateState::Done {
            return Err(DebateError::AlreadyFinished);
        }
        while self.state != DebateState::Done {
            if let Err(e) = self.step().await {
                tracing::error!(run_id = %self.run_id, state = %self.state, error = %e, "Debate aborted");
                return Err(e);
            }
        }
        self.record.clone().ok_or(DebateError::AlreadyFinished)
    }

    async fn opening(&mut self) -> Result<(), DebateError> {
        let (temp, max) = (self.config.temperature, self.config.max_tokens);
        let llm = self.llm.as_ref();

        let for_text = self
            .for_agent
            .speak(llm, TurnKind::Opening, self.for_agent.opening_prompt(), temp, max)
            .await?;
        let against_text = self
            .against_agent
            .speak(llm, TurnKind::Opening, self.against_agent.opening_prompt(), temp, max)
            .await?;

        self.commit(TurnKind::Opening, None, for_text.clone(), against_text.clone());
        self.sections.opening_arguments = Some(SidePair::new(for_text, against_text));
        Ok(())
    }

    async fn round(&mut self, k: u32) -> Result<(), DebateError> {
        let (temp, max) = (self.config.temperature, self.config.max_tokens);
        let llm = self.llm.as_ref();
        let snapshot = self.transcript.snapshot();

        let for_prompt = self.for_agent.response_prompt(&snapshot);
        let for_text = self
            .for_agent
            .speak(llm, TurnKind::Response, for_prompt, temp, max)
            .await?;

        // Against answers the for-side's turn from this same round.
        let staged = snapshot.staged(TranscriptEntry::new(
            Position::For,
            TurnKind::Response,
            Some(k),
            for_text.clone(),
        ));
        let against_prompt = self.against_agent.response_prompt(&staged);
        let against_text = self
            .against_agent
            .speak(llm, TurnKind::Response, against_prompt, temp, max)
            .await?;

        self.commit(TurnKind::Response, Some(k), for_text.clone(), against_text.clone());
        self.sections.rounds.push(SidePair::new(for_text, against_text));
        Ok(())
    }

    async fn conclude(&mut self) -> Result<(), DebateError> {
        let (temp, max) = (self.config.temperature, self.config.max_tokens);
        let llm = self.llm.as_ref();
        let snapshot = self.transcript.snapshot();

        let for_text = self
            .for_agent
            .speak(llm, TurnKind::Conclusion, self.for_agent.conclusion_prompt(&snapshot), temp, max)
            .await?;
        let against_text = self
            .against_agent
            .speak(
                llm,
                TurnKind::Conclusion,
                self.against_agent.conclusion_prompt(&snapshot),
                temp,
                max,
            )
            .await?;

        self.commit(TurnKind::Conclusion, None, for_text.clone(), against_text.clone());
        self.sections.conclusions = Some(SidePair::new(for_text, against_text));
        Ok(())
    }

    fn commit(&mut self, kind: TurnKind, round: Option<u32>, for_text: String, against_text: String) {
        self.transcript.extend([
            TranscriptEntry::new(Position::For, kind, round, for_text.clone()),
            TranscriptEntry::new(Position::Against, kind, round, against_text.clone()),
        ]);
        self.for_agent.record_turn(for_text);
        self.against_agent.record_turn(against_text);
    }

    fn finish(&mut self) {
        let time_taken = self.started.elapsed().as_secs_f64();
        tracing::info!(
            run_id = %self.run_id,
            turns = self.transcript.len(),
            time_taken,
            "Debate finished"
        );
        self.record = Some(DebateRecord {
            metadata: DebateMetadata {
                model: self.config.model.clone(),
                topic: self.config.topic.clone(),
                mode: self.config.mode.clone(),
                num_rounds: self.config.num_rounds,
                date: self.date.clone(),
                time_taken,
            },
            debate: self.sections.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mizan_llm::MockProvider;

    fn debate(llm: MockProvider, rounds: u32) -> Debate {
        Debate::new(Arc::new(llm), DebateConfig::new("Tea beats coffee", "m", "mock").with_rounds(rounds))
    }

    #[tokio::test]
    async fn test_state_sequence() {
        let mut d = debate(MockProvider::smart(), 2);
        assert_eq!(d.state(), DebateState::Opening);
        assert_eq!(d.step().await.unwrap(), DebateState::Round(1));
        assert_eq!(d.step().await.unwrap(), DebateState::Round(2));
        assert_eq!(d.step().await.unwrap(), DebateState::Concluding);
        assert_eq!(d.step().await.unwrap(), DebateState::Done);
        assert!(d.record().is_some());
    }

    #[tokio::test]
    async fn test_zero_rounds_goes_straight_to_conclusions() {
        let mut d = debate(MockProvider::smart(), 0);
        assert_eq!(d.step().await.unwrap(), DebateState::Concluding);
        let record = d.run().await.unwrap();
        assert!(record.debate.rounds.is_empty());
        assert_eq!(d.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_step_commits_nothing() {
        // Opening succeeds (2 calls), round 1 for-side succeeds, against-side fails.
        let mut d = debate(MockProvider::constant("text").failing_after(3), 1);
        d.step().await.unwrap();

        let err = d.step().await.unwrap_err();
        assert!(matches!(
            err,
            DebateError::Generation { position: Position::Against, kind: TurnKind::Response, .. }
        ));
        assert_eq!(d.state(), DebateState::Round(1));
        assert_eq!(d.transcript().len(), 2);
        assert_eq!(d.agent(Position::For).turns().len(), 1);
        assert!(d.record().is_none());
    }

    #[tokio::test]
    async fn test_step_after_done() {
        let mut d = debate(MockProvider::smart(), 1);
        d.run().await.unwrap();
        assert!(matches!(d.step().await, Err(DebateError::AlreadyFinished)));
        assert!(matches!(d.run().await, Err(DebateError::AlreadyFinished)));
    }
}
