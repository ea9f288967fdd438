//! # Mizan Debate
//!
//! Two LLM-backed agents argue for and against a proposition over a fixed
//! number of rounds.
//!
//! ## Protocol
//!
//! ```text
//! Opening → Round(1) → … → Round(N) → Concluding → Done
//! ```
//!
//! - Openings are generated from the topic and position alone.
//! - In each round the for-side answers the full history, then the
//!   against-side answers the history plus the for-side's new turn.
//! - Both conclusions are generated from the same snapshot.
//!
//! The orchestrator owns a single append-only [`Transcript`]; every prompt is
//! built from a [`TranscriptSnapshot`]. A step commits both sides' turns or
//! neither.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use mizan_debate::{Debate, DebateConfig};
//! use mizan_llm::MockProvider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = DebateConfig::new("Cats are better than dogs", "mock-model", "mock").with_rounds(1);
//!     let mut debate = Debate::new(Arc::new(MockProvider::smart()), config);
//!     let record = debate.run().await.unwrap();
//!     assert_eq!(record.debate.len(), 3);
//! }
//! ```

pub mod agent;
pub mod debate;
pub mod record;
pub mod report;
pub mod transcript;

pub use agent::DebateAgent;
pub use debate::{Debate, DebateConfig, DebateError, DebateState};
pub use record::{DebateMetadata, DebateRecord, DebateSections, SidePair};
pub use report::{generate_filename, render_html, save_html, save_json};
pub use transcript::{Position, Transcript, TranscriptEntry, TranscriptSnapshot, TurnKind};
