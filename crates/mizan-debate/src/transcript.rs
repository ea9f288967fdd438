//! Append-only debate transcript
//!
//! The orchestrator owns the only [`Transcript`]; prompts are built from a
//! [`TranscriptSnapshot`], an owned copy taken at the moment the prompt is
//! needed, so a prompt is a pure function of (topic, position, snapshot).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the proposition a debater argues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    For,
    Against,
}

impl Position {
    /// Lowercase form used in prompts and record keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::For => "for",
            Position::Against => "against",
        }
    }

    /// Capitalized form used for transcript labels
    pub fn label(&self) -> &'static str {
        match self {
            Position::For => "For",
            Position::Against => "Against",
        }
    }

    pub fn opponent(&self) -> Position {
        match self {
            Position::For => Position::Against,
            Position::Against => Position::For,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of turn a transcript entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Opening,
    Response,
    Conclusion,
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TurnKind::Opening => "opening",
            TurnKind::Response => "response",
            TurnKind::Conclusion => "conclusion",
        })
    }
}

/// One generated turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub position: Position,
    pub kind: TurnKind,
    /// Round number for responses, `None` for openings and conclusions
    pub round: Option<u32>,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(position: Position, kind: TurnKind, round: Option<u32>, text: String) -> Self {
        Self {
            position,
            kind,
            round,
            text,
        }
    }

    /// Render this entry as seen by `viewer`.
    ///
    /// The viewer's own turns carry its position label; the opponent's turns
    /// are attributed to "Opponent".
    pub fn render_for(&self, viewer: Position) -> String {
        if self.position == viewer {
            let label = self.position.label();
            match self.kind {
                TurnKind::Opening => format!("{label} opening argument: {}", self.text),
                TurnKind::Response => format!("{label} response: {}", self.text),
                TurnKind::Conclusion => format!("{label} conclusion: {}", self.text),
            }
        } else {
            match self.kind {
                TurnKind::Opening => format!("Opponent's opening argument: {}", self.text),
                TurnKind::Response => format!("Opponent's argument: {}", self.text),
                TurnKind::Conclusion => format!("Opponent's conclusion: {}", self.text),
            }
        }
    }
}

/// Chronological, append-only log of every turn in a debate
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries; existing entries are never touched.
    pub(crate) fn extend(&mut self, entries: impl IntoIterator<Item = TranscriptEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy of the log as it stands now
    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            entries: self.entries.clone(),
        }
    }
}

/// Immutable view of the transcript used to build one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSnapshot {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptSnapshot {
    /// A snapshot with one not-yet-committed entry appended
    pub fn staged(&self, entry: TranscriptEntry) -> TranscriptSnapshot {
        let mut entries = self.entries.clone();
        entries.push(entry);
        TranscriptSnapshot { entries }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest turn by the given position, if any
    pub fn latest_by(&self, position: Position) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|e| e.position == position)
    }

    /// The part of the history `viewer` has taken part in.
    ///
    /// Keeps the viewer's own turns and, of the opponent's, only those the
    /// viewer answered (the last opponent turn before each of its responses)
    /// plus the opponent's latest turn, which is the one about to be answered.
    pub fn view_for(&self, viewer: Position) -> TranscriptSnapshot {
        let entries = &self.entries;
        let kept = entries
            .iter()
            .enumerate()
            .filter(|&(i, e)| {
                if e.position == viewer {
                    return true;
                }
                let rest = &entries[i + 1..];
                let next_opponent = rest.iter().position(|n| n.position != viewer).unwrap_or(rest.len());
                next_opponent == rest.len()
                    || rest[..next_opponent]
                        .iter()
                        .any(|n| n.kind == TurnKind::Response)
            })
            .map(|(_, e)| e.clone())
            .collect();
        TranscriptSnapshot { entries: kept }
    }

    /// Render the whole history from `viewer`'s perspective, blank-line separated
    pub fn render_for(&self, viewer: Position) -> String {
        self.entries
            .iter()
            .map(|e| e.render_for(viewer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
