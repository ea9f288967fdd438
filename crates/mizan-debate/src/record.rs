//! Persisted debate record
//!
//! JSON shape:
//! `{metadata: {model, topic, mode, num_rounds, date, time_taken},
//!   debate: {opening_arguments: {for, against}, round_1.., conclusions}}`

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transcript::Position;

pub const OPENING_KEY: &str = "opening_arguments";
pub const CONCLUSIONS_KEY: &str = "conclusions";

/// Record key for round `k` (1-based)
pub fn round_key(round: u32) -> String {
    format!("round_{round}")
}

/// The two sides' texts for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidePair {
    #[serde(rename = "for")]
    pub for_side: String,
    #[serde(rename = "against")]
    pub against_side: String,
}

impl SidePair {
    pub fn new(for_side: String, against_side: String) -> Self {
        Self {
            for_side,
            against_side,
        }
    }

    pub fn get(&self, position: Position) -> &str {
        match position {
            Position::For => &self.for_side,
            Position::Against => &self.against_side,
        }
    }
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMetadata {
    pub model: String,
    pub topic: String,
    /// Generation backend the debate ran on
    pub mode: String,
    pub num_rounds: u32,
    /// Local start time, ISO 8601
    pub date: String,
    /// Elapsed wall-clock seconds
    pub time_taken: f64,
}

/// Debate sections in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebateSections {
    pub opening_arguments: Option<SidePair>,
    pub rounds: Vec<SidePair>,
    pub conclusions: Option<SidePair>,
}

impl DebateSections {
    /// (key, pair) for every present section, in the order they happened
    pub fn iter(&self) -> impl Iterator<Item = (String, &SidePair)> {
        let opening = self
            .opening_arguments
            .iter()
            .map(|p| (OPENING_KEY.to_string(), p));
        let rounds = self
            .rounds
            .iter()
            .enumerate()
            .map(|(i, p)| (round_key(i as u32 + 1), p));
        let conclusions = self
            .conclusions
            .iter()
            .map(|p| (CONCLUSIONS_KEY.to_string(), p));
        opening.chain(rounds).chain(conclusions)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for DebateSections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, pair) in self.iter() {
            map.serialize_entry(&key, pair)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DebateSections {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = BTreeMap::<String, SidePair>::deserialize(deserializer)?;
        let opening_arguments = raw.remove(OPENING_KEY);
        let conclusions = raw.remove(CONCLUSIONS_KEY);

        let mut numbered = Vec::with_capacity(raw.len());
        for (key, pair) in raw {
            let round = key
                .strip_prefix("round_")
                .and_then(|n| n.parse::<u32>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| de::Error::custom(format!("unexpected debate section '{key}'")))?;
            numbered.push((round, pair));
        }
        numbered.sort_by_key(|(round, _)| *round);
        for (expected, (round, _)) in (1u32..).zip(&numbered) {
            if expected != *round {
                return Err(de::Error::custom(format!("debate is missing {}", round_key(expected))));
            }
        }

        Ok(Self {
            opening_arguments,
            rounds: numbered.into_iter().map(|(_, pair)| pair).collect(),
            conclusions,
        })
    }
}

/// A finished debate, frozen once the orchestrator reaches `Done`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub metadata: DebateMetadata,
    pub debate: DebateSections,
}

impl DebateRecord {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(tag: &str) -> SidePair {
        SidePair::new(format!("{tag}-for"), format!("{tag}-against"))
    }

    #[test]
    fn test_sections_serialize_in_chronological_order() {
        let sections = DebateSections {
            opening_arguments: Some(pair("open")),
            rounds: (1..=10).map(|i| pair(&format!("r{i}"))).collect(),
            conclusions: Some(pair("close")),
        };
        let json = serde_json::to_string(&sections).unwrap();

        let positions: Vec<usize> = ["opening_arguments", "\"round_1\"", "\"round_2\"", "round_10", "conclusions"]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn test_sections_parse_any_key_order() {
        let json = r#"{
            "conclusions": {"for": "c1", "against": "c2"},
            "round_2": {"for": "b1", "against": "b2"},
            "opening_arguments": {"for": "o1", "against": "o2"},
            "round_1": {"for": "a1", "against": "a2"}
        }"#;
        let sections: DebateSections = serde_json::from_str(json).unwrap();
        assert_eq!(sections.rounds.len(), 2);
        assert_eq!(sections.rounds[0].get(Position::For), "a1");
        assert_eq!(sections.rounds[1].get(Position::Against), "b2");
        assert_eq!(sections.conclusions.as_ref().unwrap().for_side, "c1");
    }

    #[test]
    fn test_gap_in_rounds_is_rejected() {
        let json = r#"{"round_2": {"for": "b1", "against": "b2"}}"#;
        assert!(serde_json::from_str::<DebateSections>(json).is_err());
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let json = r#"{"epilogue": {"for": "x", "against": "y"}}"#;
        assert!(serde_json::from_str::<DebateSections>(json).is_err());
    }
}
