//! Citation analysis records: per-section extraction results and the
//! per-file analysis written by `extract` and read by `verify`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use mizan_debate::Position;

/// A raw LLM citation item that cannot be verified
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCitation {
    #[error("citation is a JSON {0}, not an object")]
    NotAnObject(&'static str),
    /// Field absent or not a string
    #[error("citation has no string '{0}' field")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AnalysisError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        AnalysisError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A validated (source, quote) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub quote: String,
}

impl Citation {
    pub fn new(source: &str, quote: &str) -> Self {
        Self {
            source: source.to_string(),
            quote: quote.to_string(),
        }
    }

    /// Validate one raw `citations_llm` item
    pub fn from_value(value: &Value) -> Result<Self, MalformedCitation> {
        let object = value.as_object().ok_or(MalformedCitation::NotAnObject(json_kind(value)))?;
        let field = |name: &'static str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .ok_or(MalformedCitation::MissingField(name))
        };
        Ok(Self::new(field("source")?, field("quote")?))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extraction results for one side of one section, or one side's combination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionAnalysis {
    /// Category (`person`, `organizations`, `work_of_art`) → terms
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    /// Regex-extracted citation strings
    #[serde(default)]
    pub citations: Vec<String>,
    /// LLM-extracted items, unvalidated
    #[serde(default)]
    pub citations_llm: Vec<Value>,
}

impl SectionAnalysis {
    /// Fold `other` into `self`: entity and citation sets are unioned keeping
    /// first-seen order, LLM items are appended.
    pub fn absorb(&mut self, other: &SectionAnalysis) {
        for (category, terms) in &other.entities {
            let merged = self.entities.entry(category.clone()).or_default();
            for term in terms {
                if !merged.contains(term) {
                    merged.push(term.clone());
                }
            }
        }
        for citation in &other.citations {
            if !self.citations.contains(citation) {
                self.citations.push(citation.clone());
            }
        }
        self.citations_llm.extend(other.citations_llm.iter().cloned());
    }
}

/// For/against analyses of one debate section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionPair {
    #[serde(rename = "for", default)]
    pub for_side: SectionAnalysis,
    #[serde(rename = "against", default)]
    pub against_side: SectionAnalysis,
}

impl SectionPair {
    pub fn get(&self, position: Position) -> &SectionAnalysis {
        match position {
            Position::For => &self.for_side,
            Position::Against => &self.against_side,
        }
    }
}

/// Section key → analysis, kept in debate order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebateAnalysis {
    sections: Vec<(String, SectionPair)>,
}

impl DebateAnalysis {
    pub fn push(&mut self, key: String, pair: SectionPair) {
        self.sections.push((key, pair));
    }

    pub fn get(&self, key: &str) -> Option<&SectionPair> {
        self.sections.iter().find(|(k, _)| k == key).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionPair)> {
        self.sections.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Combine every section per side
    pub fn combine(&self) -> (SectionAnalysis, SectionAnalysis) {
        let mut combined_for = SectionAnalysis::default();
        let mut combined_against = SectionAnalysis::default();
        for (_, pair) in &self.sections {
            combined_for.absorb(&pair.for_side);
            combined_against.absorb(&pair.against_side);
        }
        (combined_for, combined_against)
    }
}

impl Serialize for DebateAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (key, pair) in &self.sections {
            map.serialize_entry(key, pair)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DebateAnalysis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedSections;

        impl<'de> Visitor<'de> for OrderedSections {
            type Value = DebateAnalysis;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of debate sections")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut analysis = DebateAnalysis::default();
                while let Some((key, pair)) = access.next_entry::<String, SectionPair>()? {
                    analysis.push(key, pair);
                }
                Ok(analysis)
            }
        }

        deserializer.deserialize_map(OrderedSections)
    }
}

/// Analysis of one debate record file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationAnalysis {
    pub filename: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub debate_analysis: DebateAnalysis,
    #[serde(default)]
    pub combined_for: SectionAnalysis,
    #[serde(default)]
    pub combined_against: SectionAnalysis,
}

impl CitationAnalysis {
    /// Build from per-section results, filling in both combined sides
    pub fn new(filename: &str, model: &str, topic: &str, debate_analysis: DebateAnalysis) -> Self {
        let (combined_for, combined_against) = debate_analysis.combine();
        Self {
            filename: filename.to_string(),
            model: model.to_string(),
            topic: topic.to_string(),
            debate_analysis,
            combined_for,
            combined_against,
        }
    }

    pub fn combined(&self, position: Position) -> &SectionAnalysis {
        match position {
            Position::For => &self.combined_for,
            Position::Against => &self.combined_against,
        }
    }
}

/// Read an analysis file (a JSON list of [`CitationAnalysis`])
pub fn load_analyses(path: &Path) -> Result<Vec<CitationAnalysis>, AnalysisError> {
    let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| AnalysisError::json(path, e))
}

/// Write analyses as pretty JSON
pub fn save_analyses(path: &Path, analyses: &[CitationAnalysis]) -> Result<(), AnalysisError> {
    let json = serde_json::to_string_pretty(analyses).map_err(|e| AnalysisError::json(path, e))?;
    std::fs::write(path, json).map_err(|e| AnalysisError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_citation_validation() {
        assert_eq!(
            Citation::from_value(&json!({"source": "Quran 1:1", "quote": "Praise"})),
            Ok(Citation::new("Quran 1:1", "Praise"))
        );
        assert_eq!(
            Citation::from_value(&json!("raw reply")),
            Err(MalformedCitation::NotAnObject("string"))
        );
        assert_eq!(
            Citation::from_value(&json!({"source": "Quran 1:1"})),
            Err(MalformedCitation::MissingField("quote"))
        );
        assert_eq!(
            Citation::from_value(&json!({"source": 7, "quote": "x"})),
            Err(MalformedCitation::MissingField("source"))
        );
    }

    #[test]
    fn test_absorb_dedups_sets_and_appends_items() {
        let mut acc = SectionAnalysis::default();
        let a = SectionAnalysis {
            entities: BTreeMap::from([("person".to_string(), vec!["Rumi".to_string()])]),
            citations: vec!["Quran 1:1".into()],
            citations_llm: vec![json!({"source": "Quran 1:1", "quote": "x"})],
        };
        acc.absorb(&a);
        acc.absorb(&a);

        assert_eq!(acc.entities["person"], vec!["Rumi".to_string()]);
        assert_eq!(acc.citations, vec!["Quran 1:1".to_string()]);
        assert_eq!(acc.citations_llm.len(), 2);
    }

    #[test]
    fn test_debate_analysis_keeps_file_order() {
        let json = r#"{"opening_arguments": {}, "round_2": {}, "round_1": {}, "conclusions": {}}"#;
        let analysis: DebateAnalysis = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = analysis.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["opening_arguments", "round_2", "round_1", "conclusions"]);

        let out = serde_json::to_string(&analysis).unwrap();
        assert!(out.find("round_2").unwrap() < out.find("round_1").unwrap());
    }

    #[test]
    fn test_combined_sides() {
        let mut debate = DebateAnalysis::default();
        let mut pair = SectionPair::default();
        pair.for_side.citations.push("(Smith, 2020)".into());
        pair.against_side.citations.push("Quran 2:255".into());
        debate.push("opening_arguments".into(), pair.clone());
        debate.push("conclusions".into(), pair);

        let analysis = CitationAnalysis::new("a.json", "m", "t", debate);
        assert_eq!(analysis.combined(Position::For).citations, vec!["(Smith, 2020)".to_string()]);
        assert_eq!(analysis.combined(Position::Against).citations, vec!["Quran 2:255".to_string()]);
    }
}
