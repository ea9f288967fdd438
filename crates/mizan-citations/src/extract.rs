//! Citation and entity extraction from debate records

use async_trait::async_trait;
use mizan_debate::{DebateSections, Position, SidePair};
use mizan_llm::{LlmProvider, LlmRequest};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{AnalysisError, CitationAnalysis, DebateAnalysis, SectionAnalysis, SectionPair};

/// Reply the extraction prompt asks for when a text cites nothing
pub const NO_CITATIONS_REPLY: &str = "No citations or quotations found.";

/// Entity categories kept in analysis records
pub const ENTITY_CATEGORIES: [&str; 3] = ["person", "organizations", "work_of_art"];

const CITATION_ROLE: &str =
    "You are a helpful assistant that identifies citations and quotations in text, including indirect references.";

const ENTITY_ROLE: &str = "You are a careful annotator that lists named entities found in text.";

static CITATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\([\w\s]+,\s*\d{4}\)",           // (Author, YYYY)
        r"[\w\s]+\s*\(\d{4}\)",            // Author (YYYY)
        r"[\w\s]+\s*et\s*al\.",            // Author et al.
        r#""[^"]+""#,                      // "Title of Work"
        r"Quran \d+:\d+",                  // Quran X:Y
        r"Surah [A-Z][a-z-]+ \(\d+:\d+\)", // Surah Name (X:Y)
        r"Hadith - [^,]+",                 // Hadith - Source
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Pattern-based citation strings, pattern by pattern, in match order
pub fn extract_regex_citations(text: &str) -> Vec<String> {
    let citations: Vec<String> = CITATION_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| {
            m.as_str()
                .trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string()
        })
        .collect();
    tracing::debug!(count = citations.len(), "Regex citations extracted");
    citations
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Interpret an extraction reply.
///
/// The no-citations sentinel gives an empty list, a JSON list gives its items
/// as-is, anything else is kept as a single string item.
pub fn parse_citation_reply(reply: &str) -> Vec<Value> {
    if reply.contains(NO_CITATIONS_REPLY) {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(strip_code_fence(reply)) {
        Ok(Value::Array(items)) => items,
        Ok(_) | Err(_) => {
            tracing::warn!(reply = %reply, "Citation reply is not a JSON list");
            vec![Value::String(reply.trim().to_string())]
        }
    }
}

/// LLM-backed `{source, quote}` extraction
#[derive(Debug, Clone)]
pub struct LlmCitationExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl LlmCitationExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn prompt(text: &str) -> String {
        format!(
            "Please identify all citations and quotations in the following text, \
             including indirect references. For each, provide the source and the quote \
             or paraphrased content. Quran citations should follow the format: \
             Quran Chapter:Verse. Return the result as a list of JSON objects, each with \
             'source' and 'quote' keys. If there are no citations or quotations, please \
             reply with the phrase: '{NO_CITATIONS_REPLY}'.\n\nText: {text}"
        )
    }

    pub async fn extract(&self, text: &str) -> Vec<Value> {
        let request = LlmRequest::with_role(CITATION_ROLE, &Self::prompt(text));
        match self.llm.complete(request).await {
            Ok(response) => {
                tracing::debug!(reply = %response.content, "Raw citation reply");
                parse_citation_reply(&response.content)
            }
            Err(e) => {
                tracing::warn!(backend = self.llm.name(), error = %e, "Citation extraction failed");
                Vec::new()
            }
        }
    }
}

/// Named entity extraction
#[async_trait]
pub trait EntityExtractor: Send + Sync + fmt::Debug {
    /// Category → distinct terms; only [`ENTITY_CATEGORIES`] keys
    async fn extract(&self, text: &str) -> BTreeMap<String, Vec<String>>;
}

/// Entity extraction by asking an LLM for a JSON object of categories
#[derive(Debug, Clone)]
pub struct LlmEntityExtractor {
    llm: Arc<dyn LlmProvider>,
}

impl LlmEntityExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub fn prompt(text: &str) -> String {
        format!(
            "List the named entities in the following text. Reply with a JSON object \
             with the keys \"person\" (people), \"organizations\" (organizations, \
             nationalities, religious and political groups) and \"work_of_art\" \
             (titles of books, scriptures and other works), each a list of strings. \
             Use empty lists when a category has no entities.\n\nText: {text}"
        )
    }
}

/// Keep known categories, drop blanks and duplicates
pub fn parse_entity_reply(reply: &str) -> BTreeMap<String, Vec<String>> {
    let parsed: BTreeMap<String, Value> = match serde_json::from_str(strip_code_fence(reply)) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "Entity reply is not a JSON object");
            return BTreeMap::new();
        }
    };

    let mut entities = BTreeMap::new();
    for category in ENTITY_CATEGORIES {
        let Some(Value::Array(items)) = parsed.get(category) else {
            continue;
        };
        let mut terms: Vec<String> = Vec::new();
        for term in items.iter().filter_map(Value::as_str).map(str::trim) {
            if !term.is_empty() && !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }
        if !terms.is_empty() {
            entities.insert(category.to_string(), terms);
        }
    }
    entities
}

#[async_trait]
impl EntityExtractor for LlmEntityExtractor {
    async fn extract(&self, text: &str) -> BTreeMap<String, Vec<String>> {
        let request = LlmRequest::with_role(ENTITY_ROLE, &Self::prompt(text));
        match self.llm.complete(request).await {
            Ok(response) => parse_entity_reply(&response.content),
            Err(e) => {
                tracing::warn!(backend = self.llm.name(), error = %e, "Entity extraction failed");
                BTreeMap::new()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RecordMetadata {
    #[serde(default)]
    model: String,
    #[serde(default)]
    topic: String,
}

/// Debate record as read for analysis; missing parts default to empty
#[derive(Debug, Default, Deserialize)]
struct RecordFile {
    #[serde(default)]
    metadata: RecordMetadata,
    #[serde(default)]
    debate: DebateSections,
}

/// Runs both extractors over debate records
#[derive(Debug, Clone)]
pub struct CitationAnalyzer {
    citations: LlmCitationExtractor,
    entities: Arc<dyn EntityExtractor>,
}

impl CitationAnalyzer {
    pub fn new(citations: LlmCitationExtractor, entities: Arc<dyn EntityExtractor>) -> Self {
        Self { citations, entities }
    }

    /// Both extractors backed by the same LLM
    pub fn with_llm(llm: Arc<dyn LlmProvider>) -> Self {
        Self::new(
            LlmCitationExtractor::new(llm.clone()),
            Arc::new(LlmEntityExtractor::new(llm)),
        )
    }

    pub async fn analyze_text(&self, text: &str) -> SectionAnalysis {
        SectionAnalysis {
            entities: self.entities.extract(text).await,
            citations: extract_regex_citations(text),
            citations_llm: self.citations.extract(text).await,
        }
    }

    pub async fn analyze_section(&self, key: &str, pair: &SidePair) -> SectionPair {
        tracing::info!(section = key, "Analyzing debate section");
        SectionPair {
            for_side: self.analyze_text(pair.get(Position::For)).await,
            against_side: self.analyze_text(pair.get(Position::Against)).await,
        }
    }

    /// Analyze every section of a debate, in debate order
    pub async fn analyze_debate(&self, debate: &DebateSections) -> DebateAnalysis {
        let mut analysis = DebateAnalysis::default();
        for (key, pair) in debate.iter() {
            let pair_analysis = self.analyze_section(&key, pair).await;
            analysis.push(key, pair_analysis);
        }
        analysis
    }

    pub async fn analyze_file(&self, path: &Path) -> Result<CitationAnalysis, AnalysisError> {
        tracing::info!(path = %path.display(), "Analyzing file");
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AnalysisError::io(path, e))?;
        let record: RecordFile = serde_json::from_str(&text).map_err(|e| AnalysisError::json(path, e))?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let debate_analysis = self.analyze_debate(&record.debate).await;
        Ok(CitationAnalysis::new(
            &filename,
            &record.metadata.model,
            &record.metadata.topic,
            debate_analysis,
        ))
    }

    /// Analyze every `*.json` file directly inside `dir`, sorted by name.
    ///
    /// A missing directory is an error; a file that fails to analyze is
    /// logged and skipped.
    pub async fn analyze_dir(&self, dir: &Path) -> Result<Vec<CitationAnalysis>, AnalysisError> {
        let files = list_json_files(dir).await?;
        tracing::info!(dir = %dir.display(), files = files.len(), "Analyzing directory");

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            match self.analyze_file(&path).await {
                Ok(analysis) => results.push(analysis),
                Err(e) => tracing::warn!(error = %e, "Skipping file"),
            }
        }
        tracing::info!(dir = %dir.display(), analyzed = results.len(), "Directory analyzed");
        Ok(results)
    }
}

async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AnalysisError::io(dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| AnalysisError::io(dir, e))? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
