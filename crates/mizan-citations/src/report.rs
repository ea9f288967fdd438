//! Verification report: one CSV row per LLM-extracted citation

use mizan_debate::Position;
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use crate::analysis::{Citation, CitationAnalysis, SectionAnalysis};
use crate::classify::{is_direct_quote, is_scriptural_source};
use crate::verify::{CitationVerifier, Verification};

pub const CSV_HEADERS: [&str; 9] = [
    "model",
    "topic",
    "source",
    "is_quran",
    "direct_quranic_citation",
    "quote",
    "is_valid",
    "translation",
    "argument_type",
];

/// One classified and (when eligible) verified citation
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRow {
    pub model: String,
    pub topic: String,
    pub source: String,
    pub is_quran: bool,
    /// Scriptural source and a direct quote; false whenever not verified
    pub direct_quranic_citation: bool,
    pub quote: String,
    pub verification: Verification,
    pub argument_type: Position,
}

impl VerificationRow {
    /// `true`, `false`, empty for skipped, `unavailable` for failed lookups
    pub fn is_valid_field(&self) -> &'static str {
        match &self.verification {
            Verification::Matched { .. } => "true",
            Verification::Unmatched { .. } => "false",
            Verification::Skipped => "",
            Verification::Unavailable { .. } => "unavailable",
        }
    }

    pub fn to_csv_line(&self) -> String {
        [
            csv_escape(&self.model),
            csv_escape(&self.topic),
            csv_escape(&self.source),
            bool_field(self.is_quran).to_string(),
            bool_field(self.direct_quranic_citation).to_string(),
            csv_escape(&self.quote),
            self.is_valid_field().to_string(),
            csv_escape(self.verification.translation().unwrap_or_default()),
            self.argument_type.label().to_string(),
        ]
        .join(",")
    }
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Quote a field containing a comma, quote or line break, doubling inner quotes
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Outcome counts for a verification batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub verified: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub unavailable: usize,
    /// Items dropped before classification
    pub malformed: usize,
}

impl BatchSummary {
    pub fn record(&mut self, verification: &Verification) {
        match verification {
            Verification::Matched { .. } => self.verified += 1,
            Verification::Unmatched { .. } => self.unmatched += 1,
            Verification::Skipped => self.skipped += 1,
            Verification::Unavailable { .. } => self.unavailable += 1,
        }
    }

    /// Rows written
    pub fn rows(&self) -> usize {
        self.verified + self.unmatched + self.skipped + self.unavailable
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} verified, {} unmatched, {} skipped, {} unavailable, {} malformed",
            self.verified, self.unmatched, self.skipped, self.unavailable, self.malformed
        )
    }
}

/// Rows plus counts for a whole analysis file
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub rows: Vec<VerificationRow>,
    pub summary: BatchSummary,
}

impl VerificationReport {
    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", CSV_HEADERS.join(","))?;
        for row in &self.rows {
            writeln!(out, "{}", row.to_csv_line())?;
        }
        out.flush()
    }

    pub fn save_csv(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(io::BufWriter::new(file))?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "Verification report saved");
        Ok(())
    }
}

/// Classify and verify every LLM citation of one combined section.
///
/// Malformed items are logged, counted and dropped. Only citations with a
/// verse source and a direct quote are looked up.
pub async fn process_section(
    verifier: &CitationVerifier,
    section: &SectionAnalysis,
    model: &str,
    topic: &str,
    argument_type: Position,
    summary: &mut BatchSummary,
) -> Vec<VerificationRow> {
    let mut rows = Vec::with_capacity(section.citations_llm.len());
    for raw in &section.citations_llm {
        let citation = match Citation::from_value(raw) {
            Ok(citation) => citation,
            Err(e) => {
                tracing::warn!(model, topic, error = %e, item = %preview(raw), "Dropping malformed citation");
                summary.malformed += 1;
                continue;
            }
        };

        let is_quran = is_scriptural_source(&citation.source);
        let eligible = is_quran && is_direct_quote(&citation.quote);
        let verification = if eligible {
            verifier.verify(&citation).await
        } else {
            Verification::Skipped
        };
        summary.record(&verification);

        rows.push(VerificationRow {
            model: model.to_string(),
            topic: topic.to_string(),
            source: citation.source,
            is_quran,
            direct_quranic_citation: eligible,
            quote: citation.quote,
            verification,
            argument_type,
        });
    }
    rows
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    match text.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}

/// Verify every analysis: per file, the for-side rows then the against-side rows
pub async fn verify_analyses(verifier: &CitationVerifier, analyses: &[CitationAnalysis]) -> VerificationReport {
    let mut report = VerificationReport::default();
    for analysis in analyses {
        for position in [Position::For, Position::Against] {
            let rows = process_section(
                verifier,
                analysis.combined(position),
                &analysis.model,
                &analysis.topic,
                position,
                &mut report.summary,
            )
            .await;
            report.rows.extend(rows);
        }
        tracing::info!(file = %analysis.filename, "Citations verified");
    }
    tracing::info!(summary = %report.summary, "Verification finished");
    report
}
