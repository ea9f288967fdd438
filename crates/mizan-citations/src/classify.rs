//! Citation classification: scriptural source and direct-quote predicates

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static QURAN_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Quran (\d+):(\d+)(?:-(\d+))?").expect("static regex"));

/// Markers of commentary rather than verbatim quotation
const META_MARKERS: [&str; 6] = ["analysis", "emphasi", "interpret", "quran", "reference", "verse"];

/// A run of consecutive verses within one chapter, end inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRange {
    pub chapter: u32,
    pub start: u32,
    pub end: u32,
}

impl VerseRange {
    pub fn single(chapter: u32, verse: u32) -> Self {
        Self {
            chapter,
            start: verse,
            end: verse,
        }
    }

    /// Verse numbers in ascending order
    pub fn verses(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    pub fn verse_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "Quran {}:{}", self.chapter, self.start)
        } else {
            write!(f, "Quran {}:{}-{}", self.chapter, self.start, self.end)
        }
    }
}

/// Find a `Quran C:V` or `Quran C:S-E` reference anywhere in `source`.
///
/// Numbers must be positive and a range must not run backwards. Whether the
/// chapter and verses exist is left to the verse lookup, which reports an
/// unknown verse as a retrieval error.
pub fn parse_verse_range(source: &str) -> Option<VerseRange> {
    let caps = QURAN_SOURCE.captures(source)?;
    let chapter: u32 = caps.get(1)?.as_str().parse().ok()?;
    let start: u32 = caps.get(2)?.as_str().parse().ok()?;
    let end: u32 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => start,
    };

    let valid = chapter > 0 && start > 0 && end >= start;
    valid.then_some(VerseRange { chapter, start, end })
}

pub fn is_scriptural_source(source: &str) -> bool {
    parse_verse_range(source).is_some()
}

/// True unless the quote talks about a text instead of reproducing it
pub fn is_direct_quote(quote: &str) -> bool {
    let lower = quote.to_lowercase();
    !META_MARKERS.iter().any(|m| lower.contains(m))
}
