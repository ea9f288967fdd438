//! Quote verification against fetched translations

use serde::Serialize;
use thiserror::Error;

use crate::analysis::Citation;
use crate::classify::{parse_verse_range, VerseRange};
use crate::fetch::{RetrievalError, TranslationFetcher};
use crate::normalize::normalize;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("Default translation missing for {range}")]
    MissingDefault { range: VerseRange },
}

/// Outcome of checking one citation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verification {
    /// Quote found verbatim (after normalization) in the named translation
    Matched { translation: String },
    /// No translation contains the quote; carries the default translation's text
    Unmatched { fallback_text: String },
    /// Source is not a verse reference, nothing looked up
    Skipped,
    /// Lookup failed; the citation could not be judged
    Unavailable { reason: String },
}

impl Verification {
    pub fn is_valid(&self) -> Option<bool> {
        match self {
            Verification::Matched { .. } => Some(true),
            Verification::Unmatched { .. } => Some(false),
            Verification::Skipped | Verification::Unavailable { .. } => None,
        }
    }

    /// Matched translation name, or the fallback text when unmatched
    pub fn translation(&self) -> Option<&str> {
        match self {
            Verification::Matched { translation } => Some(translation),
            Verification::Unmatched { fallback_text } => Some(fallback_text),
            Verification::Skipped | Verification::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Verification::Unavailable { .. })
    }
}

/// Checks quotes by exact substring containment after normalization
#[derive(Debug, Clone)]
pub struct CitationVerifier {
    fetcher: TranslationFetcher,
}

impl CitationVerifier {
    pub fn new(fetcher: TranslationFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &TranslationFetcher {
        &self.fetcher
    }

    pub async fn verify(&self, citation: &Citation) -> Verification {
        let Some(range) = parse_verse_range(&citation.source) else {
            return Verification::Skipped;
        };

        match self.verify_range(range, &citation.quote).await {
            Ok(outcome) => {
                tracing::debug!(source = %citation.source, valid = ?outcome.is_valid(), "Citation verified");
                outcome
            }
            Err(e) => {
                tracing::warn!(source = %citation.source, error = %e, "Verification unavailable");
                Verification::Unavailable { reason: e.to_string() }
            }
        }
    }

    /// Match `quote` against every translation of `range`, merged across verses
    pub async fn verify_range(&self, range: VerseRange, quote: &str) -> Result<Verification, VerifyError> {
        let set = self.fetcher.fetch_range(range).await?;
        let registry = self.fetcher.registry();

        let needle = normalize(quote);
        if !needle.is_empty() {
            for translation in registry.iter() {
                let matched = set
                    .get(translation.id)
                    .is_some_and(|merged| merged.normalized.contains(&needle));
                if matched {
                    return Ok(Verification::Matched {
                        translation: translation.name.to_string(),
                    });
                }
            }
        }

        let fallback = set
            .get(registry.default_id())
            .ok_or(VerifyError::MissingDefault { range })?;
        Ok(Verification::Unmatched {
            fallback_text: fallback.raw.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticVerseLookup;
    use crate::registry::TranslationRegistry;
    use std::sync::Arc;

    fn verifier(lookup: StaticVerseLookup) -> CitationVerifier {
        CitationVerifier::new(TranslationFetcher::new(Arc::new(lookup), TranslationRegistry::standard()))
    }

    fn fatiha() -> StaticVerseLookup {
        StaticVerseLookup::new().with_verse(
            1,
            1,
            &[
                (19, "In the name of Allah, the Beneficent, the Merciful."),
                (20, "In the name of Allāh, the Entirely Merciful, the Especially Merciful.<sup foot_note=1>1</sup>"),
            ],
        )
    }

    #[tokio::test]
    async fn test_match_names_translation() {
        let outcome = verifier(fatiha())
            .verify(&Citation::new("Quran 1:1", "the Entirely Merciful"))
            .await;
        assert_eq!(outcome, Verification::Matched { translation: "Saheeh International".into() });
        assert_eq!(outcome.is_valid(), Some(true));
    }

    #[tokio::test]
    async fn test_first_registry_match_wins() {
        let outcome = verifier(fatiha())
            .verify(&Citation::new("Quran 1:1", "In the name of Allah"))
            .await;
        assert_eq!(outcome.translation(), Some("M. Pickthall"));
    }

    #[tokio::test]
    async fn test_unmatched_returns_default_raw_text() {
        let outcome = verifier(fatiha())
            .verify(&Citation::new("Quran 1:1", "God is great"))
            .await;
        match outcome {
            Verification::Unmatched { fallback_text } => assert!(fallback_text.contains("Allāh")),
            other => panic!("expected unmatched, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_quote_never_matches() {
        let outcome = verifier(fatiha()).verify(&Citation::new("Quran 1:1", "  12 ")).await;
        assert_eq!(outcome.is_valid(), Some(false));
    }

    #[tokio::test]
    async fn test_non_verse_source_is_skipped_without_lookup() {
        let lookup = Arc::new(fatiha());
        let verifier = CitationVerifier::new(TranslationFetcher::new(lookup.clone(), TranslationRegistry::standard()));
        let outcome = verifier.verify(&Citation::new("Smith (2020)", "anything")).await;
        assert_eq!(outcome, Verification::Skipped);
        assert_eq!(lookup.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unavailable() {
        let outcome = verifier(fatiha()).verify(&Citation::new("Quran 2:255", "Allah")).await;
        assert!(outcome.is_unavailable());
        assert_eq!(outcome.is_valid(), None);
    }

    #[tokio::test]
    async fn test_nonexistent_verse_is_unavailable_not_skipped() {
        let lookup = Arc::new(fatiha());
        let verifier = CitationVerifier::new(TranslationFetcher::new(lookup.clone(), TranslationRegistry::standard()));
        let outcome = verifier.verify(&Citation::new("Quran 2:300", "Allah")).await;
        assert!(outcome.is_unavailable());
        assert_eq!(lookup.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_default_only_blocks_the_fallback() {
        let lookup = StaticVerseLookup::new().with_verse(1, 1, &[(19, "In the name of Allah")]);
        let verifier = verifier(lookup);

        let matched = verifier.verify(&Citation::new("Quran 1:1", "In the name")).await;
        assert_eq!(matched.is_valid(), Some(true));

        let unmatched = verifier.verify(&Citation::new("Quran 1:1", "God is great")).await;
        assert!(unmatched.is_unavailable());
    }
}
