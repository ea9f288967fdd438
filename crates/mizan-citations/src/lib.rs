//! # Mizan Citations
//!
//! Extract citations from debate records and check Quran quotes against
//! published English translations.
//!
//! ## Pipeline
//!
//! 1. [`CitationAnalyzer`] reads debate records and, per section and side,
//!    collects regex citations, LLM `{source, quote}` items and named entities.
//! 2. [`verify_analyses`] validates each LLM item, classifies it with
//!    [`is_scriptural_source`] and [`is_direct_quote`], and verifies eligible
//!    quotes with a [`CitationVerifier`].
//! 3. [`VerificationReport::save_csv`] writes one row per citation.
//!
//! Verification normalizes the quote and every translation of the cited verse
//! range, merged across verses, and reports the first translation (in
//! registry order) that contains the quote.
//!
//! ```rust
//! use std::sync::Arc;
//! use mizan_citations::{
//!     Citation, CitationVerifier, StaticVerseLookup, TranslationFetcher, TranslationRegistry,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let lookup = StaticVerseLookup::new()
//!         .with_verse(112, 1, &[(20, "Say, \"He is Allah, [who is] One,")])
//!         .with_verse(112, 2, &[(20, "Allah, the Eternal Refuge.")]);
//!     let fetcher = TranslationFetcher::new(Arc::new(lookup), TranslationRegistry::standard());
//!     let verifier = CitationVerifier::new(fetcher);
//!
//!     let outcome = verifier
//!         .verify(&Citation::new("Quran 112:1-2", "One, Allah, the Eternal"))
//!         .await;
//!     assert_eq!(outcome.is_valid(), Some(true));
//! }
//! ```

pub mod analysis;
pub mod classify;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod registry;
pub mod report;
pub mod verify;

pub use analysis::{
    load_analyses, save_analyses, AnalysisError, Citation, CitationAnalysis, DebateAnalysis,
    MalformedCitation, SectionAnalysis, SectionPair,
};
pub use classify::{is_direct_quote, is_scriptural_source, parse_verse_range, VerseRange};
pub use extract::{
    extract_regex_citations, parse_citation_reply, parse_entity_reply, CitationAnalyzer,
    EntityExtractor, LlmCitationExtractor, LlmEntityExtractor, NO_CITATIONS_REPLY,
};
pub use fetch::{
    MergedTranslation, QuranComClient, RetrievalError, StaticVerseLookup, TranslationFetcher,
    TranslationSet, VerseFragment, VerseLookup,
};
pub use normalize::normalize;
pub use registry::{Translation, TranslationRegistry, DEFAULT_TRANSLATION_ID};
pub use report::{
    csv_escape, process_section, verify_analyses, BatchSummary, VerificationReport,
    VerificationRow, CSV_HEADERS,
};
pub use verify::{CitationVerifier, Verification, VerifyError};
