//! Translation retrieval from a verse lookup service

use async_trait::async_trait;
use mizan_llm::{MizanConfig, RetryPolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::classify::VerseRange;
use crate::normalize::normalize;
use crate::registry::TranslationRegistry;

/// Verse lookup failures. Local to one citation.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Lookup transport failed: {0}")]
    Transport(String),
    #[error("Lookup returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Lookup response could not be decoded: {0}")]
    Decode(String),
    #[error("No translations returned for {chapter}:{verse}")]
    Empty { chapter: u32, verse: u32 },
}

impl RetrievalError {
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Transport(_) => true,
            RetrievalError::Status { status, .. } => *status == 429 || *status >= 500,
            RetrievalError::Decode(_) | RetrievalError::Empty { .. } => false,
        }
    }
}

/// One translation's text for one verse, as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerseFragment {
    pub resource_id: u32,
    pub text: String,
}

impl VerseFragment {
    pub fn new(resource_id: u32, text: &str) -> Self {
        Self {
            resource_id,
            text: text.to_string(),
        }
    }
}

/// External verse lookup capability
#[async_trait]
pub trait VerseLookup: Send + Sync + fmt::Debug {
    /// All requested translations of one verse. An unknown verse is an error,
    /// never an empty success.
    async fn lookup(
        &self,
        chapter: u32,
        verse: u32,
        translation_ids: &[u32],
    ) -> Result<Vec<VerseFragment>, RetrievalError>;
}

#[derive(Debug, Deserialize)]
struct VerseEnvelope {
    verse: VerseBody,
}

#[derive(Debug, Deserialize)]
struct VerseBody {
    #[serde(default)]
    translations: Vec<VerseFragment>,
}

/// quran.com v4 `verses/by_key` client
#[derive(Debug, Clone)]
pub struct QuranComClient {
    client: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl QuranComClient {
    pub fn new(base_url: &str, policy: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn from_config(config: &MizanConfig) -> Self {
        Self::new(&config.quran_api_url, config.lookup_retry.clone())
    }

    async fn lookup_once(
        &self,
        chapter: u32,
        verse: u32,
        ids: &str,
    ) -> Result<Vec<VerseFragment>, RetrievalError> {
        let url = format!("{}/api/v4/verses/by_key/{chapter}:{verse}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("language", "en"), ("translations", ids)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: VerseEnvelope = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        if envelope.verse.translations.is_empty() {
            return Err(RetrievalError::Empty { chapter, verse });
        }
        Ok(envelope.verse.translations)
    }
}

#[async_trait]
impl VerseLookup for QuranComClient {
    async fn lookup(
        &self,
        chapter: u32,
        verse: u32,
        translation_ids: &[u32],
    ) -> Result<Vec<VerseFragment>, RetrievalError> {
        let ids = translation_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        tracing::debug!(chapter, verse, translations = %ids, "Looking up verse");

        self.policy
            .run(
                "verse-lookup",
                RetrievalError::is_transient,
                |after: Duration| RetrievalError::Transport(format!("timed out after {}s", after.as_secs())),
                || self.lookup_once(chapter, verse, &ids),
            )
            .await
    }
}

/// In-memory verse table for offline runs and tests
#[derive(Debug, Default)]
pub struct StaticVerseLookup {
    verses: HashMap<(u32, u32), Vec<VerseFragment>>,
    lookups: AtomicUsize,
}

impl StaticVerseLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add translations of one verse as `(resource_id, text)` pairs
    pub fn with_verse(mut self, chapter: u32, verse: u32, texts: &[(u32, &str)]) -> Self {
        self.verses.insert(
            (chapter, verse),
            texts.iter().map(|(id, text)| VerseFragment::new(*id, text)).collect(),
        );
        self
    }

    /// Number of lookups served so far, including failed ones
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerseLookup for StaticVerseLookup {
    async fn lookup(
        &self,
        chapter: u32,
        verse: u32,
        translation_ids: &[u32],
    ) -> Result<Vec<VerseFragment>, RetrievalError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let fragments: Vec<VerseFragment> = self
            .verses
            .get(&(chapter, verse))
            .map(|all| {
                all.iter()
                    .filter(|f| translation_ids.contains(&f.resource_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if fragments.is_empty() {
            return Err(RetrievalError::Empty { chapter, verse });
        }
        Ok(fragments)
    }
}

/// One translation merged across a verse range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedTranslation {
    /// Normalized text, used for matching
    pub normalized: String,
    /// Service text as returned, used for the fallback
    pub raw: String,
}

impl MergedTranslation {
    fn append(&mut self, raw: &str) {
        join_onto(&mut self.raw, raw.trim());
        join_onto(&mut self.normalized, &normalize(raw));
    }
}

fn join_onto(acc: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if !acc.is_empty() {
        acc.push(' ');
    }
    acc.push_str(piece);
}

/// Translation id → merged text for a whole verse range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSet {
    merged: HashMap<u32, MergedTranslation>,
}

impl TranslationSet {
    /// Merge fragments given in ascending verse order, space-joined per translation
    pub fn merge(fragments: impl IntoIterator<Item = VerseFragment>) -> Self {
        let mut merged: HashMap<u32, MergedTranslation> = HashMap::new();
        for fragment in fragments {
            merged
                .entry(fragment.resource_id)
                .or_default()
                .append(&fragment.text);
        }
        Self { merged }
    }

    pub fn get(&self, id: u32) -> Option<&MergedTranslation> {
        self.merged.get(&id)
    }

    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Fetches every registered translation for a verse or a range
#[derive(Debug, Clone)]
pub struct TranslationFetcher {
    lookup: Arc<dyn VerseLookup>,
    registry: Arc<TranslationRegistry>,
}

impl TranslationFetcher {
    pub fn new(lookup: Arc<dyn VerseLookup>, registry: Arc<TranslationRegistry>) -> Self {
        Self { lookup, registry }
    }

    pub fn registry(&self) -> &TranslationRegistry {
        &self.registry
    }

    /// Registered translations of one verse; unregistered ids are dropped
    pub async fn fetch(&self, chapter: u32, verse: u32) -> Result<Vec<VerseFragment>, RetrievalError> {
        let ids: Vec<u32> = self.registry.iter().map(|t| t.id).collect();
        let fragments = self.lookup.lookup(chapter, verse, &ids).await?;

        Ok(fragments
            .into_iter()
            .filter(|f| {
                let known = self.registry.contains(f.resource_id);
                if !known {
                    tracing::debug!(resource_id = f.resource_id, chapter, verse, "Ignoring unregistered translation");
                }
                known
            })
            .collect())
    }

    /// All verses of `range`, merged per translation in ascending verse order
    pub async fn fetch_range(&self, range: VerseRange) -> Result<TranslationSet, RetrievalError> {
        let mut fragments = Vec::new();
        for verse in range.verses() {
            fragments.extend(self.fetch(range.chapter, verse).await?);
        }
        Ok(TranslationSet::merge(fragments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(lookup: StaticVerseLookup) -> TranslationFetcher {
        TranslationFetcher::new(Arc::new(lookup), TranslationRegistry::standard())
    }

    #[test]
    fn test_merge_joins_in_order() {
        let set = TranslationSet::merge([
            VerseFragment::new(20, "Alif, Lam, Meem."),
            VerseFragment::new(19, "Alif. Lam. Mim."),
            VerseFragment::new(20, "This is the Book<sup foot_note=1>1</sup>"),
        ]);
        let saheeh = set.get(20).unwrap();
        assert_eq!(saheeh.normalized, "Alif, Lam, Meem. This is the Book");
        assert_eq!(saheeh.raw, "Alif, Lam, Meem. This is the Book<sup foot_note=1>1</sup>");
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_drops_unregistered_ids() {
        let lookup = StaticVerseLookup::new().with_verse(1, 1, &[(20, "In the name"), (999, "ignored")]);
        let fragments = fetcher(lookup).fetch(1, 1).await.unwrap();
        assert_eq!(fragments, vec![VerseFragment::new(20, "In the name")]);
    }

    #[tokio::test]
    async fn test_fetch_range_spans_verses() {
        let lookup = StaticVerseLookup::new()
            .with_verse(112, 1, &[(20, "Say, He is Allah, [who is] One,")])
            .with_verse(112, 2, &[(20, "Allah, the Eternal Refuge.")]);
        let set = fetcher(lookup)
            .fetch_range(VerseRange { chapter: 112, start: 1, end: 2 })
            .await
            .unwrap();
        assert_eq!(
            set.get(20).unwrap().normalized,
            "Say, He is Allah, [who is] One, Allah, the Eternal Refuge."
        );
    }

    #[tokio::test]
    async fn test_unknown_verse_is_an_error() {
        let err = fetcher(StaticVerseLookup::new()).fetch(2, 255).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Empty { chapter: 2, verse: 255 }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(RetrievalError::Transport("reset".into()).is_transient());
        assert!(RetrievalError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!RetrievalError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!RetrievalError::Decode("eof".into()).is_transient());
    }
}
