use super::normalizer::{GeneNormalizer, SynonymNormalizer};
use super::vocabulary::{GeneVocabulary, OrganelleType};
use crate::bio::source::SourceRecord;
use dashmap::DashMap;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

static COORDINATE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn is_coordinate_token(token: &str) -> bool {
    COORDINATE_TOKEN
        .get_or_init(|| Regex::new(r"^\d+:\d+").expect("valid coordinate pattern"))
        .is_match(token)
}

/// Resolves raw gene/product labels to canonical marker symbols.
///
/// One resolver lives for one pipeline run. Its memo table maps the raw text
/// handed to the normalizer onto the normalizer's answer, so a label that has
/// been seen once never reaches the normalizer again. Concurrent inserts for
/// the same key carry the same value, so last-writer-wins is fine.
pub struct GeneNameResolver {
    vocabulary: GeneVocabulary,
    normalizer: Arc<dyn GeneNormalizer>,
    cache: DashMap<String, Option<String>>,
    normalizer_calls: AtomicUsize,
}

impl GeneNameResolver {
    pub fn new(organelle: OrganelleType, normalizer: Arc<dyn GeneNormalizer>) -> Self {
        Self {
            vocabulary: GeneVocabulary::for_organelle(organelle),
            normalizer,
            cache: DashMap::new(),
            normalizer_calls: AtomicUsize::new(0),
        }
    }

    /// Resolver backed by the built-in synonym normalizer
    pub fn with_default_normalizer(organelle: OrganelleType) -> Self {
        Self::new(organelle, Arc::new(SynonymNormalizer::new()))
    }

    pub fn organelle(&self) -> OrganelleType {
        self.vocabulary.organelle()
    }

    pub fn vocabulary(&self) -> &GeneVocabulary {
        &self.vocabulary
    }

    /// Number of times the external normalizer has been consulted
    pub fn normalizer_calls(&self) -> usize {
        self.normalizer_calls.load(Ordering::Relaxed)
    }

    pub fn cached_labels(&self) -> usize {
        self.cache.len()
    }

    /// Resolve one raw label: vocabulary match, then memo table, then the
    /// normalizer. Symbols outside the active vocabulary are discarded.
    pub fn resolve(&self, raw_label: &str) -> Option<String> {
        let label = raw_label.trim();
        if label.is_empty() {
            return None;
        }

        if let Some(symbol) = self.vocabulary.lookup(label) {
            return Some(symbol.to_string());
        }

        let cached = self.cache.get(label).map(|entry| entry.value().clone());
        let normalized = match cached {
            Some(hit) => hit,
            None => {
                self.normalizer_calls.fetch_add(1, Ordering::Relaxed);
                let result = self.normalizer.normalize(label, self.organelle());
                self.cache.insert(label.to_string(), result.clone());
                result
            }
        };

        match normalized {
            Some(symbol) if self.vocabulary.contains(&symbol) => Some(symbol),
            Some(symbol) => {
                debug!(
                    "'{}' normalized to '{}', which is not a {} marker",
                    label,
                    symbol,
                    self.organelle()
                );
                None
            }
            None => None,
        }
    }

    /// Resolve from unstructured header text: the second whitespace token
    /// first, then the words after it up to the first `start:end` coordinate.
    pub fn resolve_header(&self, header: &str) -> Option<String> {
        let tokens: Vec<&str> = header.split_whitespace().collect();
        if tokens.len() < 2 {
            return None;
        }

        if let Some(symbol) = self.resolve(tokens[1]) {
            return Some(symbol);
        }

        let phrase: Vec<&str> = tokens[2..]
            .iter()
            .copied()
            .take_while(|token| !is_coordinate_token(token))
            .collect();
        if phrase.is_empty() {
            return None;
        }
        self.resolve(&phrase.join(" "))
    }

    /// Resolve a source record: explicit gene label, then header tokens,
    /// then the explicit protein label.
    pub fn resolve_record(&self, record: &SourceRecord) -> Option<String> {
        record
            .gene_hint
            .as_deref()
            .and_then(|gene| self.resolve(gene))
            .or_else(|| record.header.as_deref().and_then(|h| self.resolve_header(h)))
            .or_else(|| record.protein_hint.as_deref().and_then(|p| self.resolve(p)))
    }
}
