//! Extension point for sentence-level phrase suggestions.
use crate::trie::TrieIndex;

/// Weight given to the first injected phrase; later ones get one less each.
/// Far above anything the trie ranking can produce.
pub const SMART_PHRASE_WEIGHT: f64 = 1e9;

/// Suggests full-phrase completions for a whole segment.
///
/// The engine only asks when the segment is at least `phrase_min_len` chars.
/// Returning an empty list is always fine.
pub trait PhraseReranker: Send + Sync {
    fn suggest(&self, segment: &str, index: &TrieIndex) -> Vec<String>;
}
