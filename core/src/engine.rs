// core/src/engine.rs
//
// Lookup engine: one full expansion -> collection -> ranking pass per
// segment, with an LRU cache of ranked results.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::{debug, warn};

use crate::backend::{validate_hits, BackendHit, SearchBackend};
use crate::candidate::Candidate;
use crate::error::Result;
use crate::fuzzy::{FuzzyRuleSet, Variant};
use crate::ranking::{self, RankingParams};
use crate::rerank::{PhraseReranker, SMART_PHRASE_WEIGHT};
use crate::trie::TrieIndex;
use crate::usage::UsageStore;
use crate::Config;

/// The candidate-resolution engine.
///
/// Owns the installed index, the validated fuzzy rules and the ranking
/// constants. The accelerated backend and the phrase re-ranker are optional;
/// without them every lookup goes through the trie.
pub struct Engine {
    index: Arc<TrieIndex>,
    rules: FuzzyRuleSet,
    params: RankingParams,
    phrase_min_len: usize,
    usage: Option<UsageStore>,
    backend: Option<Box<dyn SearchBackend>>,
    reranker: Option<Box<dyn PhraseReranker>>,
    cache: RefCell<LruCache<String, Vec<Candidate>>>,
    cache_hits: Cell<usize>,
    cache_misses: Cell<usize>,
}

impl Engine {
    /// Build an engine from `config`. Fails if the fuzzy rules are invalid or
    /// would expand without bound.
    pub fn new(config: &Config) -> Result<Self> {
        let rules = FuzzyRuleSet::from_specs(&config.fuzzy, config.max_fuzzy_variants)?;
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            index: Arc::new(TrieIndex::new()),
            rules,
            params: config.ranking_params(),
            phrase_min_len: config.phrase_min_len,
            usage: config.usage_enabled.then(UsageStore::new_in_memory),
            backend: None,
            reranker: None,
            cache: RefCell::new(LruCache::new(capacity)),
            cache_hits: Cell::new(0),
            cache_misses: Cell::new(0),
        })
    }

    /// Replace the usage store (e.g. with a persistent one).
    pub fn with_usage(mut self, usage: UsageStore) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn SearchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_reranker(mut self, reranker: Box<dyn PhraseReranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn set_reranker(&mut self, reranker: Option<Box<dyn PhraseReranker>>) {
        self.reranker = reranker;
        self.clear_cache();
    }

    /// Swap in a freshly built index.
    pub fn install_index(&mut self, index: Arc<TrieIndex>) {
        debug!(entries = index.entry_count(), "installing index");
        self.index = index;
        self.clear_cache();
    }

    pub fn index(&self) -> &Arc<TrieIndex> {
        &self.index
    }

    pub fn set_rules(&mut self, rules: FuzzyRuleSet) {
        self.rules = rules;
        self.clear_cache();
    }

    pub fn rules(&self) -> &FuzzyRuleSet {
        &self.rules
    }

    pub fn params(&self) -> &RankingParams {
        &self.params
    }

    pub fn usage(&self) -> Option<&UsageStore> {
        self.usage.as_ref()
    }

    pub fn is_punctuation(&self, ch: char) -> bool {
        self.index.is_punctuation(ch)
    }

    /// Ranked, deduplicated candidates for `segment`.
    pub fn lookup(&self, segment: &str) -> Vec<Candidate> {
        if segment.is_empty() {
            return Vec::new();
        }
        let key = segment.to_lowercase();
        if let Some(cached) = self.cache.borrow_mut().get(&key) {
            self.cache_hits.set(self.cache_hits.get() + 1);
            return cached.clone();
        }
        self.cache_misses.set(self.cache_misses.get() + 1);

        let variants = self.rules.expand(&key);
        let usage = self
            .usage
            .as_ref()
            .map(|u| u.counts_for(&key))
            .unwrap_or_default();

        let mut out = match self.backend_candidates(&variants, &usage) {
            Some(cands) => cands,
            None => self.trie_candidates(&variants, &usage),
        };
        self.inject_phrases(&key, &mut out);

        let ranked = ranking::sort_and_dedupe(out);
        debug!(segment = %key, variants = variants.len(), candidates = ranked.len(), "lookup");
        self.cache.borrow_mut().put(key, ranked.clone());
        ranked
    }

    fn trie_candidates(&self, variants: &[Variant], usage: &HashMap<String, u64>) -> Vec<Candidate> {
        let mut out = Vec::new();
        for variant in variants {
            let hits = ranking::collect_from_trie(&self.index, &variant.text, &self.params);
            ranking::score_hits(hits, variant, usage, &self.params, &mut out);
        }
        out
    }

    /// Candidates from the accelerated backend, or `None` to fall back to
    /// the trie for this lookup.
    fn backend_candidates(
        &self,
        variants: &[Variant],
        usage: &HashMap<String, u64>,
    ) -> Option<Vec<Candidate>> {
        let backend = self.backend.as_ref()?;
        let mut all: Vec<(&Variant, Vec<BackendHit>)> = Vec::with_capacity(variants.len());
        for variant in variants {
            let exact_only = self.params.use_exact_match(&variant.text);
            let result = backend
                .search(&variant.text, exact_only, self.params.collect_limit)
                .and_then(|hits| validate_hits(&variant.text, exact_only, &hits).map(|_| hits));
            match result {
                Ok(hits) => all.push((variant, hits)),
                Err(e) => {
                    warn!(backend = backend.name(), variant = %variant.text, error = %e, "search backend failed, using trie");
                    return None;
                }
            }
        }

        let mut out = Vec::new();
        for (variant, hits) in &all {
            let pairs = hits.iter().map(|h| (h.path.clone(), &h.entry));
            ranking::score_hits(pairs, variant, usage, &self.params, &mut out);
        }
        Some(out)
    }

    fn inject_phrases(&self, segment: &str, out: &mut Vec<Candidate>) {
        let Some(reranker) = self.reranker.as_ref() else {
            return;
        };
        if segment.chars().count() < self.phrase_min_len {
            return;
        }
        for (rank, phrase) in reranker
            .suggest(segment, &self.index)
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .enumerate()
        {
            out.push(Candidate::smart_phrase(phrase, SMART_PHRASE_WEIGHT - rank as f64));
        }
    }

    /// Record that `surface` was committed for `segment`.
    pub fn commit(&self, segment: &str, surface: &str) {
        if let Some(usage) = &self.usage {
            if !segment.is_empty() && !surface.is_empty() {
                usage.record(segment, surface);
            }
        }
        self.clear_cache();
    }

    /// Convert a romanized phrase token by token: each whitespace-separated
    /// token becomes the first entry stored at its exact key, or stays as
    /// typed. Tokens on a line are joined without separators; line breaks
    /// are kept.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use webime_core::{Config, Engine};
    /// use webime_core::entry::Lexeme;
    /// use webime_core::trie::TrieIndex;
    ///
    /// let mut index = TrieIndex::new();
    /// index.insert("ni", vec![Lexeme::new("你", None).tag(0)]);
    /// index.insert("hao", vec![Lexeme::new("好", None).tag(0)]);
    /// let mut engine = Engine::new(&Config::default()).unwrap();
    /// engine.install_index(Arc::new(index));
    ///
    /// assert_eq!(engine.convert_phrase("ni hao\nni xyz"), "你好\n你xyz");
    /// ```
    pub fn convert_phrase(&self, text: &str) -> String {
        text.lines()
            .map(|line| {
                line.split_whitespace()
                    .map(|token| {
                        self.index
                            .exact(&token.to_lowercase())
                            .first()
                            .map(|e| e.surface.as_str())
                            .unwrap_or(token)
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns (hits, misses).
    pub fn cache_stats(&self) -> (usize, usize) {
        (self.cache_hits.get(), self.cache_misses.get())
    }

    /// Hit rate in percent, `None` before the first lookup.
    pub fn cache_hit_rate(&self) -> Option<f32> {
        let (hits, misses) = self.cache_stats();
        let total = hits + misses;
        if total == 0 {
            None
        } else {
            Some(hits as f32 / total as f32 * 100.0)
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.borrow().cap().get()
    }

    /// Drop cached rankings. Counters are kept.
    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn reset_cache_stats(&self) {
        self.cache_hits.set(0);
        self.cache_misses.set(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateSource;
    use crate::entry::Lexeme;
    use crate::error::Error;

    fn engine_with(pairs: &[(&str, &str, i32)]) -> Engine {
        let mut t = TrieIndex::new();
        for (k, s, p) in pairs {
            t.insert(k, vec![Lexeme::new(*s, None).tag(*p)]);
        }
        let mut e = Engine::new(&Config::default()).unwrap();
        e.install_index(Arc::new(t));
        e
    }

    #[test]
    fn cache_hits_and_invalidation() {
        let e = engine_with(&[("ni", "你", 0)]);
        e.lookup("ni");
        e.lookup("NI");
        assert_eq!(e.cache_stats(), (1, 1));
        assert_eq!(e.cache_size(), 1);
        e.commit("ni", "你");
        assert_eq!(e.cache_size(), 0);
    }

    #[test]
    fn commit_feeds_usage_bonus() {
        let e = engine_with(&[("ma", "妈", 0), ("ma", "马", 0)]);
        assert_eq!(e.lookup("ma")[0].surface, "妈");
        e.commit("ma", "马");
        assert_eq!(e.lookup("ma")[0].surface, "马");
    }

    struct Failing;
    impl SearchBackend for Failing {
        fn search(&self, _: &str, _: bool, _: usize) -> Result<Vec<BackendHit>> {
            Err(Error::Backend("offline".into()))
        }
    }

    struct Malformed;
    impl SearchBackend for Malformed {
        fn search(&self, _: &str, _: bool, _: usize) -> Result<Vec<BackendHit>> {
            Ok(vec![BackendHit {
                path: "zzz".into(),
                entry: Lexeme::new("错", None).tag(0),
            }])
        }
    }

    #[test]
    fn backend_failure_falls_back_to_trie() {
        let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(Failing), Box::new(Malformed)];
        for backend in backends {
            let e = engine_with(&[("ni", "你", 0)]).with_backend(backend);
            let got = e.lookup("ni");
            assert_eq!(got.len(), 1);
            assert_eq!(got[0].surface, "你");
        }
    }

    struct Fixed(Vec<&'static str>);
    impl PhraseReranker for Fixed {
        fn suggest(&self, _: &str, _: &TrieIndex) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[test]
    fn smart_phrases_sort_first_above_threshold() {
        let e = engine_with(&[("nihao", "你好", 100)])
            .with_reranker(Box::new(Fixed(vec!["你好吗", "你好"])));
        let got = e.lookup("nihao");
        assert_eq!(got[0].surface, "你好吗");
        assert_eq!(got[0].source, CandidateSource::SmartPhrase);
        assert_eq!(got[1].surface, "你好");
        assert_eq!(got[1].source, CandidateSource::SmartPhrase);
        assert_eq!(got.len(), 2);

        // below phrase_min_len the re-ranker is not consulted
        let got = e.lookup("nih");
        assert!(got.iter().all(|c| c.source == CandidateSource::Dictionary));
    }

    #[test]
    fn invalid_rules_rejected_at_construction() {
        let cfg = Config {
            fuzzy: vec!["s=s".into()],
            ..Config::default()
        };
        assert!(matches!(Engine::new(&cfg), Err(Error::InvalidRule { .. })));
    }
}
