//! Candidate ranking.
//!
//! For every variant the trie is entered at the variant's node. Short
//! variants (and short all-vowel ones) only take that node's own entries;
//! longer ones also take every descendant, remembering the key path each
//! came from. Each collected entry gets a weight:
//!
//! ```text
//! base(path == variant ? exact_base : prefix_base)
//!   - (|path| - |variant|) * depth_penalty
//!   + entry priority
//!   - fuzzy_penalty            (variant produced by a fuzzy rule)
//!   + usage bonus              (log2(1 + count), capped)
//! ```
//!
//! Results from all variants are sorted by descending weight with a stable
//! sort, then deduplicated by surface keeping the first occurrence.
use std::collections::HashMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::Candidate;
use crate::entry::Entry;
use crate::fuzzy::Variant;
use crate::session::InputMode;
use crate::trie::TrieIndex;

/// Tunable constants of the ranking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingParams {
    /// Variants at most this many chars long only match their exact node.
    pub exact_match_max_len: usize,
    /// All-vowel variants with a length in `vowel_band_min..=vowel_band_max`
    /// also only match their exact node.
    pub vowel_band_min: usize,
    pub vowel_band_max: usize,
    pub exact_base: f64,
    pub prefix_base: f64,
    pub depth_penalty: f64,
    pub fuzzy_penalty: f64,
    pub usage_bonus_scale: f64,
    /// Upper bound on entries collected per variant.
    pub collect_limit: usize,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self {
            exact_match_max_len: 2,
            vowel_band_min: 3,
            vowel_band_max: 4,
            exact_base: 10_000.0,
            prefix_base: 1_000.0,
            depth_penalty: 100.0,
            fuzzy_penalty: 500.0,
            usage_bonus_scale: 1_000.0,
            collect_limit: 5_000,
        }
    }
}

impl RankingParams {
    /// Whether `variant` is restricted to its exact node.
    pub fn use_exact_match(&self, variant: &str) -> bool {
        let len = variant.chars().count();
        if len <= self.exact_match_max_len {
            return true;
        }
        (self.vowel_band_min..=self.vowel_band_max).contains(&len)
            && variant.chars().all(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
    }

    /// Bonus for a surface committed `count` times for this segment. Never
    /// larger than the gap between the exact and prefix bases.
    pub fn usage_bonus(&self, count: u64) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let cap = (self.exact_base - self.prefix_base).max(0.0);
        (self.usage_bonus_scale * (1.0 + count as f64).log2()).min(cap)
    }

    pub fn weigh(&self, path: &str, variant: &Variant, entry: &Entry, usage_count: u64) -> f64 {
        let path_len = path.chars().count();
        let var_len = variant.text.chars().count();
        let mut weight = if path == variant.text {
            self.exact_base
        } else {
            self.prefix_base
        };
        weight -= path_len.saturating_sub(var_len) as f64 * self.depth_penalty;
        weight += f64::from(entry.priority);
        if variant.fuzzy {
            weight -= self.fuzzy_penalty;
        }
        weight + self.usage_bonus(usage_count)
    }
}

/// Entries for one variant: `(key path, entry)` pairs in discovery order.
pub type Hits<'a> = Vec<(String, &'a Entry)>;

/// Collect the hits of `variant` from the trie.
pub fn collect_from_trie<'a>(index: &'a TrieIndex, variant: &str, params: &RankingParams) -> Hits<'a> {
    let Some(node) = index.lookup_node(variant) else {
        return Vec::new();
    };
    if params.use_exact_match(variant) {
        node.values()
            .iter()
            .take(params.collect_limit)
            .map(|e| (variant.to_string(), e))
            .collect()
    } else {
        let hits: Hits<'a> = node
            .collect(variant, params.collect_limit)
            .into_iter()
            .map(|c| (c.path, c.entry))
            .collect();
        if hits.len() >= params.collect_limit {
            debug!(variant, limit = params.collect_limit, "collection capped");
        }
        hits
    }
}

/// Turn one variant's hits into weighted candidates, appended to `out`.
pub fn score_hits<'a, I>(
    hits: I,
    variant: &Variant,
    usage: &HashMap<String, u64>,
    params: &RankingParams,
    out: &mut Vec<Candidate>,
) where
    I: IntoIterator<Item = (String, &'a Entry)>,
{
    for (path, entry) in hits {
        let count = usage.get(&entry.surface).copied().unwrap_or(0);
        let weight = params.weigh(&path, variant, entry, count);
        out.push(Candidate::new(entry.surface.clone(), entry.gloss.clone(), weight));
    }
}

/// Stable sort by descending weight, then drop repeated surfaces.
pub fn sort_and_dedupe(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    let mut seen = AHashSet::new();
    candidates.retain(|c| seen.insert(c.surface.clone()));
    candidates
}

/// Full trie-only ranking pass for a set of variants.
///
/// ```
/// use std::collections::HashMap;
/// use webime_core::entry::Lexeme;
/// use webime_core::fuzzy::FuzzyRuleSet;
/// use webime_core::ranking::{rank, RankingParams};
/// use webime_core::trie::TrieIndex;
///
/// let mut index = TrieIndex::new();
/// index.insert("ni", vec![Lexeme::new("你", None).tag(100)]);
/// index.insert("nihao", vec![Lexeme::new("你好", None).tag(100)]);
///
/// let variants = FuzzyRuleSet::empty().expand("nih");
/// let ranked = rank(&index, &variants, &HashMap::new(), &RankingParams::default());
/// assert_eq!(ranked[0].surface, "你好");
/// ```
pub fn rank(
    index: &TrieIndex,
    variants: &[Variant],
    usage: &HashMap<String, u64>,
    params: &RankingParams,
) -> Vec<Candidate> {
    let mut out = Vec::new();
    for variant in variants {
        let hits = collect_from_trie(index, &variant.text, params);
        score_hits(hits, variant, usage, params, &mut out);
    }
    sort_and_dedupe(out)
}

/// Restrict and reorder a ranked list for the session's mode.
///
/// Filter modes keep candidates whose gloss starts with `filter`
/// (case-insensitive); an empty filter keeps everything. Translate modes move
/// candidates with a gloss ahead of those without, keeping weight order
/// within each group.
pub fn apply_mode(mut candidates: Vec<Candidate>, mode: InputMode, filter: &str) -> Vec<Candidate> {
    if mode.is_filter() && !filter.is_empty() {
        let needle = filter.to_lowercase();
        candidates.retain(|c| {
            c.gloss
                .as_deref()
                .is_some_and(|g| g.to_lowercase().starts_with(&needle))
        });
    }
    if mode.is_translate() {
        candidates.sort_by_key(|c| !c.has_gloss());
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Lexeme;
    use crate::fuzzy::FuzzyRuleSet;

    fn no_usage() -> HashMap<String, u64> {
        HashMap::new()
    }

    fn idx(pairs: &[(&str, &str, i32)]) -> TrieIndex {
        let mut t = TrieIndex::new();
        for (k, s, p) in pairs {
            t.insert(k, vec![Lexeme::new(*s, None).tag(*p)]);
        }
        t
    }

    #[test]
    fn exact_match_thresholds() {
        let p = RankingParams::default();
        assert!(p.use_exact_match("n"));
        assert!(p.use_exact_match("ni"));
        assert!(!p.use_exact_match("nih"));
        assert!(p.use_exact_match("aio"));
        assert!(p.use_exact_match("AEIO"));
        assert!(!p.use_exact_match("aeiou"));
        assert!(!p.use_exact_match("ai'o"));
    }

    #[test]
    fn short_segment_suppresses_prefix_expansion() {
        let t = idx(&[("ni", "你", 0), ("nihao", "你好", 0)]);
        let got = rank(&t, &FuzzyRuleSet::empty().expand("ni"), &no_usage(), &RankingParams::default());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].surface, "你");
    }

    #[test]
    fn prefix_expansion_pays_depth_penalty() {
        let t = idx(&[("nihao", "你好", 7)]);
        let got = rank(&t, &FuzzyRuleSet::empty().expand("nih"), &no_usage(), &RankingParams::default());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].weight, 1000.0 - 2.0 * 100.0 + 7.0);
    }

    #[test]
    fn exact_beats_completion() {
        let t = idx(&[("hao", "好", 0), ("haode", "好的", 100)]);
        let got = rank(&t, &FuzzyRuleSet::empty().expand("hao"), &no_usage(), &RankingParams::default());
        assert_eq!(got[0].surface, "好");
        assert_eq!(got[0].weight, 10_000.0);
    }

    #[test]
    fn fuzzy_variant_is_penalised() {
        let t = idx(&[("si", "四", 10), ("shi", "是", 10)]);
        let rules = FuzzyRuleSet::from_specs(&["s=sh"], 64).unwrap();
        let got = rank(&t, &rules.expand("si"), &no_usage(), &RankingParams::default());
        assert_eq!(got[0].surface, "四");
        assert_eq!(got[1].surface, "是");
        assert_eq!(got[0].weight - got[1].weight, 500.0);
    }

    #[test]
    fn dedupe_keeps_highest() {
        let mut t = TrieIndex::new();
        t.insert("ni", vec![Lexeme::new("你", None).tag(100), Lexeme::new("你", None).tag(10)]);
        let got = rank(&t, &FuzzyRuleSet::empty().expand("ni"), &no_usage(), &RankingParams::default());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].weight, 10_100.0);
    }

    #[test]
    fn usage_bonus_is_logarithmic_and_capped() {
        let p = RankingParams::default();
        assert_eq!(p.usage_bonus(0), 0.0);
        assert_eq!(p.usage_bonus(1), 1000.0);
        assert_eq!(p.usage_bonus(3), 2000.0);
        assert_eq!(p.usage_bonus(u64::MAX), 9000.0);
        assert!(p.usage_bonus(1_000) < p.exact_base);
    }

    #[test]
    fn usage_reorders_equal_entries() {
        let t = idx(&[("ma", "妈", 0), ("ma", "马", 0)]);
        let mut usage = HashMap::new();
        usage.insert("马".to_string(), 2);
        let got = rank(&t, &FuzzyRuleSet::empty().expand("ma"), &usage, &RankingParams::default());
        assert_eq!(got[0].surface, "马");
    }

    #[test]
    fn filter_and_translate_modes() {
        let cands = vec![
            Candidate::new("你", None, 3.0),
            Candidate::new("苹果", Some("Apple".into()), 2.0),
            Candidate::new("应用", Some("application".into()), 1.0),
            Candidate::new("香蕉", Some("banana".into()), 0.5),
        ];
        let f = apply_mode(cands.clone(), InputMode::Filter, "ap");
        assert_eq!(f.len(), 2);
        assert_eq!(apply_mode(cands.clone(), InputMode::Filter, "").len(), 4);
        assert_eq!(apply_mode(cands.clone(), InputMode::Normal, "ap").len(), 4);

        let t = apply_mode(cands.clone(), InputMode::Translate, "");
        let order: Vec<&str> = t.iter().map(|c| c.surface.as_str()).collect();
        assert_eq!(order, vec!["苹果", "应用", "香蕉", "你"]);

        let ft = apply_mode(cands, InputMode::FilterTranslate, "APPL");
        assert_eq!(ft.len(), 2);
    }
}
