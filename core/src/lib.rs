//! webime-core
//!
//! Candidate-resolution engine for a phonetic input method, shared by
//! language crates such as `webime-pinyin`.
//!
//! Keystrokes go into an edit buffer; the buffer is split into the token being
//! typed and the text before it; the token is expanded through fuzzy rules;
//! every variant is looked up in a trie built from priority-ranked
//! dictionaries; and the results are ranked, deduplicated and paginated.
//!
//! Public API:
//! - `Dictionary` / `DictionarySource` - parsed dictionaries and where they come from
//! - `TrieIndex` - prefix index, rebuilt from scratch on every dictionary change
//! - `DictionaryRegistry` / `IndexLoader` - dictionary set and background rebuilds
//! - `FuzzyRuleSet` - validated confusion rules
//! - `Engine` - lookup pipeline with caching, usage bonus and extension points
//! - `ImeEngine` - session, input modes and key processing
//! - `UsageStore` - per-segment commit counts
//! - `Config` - TOML configuration
use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod entry;
pub use entry::{Entry, Lexeme};

pub mod dictionary;
pub use dictionary::{
    CompiledFile, Dictionary, DictionaryKind, DictionarySource, InlineJson, JsonFile,
};

pub mod trie;
pub use trie::{TrieIndex, TrieNode};

pub mod merge;
pub use merge::build_index;

pub mod loader;
pub use loader::{
    CachedDictionary, DictionaryCache, DictionaryRegistry, DictionarySpec, IndexLoader,
    LoadWarning, RebuildOutcome,
};

pub mod segment;
pub use segment::{segment, Segment};

pub mod fuzzy;
pub use fuzzy::{FuzzyRule, FuzzyRuleSet, RulePosition, Variant};

pub mod ranking;
pub use ranking::RankingParams;

pub mod usage;
pub use usage::{UsageRecord, UsageStore};

pub mod backend;
pub use backend::{BackendHit, SearchBackend};

pub mod rerank;
pub use rerank::{PhraseReranker, SMART_PHRASE_WEIGHT};

pub mod engine;
pub use engine::Engine;

pub mod candidate;
pub use candidate::{Candidate, CandidateList, CandidateSource};

pub mod context;
pub use context::{ImeContext, RenderState};

pub mod session;
pub use session::{ImeSession, InputMode};

pub mod ime_engine;
pub use ime_engine::{ImeEngine, KeyEvent, KeyResult};

/// Language-agnostic engine configuration.
///
/// Language crates wrap this (see `PinyinConfig`) and fill in their own
/// fuzzy rule presets. Every field has a default, so a TOML file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Fuzzy confusion rules, e.g. `"s=sh"` or `"final:an=ang"`.
    pub fuzzy: Vec<String>,

    /// Candidates per page.
    pub page_size: usize,

    // Ranking constants
    pub exact_match_max_len: usize,
    pub vowel_band_min: usize,
    pub vowel_band_max: usize,
    pub exact_base: f64,
    pub prefix_base: f64,
    pub depth_penalty: f64,
    pub fuzzy_penalty: f64,
    pub usage_bonus_scale: f64,
    /// Upper bound on entries gathered per variant.
    pub collect_limit: usize,

    /// Add a bonus for surfaces the user committed before.
    pub usage_enabled: bool,

    /// Shortest segment (in chars) the phrase re-ranker is consulted for.
    pub phrase_min_len: usize,

    /// Fuzzy rule sets that can reach more variants than this are rejected.
    pub max_fuzzy_variants: usize,

    /// Entries in the segment -> ranked candidates cache.
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let ranking = RankingParams::default();
        Self {
            // language crates supply their own presets
            fuzzy: vec![],
            page_size: candidate::DEFAULT_PAGE_SIZE,
            exact_match_max_len: ranking.exact_match_max_len,
            vowel_band_min: ranking.vowel_band_min,
            vowel_band_max: ranking.vowel_band_max,
            exact_base: ranking.exact_base,
            prefix_base: ranking.prefix_base,
            depth_penalty: ranking.depth_penalty,
            fuzzy_penalty: ranking.fuzzy_penalty,
            usage_bonus_scale: ranking.usage_bonus_scale,
            collect_limit: ranking.collect_limit,
            usage_enabled: true,
            phrase_min_len: 4,
            max_fuzzy_variants: fuzzy::DEFAULT_MAX_VARIANTS,
            cache_size: 256,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject values the engine cannot work with. Fuzzy rules are checked
    /// separately when the engine is built.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        if self.vowel_band_min > self.vowel_band_max {
            return Err(Error::Config(format!(
                "vowel_band_min ({}) is greater than vowel_band_max ({})",
                self.vowel_band_min, self.vowel_band_max
            )));
        }
        if self.prefix_base > self.exact_base {
            return Err(Error::Config("prefix_base must not exceed exact_base".into()));
        }
        Ok(())
    }

    pub fn ranking_params(&self) -> RankingParams {
        RankingParams {
            exact_match_max_len: self.exact_match_max_len,
            vowel_band_min: self.vowel_band_min,
            vowel_band_max: self.vowel_band_max,
            exact_base: self.exact_base,
            prefix_base: self.prefix_base,
            depth_penalty: self.depth_penalty,
            fuzzy_penalty: self.fuzzy_penalty,
            usage_bonus_scale: self.usage_bonus_scale,
            collect_limit: self.collect_limit,
        }
    }
}
