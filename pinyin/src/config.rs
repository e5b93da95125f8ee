//! Pinyin-specific configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All generic options from `webime_core::Config` (flattened via serde)
//! - The default pinyin confusion presets
//! - Sentence composer and remote phrase service settings
//!
//! # Example
//!
//! ```rust
//! use webime_pinyin::PinyinConfig;
//!
//! let config = PinyinConfig::default();
//! assert!(config.base.fuzzy.contains(&"s=sh".to_string()));
//! let base = config.into_base();
//! assert_eq!(base.page_size, 10);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use webime_core::{Config, Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PinyinConfig {
    /// Base configuration fields (fuzzy rules, ranking constants, paging, ...)
    #[serde(flatten)]
    pub base: Config,

    /// Offer the composed sentence as a smart phrase.
    pub composer_enabled: bool,

    /// Syllables the composer looks ahead when joining words.
    pub composer_lookahead: usize,

    /// Endpoint of a remote phrase service; `None` keeps it off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_endpoint: Option<String>,

    /// Request timeout for the remote phrase service.
    pub remote_timeout_ms: u64,
}

impl Default for PinyinConfig {
    fn default() -> Self {
        let base = Config {
            fuzzy: pinyin_default_fuzzy_rules(),
            ..Config::default()
        };
        Self {
            base,
            composer_enabled: true,
            composer_lookahead: crate::composer::DEFAULT_LOOKAHEAD,
            remote_endpoint: None,
            remote_timeout_ms: 500,
        }
    }
}

impl PinyinConfig {
    /// Load configuration from a TOML file. Keys not present keep their
    /// pinyin defaults, including the confusion presets.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        // the flattened core config defaults to no rules at all
        let has_fuzzy = table.contains_key("fuzzy");
        let mut config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(e.to_string()))?;
        if !has_fuzzy {
            config.base.fuzzy = pinyin_default_fuzzy_rules();
        }
        config.base.validate()?;
        if config.composer_lookahead == 0 {
            return Err(Error::Config("composer_lookahead must be at least 1".into()));
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Convert this pinyin config into the base config for `Engine::new`.
    pub fn into_base(self) -> Config {
        self.base
    }

    pub fn base(&self) -> &Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Config {
        &mut self.base
    }
}

/// Returns the default confusion rules for pinyin input.
///
/// Retroflex and plain initials (zh/z, ch/c, sh/s), l/n, and the front and
/// back nasal finals (an/ang, en/eng, in/ing). Each rule works both ways.
pub fn pinyin_default_fuzzy_rules() -> Vec<String> {
    vec![
        // Retroflex vs non-retroflex
        "z=zh".into(),
        "c=ch".into(),
        "s=sh".into(),
        "l=n".into(),
        // Nasal finals (n vs ng)
        "final:an=ang".into(),
        "final:en=eng".into(),
        "final:in=ing".into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use webime_core::FuzzyRuleSet;

    #[test]
    fn default_presets_pass_rule_validation() {
        let cfg = PinyinConfig::default();
        let rules = FuzzyRuleSet::from_specs(&cfg.base.fuzzy, cfg.base.max_fuzzy_variants).unwrap();
        assert_eq!(rules.rules().len(), 7);
    }

    #[test]
    fn flattened_toml() {
        let cfg = PinyinConfig::from_toml_str(
            "page_size = 5\ncomposer_enabled = false\nremote_endpoint = \"http://localhost:9000\"\n",
        )
        .unwrap();
        assert_eq!(cfg.base.page_size, 5);
        assert!(!cfg.composer_enabled);
        assert_eq!(cfg.remote_endpoint.as_deref(), Some("http://localhost:9000"));
        // untouched keys keep pinyin defaults
        assert_eq!(cfg.base.fuzzy, pinyin_default_fuzzy_rules());
    }

    #[test]
    fn explicit_empty_fuzzy_list_disables_presets() {
        let cfg = PinyinConfig::from_toml_str("fuzzy = []").unwrap();
        assert!(cfg.base.fuzzy.is_empty());
    }

    #[test]
    fn roundtrip_and_rejects() {
        let cfg = PinyinConfig::default();
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(PinyinConfig::from_toml_str(&text).unwrap(), cfg);
        assert!(PinyinConfig::from_toml_str("composer_lookahead = 0").is_err());
        assert!(PinyinConfig::from_toml_str("page_size = 0").is_err());
    }
}
