//! Dictionary entry model.
//!
//! Dictionary sources are loosely shaped: a key maps either to one value or a
//! list of values, and a value is either a bare surface string or an object
//! carrying a surface and an optional gloss. [`RawValue`] / [`RawEntry`]
//! accept all of these, and [`RawEntry::normalize`] turns each into a
//! canonical [`Lexeme`] once, at ingestion. Nothing downstream inspects the
//! raw shape again.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A value as it appears in a dictionary source.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEntry {
    Bare(String),
    Detailed {
        #[serde(default, alias = "char", alias = "text")]
        surface: Option<String>,
        #[serde(default, alias = "en")]
        gloss: Option<String>,
    },
}

/// The right-hand side of a dictionary key: one entry or several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    One(RawEntry),
    Many(Vec<RawEntry>),
}

impl RawValue {
    pub fn into_entries(self) -> Vec<RawEntry> {
        match self {
            RawValue::One(e) => vec![e],
            RawValue::Many(v) => v,
        }
    }
}

impl RawEntry {
    /// Normalize into a canonical lexeme. Returns `None` when the surface is
    /// missing or blank.
    pub fn normalize(self) -> Option<Lexeme> {
        let (surface, gloss) = match self {
            RawEntry::Bare(s) => (s, None),
            RawEntry::Detailed { surface, gloss } => (surface?, gloss),
        };
        let surface = normalize_text(&surface);
        if surface.is_empty() {
            return None;
        }
        let gloss = gloss.map(|g| normalize_text(&g)).filter(|g| !g.is_empty());
        Some(Lexeme { surface, gloss })
    }
}

/// NFC-normalize and trim.
pub fn normalize_text(s: &str) -> String {
    s.nfc().collect::<String>().trim().to_string()
}

/// A normalized dictionary value before it is tagged with a priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lexeme {
    pub surface: String,
    pub gloss: Option<String>,
}

impl Lexeme {
    pub fn new(surface: impl Into<String>, gloss: Option<&str>) -> Self {
        Self {
            surface: surface.into(),
            gloss: gloss.map(str::to_string),
        }
    }

    /// Copy this lexeme into an index entry carrying the owning dictionary's
    /// priority.
    pub fn tag(&self, priority: i32) -> Entry {
        Entry {
            surface: self.surface.clone(),
            gloss: self.gloss.clone(),
            priority,
        }
    }
}

/// The atomic unit stored in the trie index.
///
/// `priority` is inherited from the owning dictionary when the index is
/// built and is never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub surface: String,
    pub gloss: Option<String>,
    pub priority: i32,
}

impl Entry {
    pub fn gloss_str(&self) -> &str {
        self.gloss.as_deref().unwrap_or("")
    }

    pub fn has_gloss(&self) -> bool {
        self.gloss.as_deref().is_some_and(|g| !g.is_empty())
    }
}
