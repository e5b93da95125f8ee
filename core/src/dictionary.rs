//! Dictionaries and the sources they are loaded from.
//!
//! A [`Dictionary`] is the parsed form of one source: romanized key to a list
//! of [`Lexeme`]s, plus the priority and enabled flag it participates in the
//! merge with. How the bytes are fetched is behind [`DictionarySource`]; the
//! engine only consumes the parsed shape.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::{Lexeme, RawEntry, RawValue};
use crate::error::{Error, Result};

/// How keys of a dictionary are indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DictionaryKind {
    /// Romanized keys, case-folded to lowercase.
    #[default]
    Standard,
    /// Single symbol keys, inserted verbatim and registered as punctuation.
    Punctuation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub id: String,
    pub kind: DictionaryKind,
    pub priority: i32,
    pub enabled: bool,
    entries: BTreeMap<String, Vec<Lexeme>>,
}

impl Dictionary {
    pub fn new(id: impl Into<String>, kind: DictionaryKind, priority: i32) -> Self {
        Self {
            id: id.into(),
            kind,
            priority,
            enabled: true,
            entries: BTreeMap::new(),
        }
    }

    /// Parse a dictionary from its JSON form: an object mapping each key to a
    /// value or a list of values.
    pub fn from_json_str(
        id: impl Into<String>,
        kind: DictionaryKind,
        priority: i32,
        json: &str,
    ) -> Result<Self> {
        let id = id.into();
        let raw: BTreeMap<String, RawValue> =
            serde_json::from_str(json).map_err(|e| Error::Parse {
                dictionary: id.clone(),
                message: e.to_string(),
            })?;

        let mut dict = Dictionary::new(id, kind, priority);
        for (key, value) in raw {
            let lexemes = value.into_entries().into_iter().filter_map(RawEntry::normalize);
            dict.extend(&key, lexemes);
        }
        Ok(dict)
    }

    /// Add a single lexeme under `key`.
    pub fn insert(&mut self, key: &str, lexeme: Lexeme) {
        self.extend(key, std::iter::once(lexeme));
    }

    fn extend(&mut self, key: &str, lexemes: impl IntoIterator<Item = Lexeme>) {
        if key.is_empty() {
            return;
        }
        let slot = self.entries.entry(key.to_string()).or_default();
        for lex in lexemes {
            if !slot.contains(&lex) {
                slot.push(lex);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[Lexeme]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Lexeme])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn word_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Same content under a different priority.
    pub fn with_priority(&self, priority: i32) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    /// Write the parsed dictionary to a compiled bincode file.
    pub fn save_compiled<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| Error::io(path, e))?;
        bincode::serialize_into(BufWriter::new(f), self)
            .map_err(|e| Error::Cache(format!("serialize {}: {}", path.display(), e)))
    }

    /// Read a dictionary previously written by [`Dictionary::save_compiled`].
    pub fn load_compiled<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| Error::io(path, e))?;
        bincode::deserialize_from(BufReader::new(f))
            .map_err(|e| Error::Cache(format!("deserialize {}: {}", path.display(), e)))
    }
}

/// Where a dictionary's content comes from.
///
/// Implementations may block (file or network access); they are called from
/// the rebuild worker, never from keystroke handling.
pub trait DictionarySource: Send + Sync + std::fmt::Debug {
    fn load(&self, id: &str, kind: DictionaryKind, priority: i32) -> Result<Dictionary>;
}

/// A JSON dictionary file on disk.
#[derive(Debug, Clone)]
pub struct JsonFile {
    pub path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DictionarySource for JsonFile {
    fn load(&self, id: &str, kind: DictionaryKind, priority: i32) -> Result<Dictionary> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        Dictionary::from_json_str(id, kind, priority, &text)
    }
}

/// A user dictionary held as JSON text.
#[derive(Debug, Clone)]
pub struct InlineJson {
    pub text: String,
}

impl InlineJson {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl DictionarySource for InlineJson {
    fn load(&self, id: &str, kind: DictionaryKind, priority: i32) -> Result<Dictionary> {
        Dictionary::from_json_str(id, kind, priority, &self.text)
    }
}

/// A compiled bincode dictionary. The stored id, kind and priority are
/// replaced by the ones the registry asks for.
#[derive(Debug, Clone)]
pub struct CompiledFile {
    pub path: PathBuf,
}

impl CompiledFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DictionarySource for CompiledFile {
    fn load(&self, id: &str, kind: DictionaryKind, priority: i32) -> Result<Dictionary> {
        let mut dict = Dictionary::load_compiled(&self.path)?;
        dict.id = id.to_string();
        dict.kind = kind;
        dict.priority = priority;
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_json() {
        let json = r#"{
            "ni": ["你", {"char": "尼", "en": "nun"}],
            "hao": "好",
            "nihao": {"char": "你好", "en": "hello"}
        }"#;
        let d = Dictionary::from_json_str("base", DictionaryKind::Standard, 100, json).unwrap();
        assert_eq!(d.key_count(), 3);
        assert_eq!(d.word_count(), 4);
        assert_eq!(d.get("ni").unwrap()[1], Lexeme::new("尼", Some("nun")));
        assert_eq!(d.get("nihao").unwrap()[0].gloss.as_deref(), Some("hello"));
    }

    #[test]
    fn duplicate_values_under_one_key_are_kept_once() {
        let json = r#"{"ni": ["你", "你", {"char": "你"}]}"#;
        let d = Dictionary::from_json_str("d", DictionaryKind::Standard, 1, json).unwrap();
        assert_eq!(d.get("ni").unwrap().len(), 1);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Dictionary::from_json_str("bad", DictionaryKind::Standard, 1, "{not json")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { ref dictionary, .. } if dictionary == "bad"));
    }

    #[test]
    fn compiled_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("punct.bin");
        let mut d = Dictionary::new("punct", DictionaryKind::Punctuation, 40);
        d.insert(",", Lexeme::new("，", None));
        d.save_compiled(&path).unwrap();

        let loaded = CompiledFile::new(&path)
            .load("punct2", DictionaryKind::Punctuation, 45)
            .unwrap();
        assert_eq!(loaded.id, "punct2");
        assert_eq!(loaded.priority, 45);
        assert_eq!(loaded.get(","), d.get(","));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = JsonFile::new("/nonexistent/dict.json")
            .load("x", DictionaryKind::Standard, 1)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
