//! Combining enabled dictionaries into one index.
//!
//! Enabled dictionaries are inserted in descending priority order, so within
//! a shared key the value list is ordered high-priority first. Dictionaries
//! with equal priority keep the order they were given in. The result is
//! always a fresh [`TrieIndex`]; nothing from a previous build carries over.

use tracing::debug;

use crate::dictionary::{Dictionary, DictionaryKind};
use crate::trie::TrieIndex;

/// Build an index from scratch out of the enabled dictionaries.
pub fn build_index<'a, I>(dictionaries: I) -> TrieIndex
where
    I: IntoIterator<Item = &'a Dictionary>,
{
    let mut enabled: Vec<&Dictionary> = dictionaries.into_iter().filter(|d| d.enabled).collect();
    // stable: equal priorities keep registration order
    enabled.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut index = TrieIndex::new();
    for dict in enabled {
        let mut inserted = 0usize;
        for (key, lexemes) in dict.iter() {
            let key = match dict.kind {
                DictionaryKind::Standard => key.to_lowercase(),
                DictionaryKind::Punctuation => {
                    for ch in key.chars() {
                        index.register_punctuation(ch);
                    }
                    key.to_string()
                }
            };
            let entries: Vec<_> = lexemes.iter().map(|l| l.tag(dict.priority)).collect();
            inserted += entries.len();
            index.insert(&key, entries);
        }
        debug!(dictionary = %dict.id, priority = dict.priority, entries = inserted, "merged dictionary");
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Lexeme;

    fn dict(id: &str, priority: i32, pairs: &[(&str, &str)]) -> Dictionary {
        let mut d = Dictionary::new(id, DictionaryKind::Standard, priority);
        for (k, v) in pairs {
            d.insert(k, Lexeme::new(*v, None));
        }
        d
    }

    #[test]
    fn higher_priority_first_regardless_of_input_order() {
        let low = dict("low", 10, &[("ni", "泥")]);
        let high = dict("high", 100, &[("ni", "你")]);
        let index = build_index([&low, &high]);

        let vals = index.exact("ni");
        assert_eq!(vals[0].surface, "你");
        assert_eq!(vals[0].priority, 100);
        assert_eq!(vals[1].surface, "泥");
        assert_eq!(vals[1].priority, 10);
    }

    #[test]
    fn same_surface_from_two_dictionaries_both_kept() {
        let x = dict("x", 100, &[("ni", "你")]);
        let y = dict("y", 10, &[("ni", "你")]);
        let index = build_index([&y, &x]);
        assert_eq!(index.exact("ni").len(), 2);
    }

    #[test]
    fn disabled_dictionaries_are_skipped() {
        let mut off = dict("off", 100, &[("ni", "你")]);
        off.enabled = false;
        let index = build_index([&off]);
        assert!(index.is_empty());
    }

    #[test]
    fn keys_are_case_folded_except_punctuation() {
        let roman = dict("roman", 50, &[("NiHao", "你好")]);
        let mut punct = Dictionary::new("punct", DictionaryKind::Punctuation, 40);
        punct.insert("<", Lexeme::new("《", None));
        let index = build_index([&roman, &punct]);

        assert_eq!(index.exact("nihao").len(), 1);
        assert!(index.exact("NiHao").is_empty());
        assert_eq!(index.exact("<")[0].surface, "《");
        assert!(index.is_punctuation('<'));
        assert!(!index.is_punctuation('n'));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let a = dict("a", 100, &[("ni", "你"), ("hao", "好")]);
        let b = dict("b", 10, &[("ni", "泥")]);
        let first = build_index([&a, &b]);
        let second = build_index([&a, &b]);
        assert_eq!(first.exact("ni"), second.exact("ni"));
        assert_eq!(first.entry_count(), second.entry_count());
    }

    #[test]
    fn equal_priority_keeps_given_order() {
        let a = dict("a", 10, &[("ka", "卡")]);
        let b = dict("b", 10, &[("ka", "咖")]);
        let index = build_index([&a, &b]);
        let got: Vec<&str> = index.exact("ka").iter().map(|e| e.surface.as_str()).collect();
        assert_eq!(got, vec!["卡", "咖"]);
    }
}
