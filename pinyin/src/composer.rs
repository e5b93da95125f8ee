//! Local sentence composer.
//!
//! Splits an unbroken segment into syllables and joins dictionary words over
//! them with dynamic programming, so `"nihaoshijie"` can offer `你好世界`
//! even though no dictionary holds that key.

use tracing::debug;
use webime_core::{PhraseReranker, TrieIndex};

use crate::syllables::split_syllables;

/// Syllables a single word may span.
pub const DEFAULT_LOOKAHEAD: usize = 4;

/// Score bonus per output character.
const CHAR_BONUS: i64 = 2000;

#[derive(Debug, Clone)]
pub struct SentenceComposer {
    lookahead: usize,
}

#[derive(Clone)]
struct Path {
    score: i64,
    words: Vec<String>,
}

impl SentenceComposer {
    pub fn new(lookahead: usize) -> Self {
        Self {
            lookahead: lookahead.max(1),
        }
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Best segmentation of `segment` into dictionary words, or `None` when
    /// some stretch of syllables matches no word.
    pub fn compose(&self, segment: &str, index: &TrieIndex) -> Option<Vec<String>> {
        let pieces = split_syllables(&segment.to_lowercase());
        if pieces.is_empty() {
            return None;
        }
        let n = pieces.len();

        // best[i]: highest scoring way to cover pieces[..i]
        let mut best: Vec<Option<Path>> = vec![None; n + 1];
        best[0] = Some(Path {
            score: 0,
            words: Vec::new(),
        });

        for start in 0..n {
            let Some(from) = best[start].clone() else {
                continue;
            };
            for len in 1..=self.lookahead.min(n - start) {
                let key: String = pieces[start..start + len].concat();
                let Some(top) = index.exact(&key).first() else {
                    continue;
                };
                let score = from.score
                    + i64::from(top.priority)
                    + CHAR_BONUS * top.surface.chars().count() as i64;
                let end = start + len;
                if best[end].as_ref().map_or(true, |p| score > p.score) {
                    let mut words = from.words.clone();
                    words.push(top.surface.clone());
                    best[end] = Some(Path { score, words });
                }
            }
        }

        let path = best.pop().flatten();
        debug!(segment, syllables = n, found = path.is_some(), "compose");
        path.map(|p| p.words)
    }
}

impl Default for SentenceComposer {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl PhraseReranker for SentenceComposer {
    fn suggest(&self, segment: &str, index: &TrieIndex) -> Vec<String> {
        match self.compose(segment, index) {
            // a single word is already an ordinary exact candidate
            Some(words) if words.len() > 1 => vec![words.concat()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webime_core::{build_index, Dictionary, DictionaryKind};

    // words outrank single characters by dictionary priority
    fn index(chars: &str, words: &str) -> TrieIndex {
        let c = Dictionary::from_json_str("chars", DictionaryKind::Standard, 10, chars).unwrap();
        let w = Dictionary::from_json_str("words", DictionaryKind::Standard, 100, words).unwrap();
        build_index([&c, &w])
    }

    #[test]
    fn joins_words() {
        let idx = index(
            r#"{"ni": "你", "hao": "好", "shi": "是", "jie": "界"}"#,
            r#"{"nihao": "你好", "shijie": "世界"}"#,
        );
        let c = SentenceComposer::default();
        assert_eq!(c.compose("nihaoshijie", &idx).unwrap(), vec!["你好", "世界"]);
        assert_eq!(c.suggest("nihaoshijie", &idx), vec!["你好世界".to_string()]);
    }

    #[test]
    fn equal_priority_prefers_more_priority_mass() {
        // 你 + 好 collects priority twice for the same character count
        let idx = index(r#"{"ni": "你", "hao": "好", "nihao": "拟好"}"#, "{}");
        let c = SentenceComposer::default();
        assert_eq!(c.compose("nihao", &idx).unwrap(), vec!["你", "好"]);
    }

    #[test]
    fn broken_path_gives_nothing() {
        let idx = index(r#"{"ni": "你"}"#, "{}");
        let c = SentenceComposer::default();
        assert!(c.compose("nixyz", &idx).is_none());
        assert!(c.suggest("nixyz", &idx).is_empty());
    }

    #[test]
    fn single_word_is_not_suggested() {
        let idx = index("{}", r#"{"nihao": "你好"}"#);
        let c = SentenceComposer::default();
        assert_eq!(c.compose("nihao", &idx).unwrap(), vec!["你好"]);
        assert!(c.suggest("nihao", &idx).is_empty());
    }

    #[test]
    fn lookahead_limits_word_span() {
        let idx = index(r#"{"zhong": "中", "guo": "国"}"#, r#"{"zhongguo": "中国"}"#);
        assert_eq!(
            SentenceComposer::new(1).compose("zhongguo", &idx).unwrap(),
            vec!["中", "国"]
        );
        assert_eq!(
            SentenceComposer::new(2).compose("zhongguo", &idx).unwrap(),
            vec!["中国"]
        );
    }
}
