//! Ranked candidates and the paginated list a session exposes.
//!
//! - `Candidate`: one surface/gloss pair with its ranking weight
//! - `CandidateList`: the ranked list split into fixed-size pages

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Collected from the trie (or the accelerated backend).
    #[default]
    Dictionary,
    /// A full-phrase completion injected by a phrase re-ranker.
    SmartPhrase,
}

/// A single ranked candidate.
///
/// Weights are only comparable within one lookup cycle; higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub surface: String,
    pub gloss: Option<String>,
    pub weight: f64,
    #[serde(default)]
    pub source: CandidateSource,
}

impl Candidate {
    pub fn new<T: Into<String>>(surface: T, gloss: Option<String>, weight: f64) -> Self {
        Candidate {
            surface: surface.into(),
            gloss,
            weight,
            source: CandidateSource::Dictionary,
        }
    }

    pub fn smart_phrase<T: Into<String>>(surface: T, weight: f64) -> Self {
        Candidate {
            surface: surface.into(),
            gloss: None,
            weight,
            source: CandidateSource::SmartPhrase,
        }
    }

    pub fn has_gloss(&self) -> bool {
        self.gloss.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// The text a selection inserts: the gloss when `prefer_gloss` and one is
    /// present, otherwise the surface.
    pub fn commit_text(&self, prefer_gloss: bool) -> &str {
        match self.gloss.as_deref() {
            Some(g) if prefer_gloss && !g.is_empty() => g,
            _ => &self.surface,
        }
    }
}

/// A paginated list of candidates.
#[derive(Debug, Clone)]
pub struct CandidateList {
    candidates: Vec<Candidate>,
    page_size: usize,
    current_page: usize,
}

pub const DEFAULT_PAGE_SIZE: usize = 10;

impl CandidateList {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            candidates: Vec::new(),
            page_size: page_size.max(1),
            current_page: 0,
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_page();
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the candidates and go back to the first page.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.current_page = 0;
    }

    /// Replace the candidates, keeping the current page if it still exists.
    pub fn refresh(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        let pages = self.num_pages();
        if self.current_page >= pages {
            self.current_page = pages.saturating_sub(1);
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn num_pages(&self) -> usize {
        if self.candidates.is_empty() {
            0
        } else {
            self.candidates.len().div_ceil(self.page_size)
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    fn current_page_range(&self) -> Range<usize> {
        let start = (self.current_page * self.page_size).min(self.candidates.len());
        let end = (start + self.page_size).min(self.candidates.len());
        start..end
    }

    pub fn current_page_candidates(&self) -> &[Candidate] {
        &self.candidates[self.current_page_range()]
    }

    /// Move to the previous page. Returns true if the page changed.
    pub fn page_up(&mut self) -> bool {
        if self.current_page > 0 {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Move to the next page. Returns true if the page changed.
    pub fn page_down(&mut self) -> bool {
        let num_pages = self.num_pages();
        if num_pages > 0 && self.current_page < num_pages - 1 {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Candidate at `page_index` on the current page.
    pub fn select_by_index(&self, page_index: usize) -> Option<&Candidate> {
        self.current_page_candidates().get(page_index)
    }

    pub fn first(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.current_page = 0;
    }

    pub fn reset(&mut self) {
        self.current_page = 0;
    }
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize, page: usize) -> CandidateList {
        let mut l = CandidateList::with_page_size(page);
        l.set_candidates(
            (0..n)
                .map(|i| Candidate::new(format!("c{}", i), None, (n - i) as f64))
                .collect(),
        );
        l
    }

    #[test]
    fn pages_and_bounds() {
        let mut l = list(25, 10);
        assert_eq!(l.num_pages(), 3);
        assert!(!l.page_up());
        assert!(l.page_down());
        assert!(l.page_down());
        assert!(!l.page_down());
        assert_eq!(l.current_page(), 2);
        assert_eq!(l.current_page_candidates().len(), 5);
        assert_eq!(l.select_by_index(0).unwrap().surface, "c20");
        assert!(l.select_by_index(5).is_none());
    }

    #[test]
    fn refresh_clamps_page() {
        let mut l = list(25, 10);
        l.page_down();
        l.page_down();
        l.refresh(list(12, 10).candidates().to_vec());
        assert_eq!(l.current_page(), 1);
        l.refresh(Vec::new());
        assert_eq!(l.current_page(), 0);
        assert_eq!(l.num_pages(), 0);
        assert!(l.current_page_candidates().is_empty());
    }

    #[test]
    fn commit_text_prefers_gloss_only_when_asked() {
        let c = Candidate::new("苹果", Some("apple".into()), 1.0);
        assert_eq!(c.commit_text(false), "苹果");
        assert_eq!(c.commit_text(true), "apple");
        let bare = Candidate::new("你", Some(String::new()), 1.0);
        assert!(!bare.has_gloss());
        assert_eq!(bare.commit_text(true), "你");
    }
}
