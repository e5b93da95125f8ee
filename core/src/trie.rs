/// Prefix trie mapping romanized keys to dictionary entries.
use std::collections::{BTreeMap, BTreeSet};

use crate::entry::Entry;

/// One node of the index.
///
/// `values` holds only the entries whose full key ends at this node; entries
/// of longer keys live in descendants and are gathered at traversal time.
/// Children are kept in a `BTreeMap` so traversal order (and therefore tie
/// order in ranking) is the same for every build of the same dictionaries.
#[derive(Debug, Default, Clone)]
pub struct TrieNode {
    children: BTreeMap<char, Box<TrieNode>>,
    values: Vec<Entry>,
}

/// An entry reached during descendant collection, with the full key path
/// that leads to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<'a> {
    pub path: String,
    pub entry: &'a Entry,
}

impl TrieNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[Entry] {
        &self.values
    }

    pub fn child(&self, ch: char) -> Option<&TrieNode> {
        self.children.get(&ch).map(Box::as_ref)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Collect this node's entries and those of every descendant, in
    /// pre-order with children visited in character order.
    ///
    /// `base` is the key path of `self`. Traversal uses an explicit stack and
    /// stops once `limit` entries have been gathered.
    ///
    /// # Example
    /// ```
    /// use webime_core::trie::TrieIndex;
    /// use webime_core::entry::Lexeme;
    ///
    /// let mut index = TrieIndex::new();
    /// index.insert("ni", vec![Lexeme::new("你", None).tag(0)]);
    /// index.insert("nihao", vec![Lexeme::new("你好", None).tag(0)]);
    ///
    /// let node = index.lookup_node("ni").unwrap();
    /// let all = node.collect("ni", 10);
    /// assert_eq!(all.len(), 2);
    /// assert_eq!(all[1].path, "nihao");
    /// ```
    pub fn collect<'a>(&'a self, base: &str, limit: usize) -> Vec<Collected<'a>> {
        let mut out = Vec::new();
        let mut stack: Vec<(&'a TrieNode, String)> = vec![(self, base.to_string())];

        while let Some((node, path)) = stack.pop() {
            for entry in &node.values {
                if out.len() >= limit {
                    return out;
                }
                out.push(Collected {
                    path: path.clone(),
                    entry,
                });
            }
            // push in reverse so the smallest child is popped first
            for (ch, child) in node.children.iter().rev() {
                let mut child_path = path.clone();
                child_path.push(*ch);
                stack.push((child, child_path));
            }
        }
        out
    }
}

/// The complete index: the trie plus the set of registered punctuation
/// symbols.
///
/// An index is built once and never edited in place afterwards; a change to
/// the dictionary set produces a new index (see [`crate::merge`]).
#[derive(Debug, Default, Clone)]
pub struct TrieIndex {
    root: TrieNode,
    punctuation: BTreeSet<char>,
    entry_count: usize,
}

impl TrieIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entries` to the node reached by `key`, creating nodes on the
    /// way. Existing values are never replaced. O(|key|).
    pub fn insert(&mut self, key: &str, entries: Vec<Entry>) {
        let mut node = &mut self.root;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default().as_mut();
        }
        self.entry_count += entries.len();
        node.values.extend(entries);
    }

    /// Walk `prefix` literally and return the node it ends at. No descendant
    /// traversal happens here. O(|prefix|).
    pub fn lookup_node(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            node = node.child(ch)?;
        }
        Some(node)
    }

    /// Entries stored exactly at `key`.
    pub fn exact(&self, key: &str) -> &[Entry] {
        self.lookup_node(key).map(TrieNode::values).unwrap_or(&[])
    }

    pub fn register_punctuation(&mut self, symbol: char) {
        self.punctuation.insert(symbol);
    }

    pub fn is_punctuation(&self, ch: char) -> bool {
        self.punctuation.contains(&ch)
    }

    pub fn punctuation(&self) -> &BTreeSet<char> {
        &self.punctuation
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}
