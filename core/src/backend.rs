//! Optional accelerated search path.
//!
//! A [`SearchBackend`] answers the same question as the trie walk in
//! [`crate::ranking::collect_from_trie`]. It is best-effort: when it errors or
//! returns hits that could not have come from the variant, the engine logs a
//! warning and uses the trie for that lookup only.
use crate::entry::Entry;
use crate::error::{Error, Result};

/// One hit from a backend: the full key path and the entry stored there.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendHit {
    pub path: String,
    pub entry: Entry,
}

pub trait SearchBackend: Send + Sync {
    /// Hits for `variant`. With `exact_only`, only entries stored at
    /// `variant` itself; otherwise the variant's whole subtree, at most
    /// `limit` hits.
    fn search(&self, variant: &str, exact_only: bool, limit: usize) -> Result<Vec<BackendHit>>;

    fn name(&self) -> &str {
        "backend"
    }
}

/// Reject responses that could not be a valid answer for `variant`.
pub fn validate_hits(variant: &str, exact_only: bool, hits: &[BackendHit]) -> Result<()> {
    for hit in hits {
        if hit.entry.surface.trim().is_empty() {
            return Err(Error::Backend(format!("empty surface under '{}'", hit.path)));
        }
        let ok = if exact_only {
            hit.path == variant
        } else {
            hit.path.starts_with(variant)
        };
        if !ok {
            return Err(Error::Backend(format!(
                "hit path '{}' does not match variant '{}'",
                hit.path, variant
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Lexeme;

    fn hit(path: &str, surface: &str) -> BackendHit {
        BackendHit {
            path: path.to_string(),
            entry: Lexeme::new(surface, None).tag(0),
        }
    }

    #[test]
    fn validation() {
        assert!(validate_hits("ni", false, &[hit("ni", "你"), hit("nihao", "你好")]).is_ok());
        assert!(validate_hits("ni", true, &[hit("nihao", "你好")]).is_err());
        assert!(validate_hits("ni", false, &[hit("hao", "好")]).is_err());
        assert!(validate_hits("ni", false, &[hit("ni", " ")]).is_err());
    }
}
