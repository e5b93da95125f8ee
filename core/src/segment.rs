//! Splitting the edit buffer into the token being typed and the text before
//! it.
//!
//! This runs on every keystroke and is pure: the same buffer and punctuation
//! set always give the same split, and `preceding + active` is always the
//! buffer itself.

/// The buffer split produced by [`segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// The token currently being typed.
    pub active: String,
    /// Everything before `active`, separators included.
    pub preceding: String,
}

impl Segment {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Characters that can appear in a romanized key: ASCII letters plus the
/// apostrophe used as a syllable boundary.
pub fn is_romanization_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '\''
}

pub fn is_romanization(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_romanization_char)
}

/// Derive the active segment from `buffer`.
///
/// - With whitespace present, the active segment is the trailing
///   non-whitespace token, so a multi-token phrase can be reviewed token by
///   token. A buffer ending in whitespace has an empty active segment.
/// - Otherwise it is the maximal trailing run of romanization characters.
/// - Failing that, a trailing registered punctuation symbol on its own.
/// - Otherwise empty.
///
/// ```
/// use webime_core::segment::segment;
///
/// let s = segment("ni hao", |_| false);
/// assert_eq!(s.active, "hao");
/// assert_eq!(s.preceding, "ni ");
/// ```
pub fn segment<F>(buffer: &str, is_punctuation: F) -> Segment
where
    F: Fn(char) -> bool,
{
    if buffer.chars().any(char::is_whitespace) {
        return split_at_trailing_run(buffer, |c| !c.is_whitespace());
    }

    let split = split_at_trailing_run(buffer, is_romanization_char);
    if !split.active.is_empty() {
        return split;
    }

    if let Some((idx, last)) = buffer.char_indices().next_back() {
        if is_punctuation(last) {
            return Segment {
                active: buffer[idx..].to_string(),
                preceding: buffer[..idx].to_string(),
            };
        }
    }

    Segment {
        active: String::new(),
        preceding: buffer.to_string(),
    }
}

fn split_at_trailing_run<F>(buffer: &str, keep: F) -> Segment
where
    F: Fn(char) -> bool,
{
    let start = buffer
        .char_indices()
        .rev()
        .take_while(|(_, c)| keep(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(buffer.len());
    Segment {
        active: buffer[start..].to_string(),
        preceding: buffer[..start].to_string(),
    }
}
