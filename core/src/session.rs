//! IME session state.
//!
//! `ImeSession` owns everything that changes per keystroke: the edit buffer,
//! the input mode, the gloss filter text and the paginated candidate list.
//! It holds no dictionaries; [`crate::ime_engine::ImeEngine`] feeds it ranked
//! candidates after every change.

use crate::candidate::{Candidate, CandidateList};
use crate::segment::Segment;

/// How the buffer and ranked list are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputMode {
    /// Plain candidate lookup.
    #[default]
    Normal,
    /// Candidates narrowed by a typed gloss prefix.
    Filter,
    /// Candidates with a gloss first; selection inserts the gloss.
    Translate,
    FilterTranslate,
    /// Keys are not interpreted at all.
    Passthrough,
}

impl InputMode {
    pub fn is_filter(self) -> bool {
        matches!(self, InputMode::Filter | InputMode::FilterTranslate)
    }

    pub fn is_translate(self) -> bool {
        matches!(self, InputMode::Translate | InputMode::FilterTranslate)
    }

    /// Next mode in the fixed cycle
    /// `Normal -> Filter -> Translate -> FilterTranslate -> Normal`.
    pub fn next(self) -> Self {
        match self {
            InputMode::Normal => InputMode::Filter,
            InputMode::Filter => InputMode::Translate,
            InputMode::Translate => InputMode::FilterTranslate,
            InputMode::FilterTranslate => InputMode::Normal,
            InputMode::Passthrough => InputMode::Passthrough,
        }
    }

    /// Same translate setting, filter flipped.
    pub fn with_filter_toggled(self) -> Self {
        match self {
            InputMode::Normal => InputMode::Filter,
            InputMode::Filter => InputMode::Normal,
            InputMode::Translate => InputMode::FilterTranslate,
            InputMode::FilterTranslate => InputMode::Translate,
            InputMode::Passthrough => InputMode::Passthrough,
        }
    }

    /// Same filter setting, translate flipped.
    pub fn with_translate_toggled(self) -> Self {
        match self {
            InputMode::Normal => InputMode::Translate,
            InputMode::Translate => InputMode::Normal,
            InputMode::Filter => InputMode::FilterTranslate,
            InputMode::FilterTranslate => InputMode::Filter,
            InputMode::Passthrough => InputMode::Passthrough,
        }
    }

    /// Leave the filter part of the mode, if any.
    pub fn without_filter(self) -> Self {
        match self {
            InputMode::Filter => InputMode::Normal,
            InputMode::FilterTranslate => InputMode::Translate,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputMode::Normal => "normal",
            InputMode::Filter => "filter",
            InputMode::Translate => "translate",
            InputMode::FilterTranslate => "filter+translate",
            InputMode::Passthrough => "passthrough",
        }
    }
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-session state.
#[derive(Debug, Clone)]
pub struct ImeSession {
    buffer: String,
    mode: InputMode,
    filter: String,
    segment: Segment,
    candidates: CandidateList,
}

impl ImeSession {
    pub fn new() -> Self {
        Self::with_page_size(crate::candidate::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buffer: String::new(),
            mode: InputMode::Normal,
            filter: String::new(),
            segment: Segment::default(),
            candidates: CandidateList::with_page_size(page_size),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    pub fn is_active(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn push_char(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn pop_char(&mut self) -> Option<char> {
        self.buffer.pop()
    }

    pub fn set_buffer(&mut self, text: &str) {
        self.buffer = text.to_string();
    }

    pub fn push_filter(&mut self, ch: char) {
        self.filter.push(ch);
    }

    /// Remove the last filter char. With an empty filter, leave the filter
    /// part of the mode instead. Returns false if nothing changed.
    pub fn pop_filter(&mut self) -> bool {
        if self.filter.pop().is_some() {
            return true;
        }
        if self.mode.is_filter() {
            self.mode = self.mode.without_filter();
            return true;
        }
        false
    }

    /// Switch mode, resetting the filter text and page. Ignored with an empty
    /// buffer or in passthrough.
    fn switch_mode(&mut self, to: InputMode) -> bool {
        if self.buffer.is_empty() || self.mode == InputMode::Passthrough || to == self.mode {
            return false;
        }
        self.mode = to;
        self.filter.clear();
        self.candidates.reset();
        true
    }

    pub fn cycle_mode(&mut self) -> bool {
        self.switch_mode(self.mode.next())
    }

    pub fn toggle_filter(&mut self) -> bool {
        self.switch_mode(self.mode.with_filter_toggled())
    }

    pub fn toggle_translate(&mut self) -> bool {
        self.switch_mode(self.mode.with_translate_toggled())
    }

    /// Enter or leave passthrough. Leaving always lands in `Normal`.
    pub fn set_passthrough(&mut self, on: bool) {
        if on {
            self.clear();
            self.mode = InputMode::Passthrough;
        } else if self.mode == InputMode::Passthrough {
            self.mode = InputMode::Normal;
        }
    }

    /// Install a fresh display list for `segment`. The page resets when the
    /// active segment changed, otherwise it is clamped to the new page count.
    pub fn show(&mut self, segment: Segment, display: Vec<Candidate>, reset_page: bool) {
        let changed = segment.active != self.segment.active;
        self.segment = segment;
        if changed || reset_page {
            self.candidates.set_candidates(display);
        } else {
            self.candidates.refresh(display);
        }
    }

    pub fn page_up(&mut self) -> bool {
        self.candidates.page_up()
    }

    pub fn page_down(&mut self) -> bool {
        self.candidates.page_down()
    }

    /// Empty the buffer and return to `Normal` (unless in passthrough).
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.filter.clear();
        self.segment = Segment::default();
        self.candidates.clear();
        if self.mode != InputMode::Passthrough {
            self.mode = InputMode::Normal;
        }
    }
}

impl Default for ImeSession {
    fn default() -> Self {
        Self::new()
    }
}
