//! IME engine with session management and key event processing.
//!
//! `ImeEngine` wraps the lookup [`Engine`] with an [`ImeSession`] and maps
//! key events onto session commands. After every call the host reads
//! [`ImeContext::render`] and consumes [`ImeContext::commit_text`].

use std::sync::Arc;

use tracing::debug;

use crate::candidate::Candidate;
use crate::context::{ImeContext, RenderState};
use crate::engine::Engine;
use crate::loader::RebuildOutcome;
use crate::ranking::apply_mode;
use crate::segment::{segment, Segment};
use crate::session::{ImeSession, InputMode};
use crate::trie::TrieIndex;

/// Key events the IME can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// Printable character.
    Char(char),
    Backspace,
    /// Select the first candidate.
    Space,
    /// Commit the raw buffer as typed.
    Enter,
    /// Clear the buffer.
    Escape,
    /// Select on the current page; 1-9, with 0 meaning the tenth.
    Number(u8),
    PageUp,
    PageDown,
    /// Toggle the gloss filter.
    Shift,
    /// In a filter mode, commit the first candidate's gloss. Hosts send this
    /// for a second Shift shortly after the one that entered the mode.
    CommitGloss,
    /// Toggle translate mode.
    Tab,
    /// Commit the raw buffer followed by a tab character.
    ShiftTab,
    /// Advance through the mode cycle.
    ModeCycle,
    /// Enter or leave passthrough.
    ShiftLock,
}

/// Result of processing a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    /// Key was handled by the IME
    Handled,
    /// Key was not handled (pass through to application)
    NotHandled,
}

pub struct ImeEngine {
    engine: Engine,
    session: ImeSession,
    context: ImeContext,
}

impl ImeEngine {
    pub fn new(engine: Engine, page_size: usize) -> Self {
        Self {
            engine,
            session: ImeSession::with_page_size(page_size),
            context: ImeContext::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn session(&self) -> &ImeSession {
        &self.session
    }

    pub fn context(&self) -> &ImeContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ImeContext {
        &mut self.context
    }

    pub fn render(&self) -> &RenderState {
        &self.context.render
    }

    pub fn take_commit(&mut self) -> String {
        self.context.take_commit()
    }

    /// Swap in a new index and re-rank the current buffer. The page is kept
    /// if it still exists.
    pub fn install_index(&mut self, index: Arc<TrieIndex>) {
        self.engine.install_index(index);
        self.refresh(false);
    }

    /// Install a finished rebuild and pass its warnings on to the host.
    pub fn apply_rebuild(&mut self, outcome: RebuildOutcome) {
        self.context
            .warnings
            .extend(outcome.warnings.iter().map(ToString::to_string));
        self.install_index(outcome.index);
    }

    /// Process a key event and update IME state.
    ///
    /// Returns `KeyResult::NotHandled` if the key should go to the
    /// application instead.
    pub fn process_key(&mut self, key: KeyEvent) -> KeyResult {
        if key == KeyEvent::ShiftLock {
            let on = self.session.mode() != InputMode::Passthrough;
            self.session.set_passthrough(on);
            self.sync();
            return KeyResult::Handled;
        }
        if self.session.mode() == InputMode::Passthrough {
            return KeyResult::NotHandled;
        }

        let active = self.session.is_active();
        match key {
            KeyEvent::Char(' ') => self.process_key(KeyEvent::Space),
            KeyEvent::Char(ch) if ch.is_control() => KeyResult::NotHandled,
            KeyEvent::Char(ch) if active && ch.is_ascii_digit() => {
                self.process_key(KeyEvent::Number(ch as u8 - b'0'))
            }
            KeyEvent::Char('=') if active => self.process_key(KeyEvent::PageDown),
            KeyEvent::Char('-') if active => self.process_key(KeyEvent::PageUp),
            KeyEvent::Char(ch) if active && self.session.mode().is_filter() && ch.is_ascii_alphabetic() => {
                self.session.push_filter(ch);
                self.refresh(true);
                KeyResult::Handled
            }
            KeyEvent::Char(ch) => {
                if !active && ch.is_ascii_digit() {
                    return KeyResult::NotHandled;
                }
                self.session.push_char(ch);
                self.refresh(true);
                KeyResult::Handled
            }
            _ if !active => KeyResult::NotHandled,
            KeyEvent::Backspace => {
                if self.session.mode().is_filter() {
                    self.session.pop_filter();
                } else {
                    self.session.pop_char();
                    if !self.session.is_active() {
                        self.session.clear();
                    }
                }
                self.refresh(true);
                KeyResult::Handled
            }
            KeyEvent::Space => {
                if let Some(first) = self.session.candidates().first().cloned() {
                    self.commit_candidate(&first);
                }
                KeyResult::Handled
            }
            KeyEvent::Number(n) => {
                self.select(if n == 0 { 9 } else { usize::from(n) - 1 });
                KeyResult::Handled
            }
            KeyEvent::Enter => {
                let literal = self.session.buffer().to_string();
                self.context.commit_text.push_str(&literal);
                self.session.clear();
                self.sync();
                KeyResult::Handled
            }
            KeyEvent::Escape => {
                self.clear();
                KeyResult::Handled
            }
            KeyEvent::PageUp => {
                self.prev_page();
                KeyResult::Handled
            }
            KeyEvent::PageDown => {
                self.next_page();
                KeyResult::Handled
            }
            KeyEvent::Shift => {
                self.toggle_filter();
                KeyResult::Handled
            }
            KeyEvent::CommitGloss => {
                if self.session.mode().is_filter() {
                    self.commit_first_gloss();
                } else {
                    self.toggle_filter();
                }
                KeyResult::Handled
            }
            KeyEvent::Tab => {
                self.toggle_translate();
                KeyResult::Handled
            }
            KeyEvent::ShiftTab => {
                let literal = format!("{}\t", self.session.buffer());
                self.context.commit_text.push_str(&literal);
                self.session.clear();
                self.sync();
                KeyResult::Handled
            }
            KeyEvent::ModeCycle => {
                self.cycle_mode();
                KeyResult::Handled
            }
            KeyEvent::ShiftLock => KeyResult::Handled,
        }
    }

    /// Feed every character of `text` as a key.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.process_key(KeyEvent::Char(ch));
        }
    }

    /// Replace the whole buffer (e.g. after a host-side edit).
    pub fn set_buffer(&mut self, text: &str) {
        if text.is_empty() {
            self.clear();
            return;
        }
        self.session.set_buffer(text);
        self.refresh(true);
    }

    pub fn toggle_filter(&mut self) -> bool {
        let changed = self.session.toggle_filter();
        if changed {
            self.refresh(true);
        }
        changed
    }

    pub fn toggle_translate(&mut self) -> bool {
        let changed = self.session.toggle_translate();
        if changed {
            self.refresh(true);
        }
        changed
    }

    pub fn cycle_mode(&mut self) -> bool {
        let changed = self.session.cycle_mode();
        if changed {
            self.refresh(true);
        }
        changed
    }

    /// No-op (returning false) past the last page.
    pub fn next_page(&mut self) -> bool {
        let moved = self.session.page_down();
        self.sync();
        moved
    }

    pub fn prev_page(&mut self) -> bool {
        let moved = self.session.page_up();
        self.sync();
        moved
    }

    /// Commit the candidate at `page_index` on the current page.
    pub fn select(&mut self, page_index: usize) -> bool {
        match self.session.candidates().select_by_index(page_index).cloned() {
            Some(c) => {
                self.commit_candidate(&c);
                true
            }
            None => false,
        }
    }

    /// Append `preceding + text` to the committed output, record usage for
    /// the active segment and return to `Normal` with an empty buffer.
    pub fn commit(&mut self, text: &str) {
        let seg = self.session.segment().clone();
        self.finish_commit(&seg, text, text);
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.sync();
    }

    fn commit_candidate(&mut self, candidate: &Candidate) {
        let seg = self.session.segment().clone();
        let text = candidate.commit_text(self.session.mode().is_translate()).to_string();
        self.finish_commit(&seg, &candidate.surface, &text);
    }

    /// Commit the gloss of the first candidate. Without a gloss nothing is
    /// committed and the host gets a warning instead.
    fn commit_first_gloss(&mut self) {
        let Some(first) = self.session.candidates().first().cloned() else {
            return;
        };
        match first.gloss.as_deref() {
            Some(gloss) => {
                let seg = self.session.segment().clone();
                self.finish_commit(&seg, &first.surface, gloss);
            }
            None => self
                .context
                .warnings
                .push(format!("'{}' has no English gloss", first.surface)),
        }
    }

    fn finish_commit(&mut self, seg: &Segment, surface: &str, text: &str) {
        debug!(segment = %seg.active, surface, "commit");
        self.engine.commit(&seg.active, surface);
        self.context.commit_text.push_str(&seg.preceding);
        self.context.commit_text.push_str(text);
        self.session.clear();
        self.sync();
    }

    /// Re-run segmentation, lookup and mode filtering for the current
    /// buffer. A filter that narrows the list to exactly one candidate
    /// commits it.
    fn refresh(&mut self, reset_page: bool) {
        if !self.session.is_active() {
            self.session.clear();
            self.sync();
            return;
        }
        let engine = &self.engine;
        let seg = segment(self.session.buffer(), |c| engine.is_punctuation(c));
        let ranked = self.engine.lookup(&seg.active);
        let mode = self.session.mode();
        let display = apply_mode(ranked, mode, self.session.filter());

        if mode.is_filter() && !self.session.filter().is_empty() && display.len() == 1 {
            self.session.show(seg, display, true);
            if let Some(only) = self.session.candidates().first().cloned() {
                self.commit_candidate(&only);
            }
            return;
        }

        self.session.show(seg, display, reset_page);
        self.sync();
    }

    fn sync(&mut self) {
        self.context.render = RenderState::from_session(&self.session);
    }
}
