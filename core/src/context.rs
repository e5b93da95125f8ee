//! Data handed to the host after each key.
//!
//! `ImeContext` is plain data: the host reads the render state and consumes
//! `commit_text` after calling `process_key()`. No callbacks run from inside
//! the engine.

use crate::candidate::Candidate;
use crate::session::{ImeSession, InputMode};

/// What a renderer needs to draw the current cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub active_segment: String,
    pub preceding: String,
    /// Candidates on the current page.
    pub page: Vec<Candidate>,
    /// 0-based.
    pub page_index: usize,
    pub total_pages: usize,
    pub mode: InputMode,
    pub filter: String,
}

impl RenderState {
    pub fn from_session(session: &ImeSession) -> Self {
        let list = session.candidates();
        Self {
            active_segment: session.segment().active.clone(),
            preceding: session.segment().preceding.clone(),
            page: list.current_page_candidates().to_vec(),
            page_index: list.current_page(),
            total_pages: list.num_pages(),
            mode: session.mode(),
            filter: session.filter().to_string(),
        }
    }

    /// "2 / 5" style indicator, empty when there is nothing to page.
    pub fn page_label(&self) -> String {
        if self.total_pages == 0 {
            String::new()
        } else {
            format!("{} / {}", self.page_index + 1, self.total_pages)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImeContext {
    pub render: RenderState,
    /// Text committed since the host last took it.
    pub commit_text: String,
    /// Warnings from the last dictionary rebuild, for the host to show.
    pub warnings: Vec<String>,
}

impl ImeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the commit text, leaving it empty.
    pub fn take_commit(&mut self) -> String {
        std::mem::take(&mut self.commit_text)
    }

    pub fn has_commit(&self) -> bool {
        !self.commit_text.is_empty()
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    pub fn has_visible_state(&self) -> bool {
        !self.render.active_segment.is_empty()
            || !self.render.preceding.is_empty()
            || !self.render.page.is_empty()
    }
}
