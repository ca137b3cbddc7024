use crate::report::ReportPayload;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

const PAGE: usize = 10;

#[derive(Debug, Clone)]
pub struct ProgressViewState {
    pub source_url: String,
    pub started: Instant,
    pub spinner_frame: u8,
}

impl ProgressViewState {
    pub fn new(source_url: &str) -> Self {
        Self {
            source_url: source_url.to_string(),
            started: Instant::now(),
            spinner_frame: 0,
        }
    }

    pub fn elapsed(&self) -> String {
        let secs = self.started.elapsed().as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportAction {
    None,
    Rerun,
    Close,
}

#[derive(Debug, Clone)]
pub struct ReportViewState {
    pub payload: ReportPayload,
    pub scroll_offset: usize,
}

impl ReportViewState {
    pub fn new(payload: ReportPayload) -> Self {
        Self {
            payload,
            scroll_offset: 0,
        }
    }

    fn max_offset(&self) -> usize {
        self.payload.rows.len().saturating_sub(1)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ReportAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ReportAction::Close;
        }
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_offset = (self.scroll_offset + 1).min(self.max_offset());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::PageDown => {
                self.scroll_offset = (self.scroll_offset + PAGE).min(self.max_offset());
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(PAGE);
            }
            KeyCode::Char('g') => self.scroll_offset = 0,
            KeyCode::Char('G') => self.scroll_offset = self.max_offset(),
            KeyCode::Char('r') => return ReportAction::Rerun,
            KeyCode::Char('q') | KeyCode::Esc => return ReportAction::Close,
            _ => {}
        }
        ReportAction::None
    }
}
