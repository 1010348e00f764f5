// src/window.rs

use crate::model::CommitRecord;

/// Number of preceding commits shown as recent history
pub const WINDOW_SIZE: usize = 5;

/// One-line summaries of a walked history, newest first
#[derive(Debug, Clone, Default)]
pub struct HistoryLines {
    lines: Vec<String>,
}

impl HistoryLines {
    /// Built from the unfiltered walk so the window reflects what actually happened
    pub fn from_commits(commits: &[CommitRecord]) -> Self {
        let lines = commits
            .iter()
            .map(|c| format!("{} {}", c.short_hash(), c.subject()))
            .collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Up to [`WINDOW_SIZE`] lines strictly older than position `index`
    pub fn window(&self, index: usize) -> &[String] {
        let start = (index + 1).min(self.lines.len());
        let end = (start + WINDOW_SIZE).min(self.lines.len());
        &self.lines[start..end]
    }

    /// The window joined with newlines, empty when there is no older history
    pub fn recent_context(&self, index: usize) -> String {
        self.window(index).join("\n")
    }
}
