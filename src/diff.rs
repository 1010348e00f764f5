// src/diff.rs

use crate::backend::RepoHandle;
use crate::error::BackendResult;
use crate::model::CommitRecord;

pub const TRUNCATION_MARKER: &str = "...TRUNCATED";

/// Cuts `text` to at most `budget` bytes on a char boundary and appends the marker.
///
/// Text that already carries the marker after a body within budget is returned as is.
pub fn truncate_with_marker(text: &str, budget: usize) -> String {
    if text.len() <= budget {
        return text.to_string();
    }
    if let Some(body) = text.strip_suffix(TRUNCATION_MARKER) {
        if body.len() <= budget {
            return text.to_string();
        }
    }

    let mut cut = budget;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
    out.push_str(&text[..cut]);
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Collects per-file patch fragments until the running length passes the budget
#[derive(Debug)]
pub struct DiffAccumulator {
    budget: usize,
    text: String,
    exhausted: bool,
}

impl DiffAccumulator {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            text: String::new(),
            exhausted: false,
        }
    }

    /// Appends one fragment; returns false once later fragments would be dropped
    pub fn push(&mut self, fragment: &str) -> bool {
        if self.exhausted {
            return false;
        }
        self.text.push_str(fragment);
        if self.text.len() > self.budget {
            self.exhausted = true;
        }
        !self.exhausted
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Diff text within budget plus the complete set of touched paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDiff {
    pub text: String,
    pub files: Vec<String>,
}

/// Reads a commit's diff through the backend and enforces the byte budget
pub fn extract(
    handle: &dyn RepoHandle,
    commit: &CommitRecord,
    budget: usize,
) -> BackendResult<ExtractedDiff> {
    let (raw, files) = handle.diff_and_files(commit, budget)?;
    let text = truncate_with_marker(&raw, budget);
    if text.len() != raw.len() {
        tracing::debug!(commit = %commit.short_hash(), raw_len = raw.len(), "truncated diff");
    }
    Ok(ExtractedDiff { text, files })
}
