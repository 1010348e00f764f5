// src/model.rs

use serde::Serialize;
use std::path::{Path, PathBuf};

/// A candidate repository directory under the base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub path: PathBuf,
    /// Last path segment, used to name the output file
    pub name: String,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn output_file(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.jsonl", self.name))
    }
}

/// One commit as reported by a backend, before any filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    /// Subject plus optional body
    pub message: String,
    pub parents: Vec<String>,
    /// Committer time in seconds since the epoch
    pub timestamp: i64,
}

impl CommitRecord {
    /// First line of the message, trimmed
    pub fn subject(&self) -> &str {
        self.message.trim().lines().next().unwrap_or("").trim()
    }

    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map_or(self.hash.len(), |(i, _)| i);
        &self.hash[..end]
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Repository-level metadata shared by every sample of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetadata {
    pub license: String,
    pub repo_source: Option<String>,
    pub code_style: String,
}

impl Default for RepoMetadata {
    fn default() -> Self {
        Self {
            license: LICENSE_UNKNOWN.to_string(),
            repo_source: None,
            code_style: String::new(),
        }
    }
}

pub const LICENSE_UNKNOWN: &str = "Unknown";
pub const LICENSE_NONE: &str = "No License";

/// One line of a `<repo>.jsonl` output file
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExtractedSample<'a> {
    pub commit_msg: String,
    pub change: String,
    pub recent_commits_message: String,
    pub license: &'a str,
    pub code_style: &'a str,
    pub affected_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_source: Option<&'a str>,
}
