// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a git backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("`git {command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected git output: {0}")]
    Parse(String),
}

/// Failures of the external license classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier tool is not available: {0}")]
    ToolUnavailable(String),

    #[error("classifier IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("classifier did not finish within {0} seconds")]
    Timeout(u64),

    #[error("classifier produced malformed output: {0}")]
    MalformedOutput(String),
}

impl ClassifierError {
    /// Stable name embedded in the `Detection Failed: <kind>` sentinel
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::ToolUnavailable(_) => "ToolUnavailable",
            ClassifierError::Io(_) => "Io",
            ClassifierError::Timeout(_) => "Timeout",
            ClassifierError::MalformedOutput(_) => "MalformedOutput",
        }
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(e: serde_json::Error) -> Self {
        ClassifierError::MalformedOutput(e.to_string())
    }
}

/// Reasons a whole repository unit stops early
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("{0}")]
    Skipped(String),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("output file error: {0}")]
    Output(#[from] std::io::Error),
}

/// Fatal failures while discovering repositories
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("{0} does not exist")]
    MissingBaseDir(PathBuf),

    #[error("no valid git repositories found in {0}")]
    NoRepositories(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;
