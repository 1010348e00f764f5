// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REPOS_DIR: &str = "repos";
pub const DEFAULT_OUTPUT_DIR: &str = "commit_data";
pub const DEFAULT_MAX_COMMITS: usize = 1000;
pub const DEFAULT_MAX_DIFF_SIZE: usize = 50_000;
pub const DEFAULT_MAX_CONTRIB_SIZE: usize = 10_000;
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_LICENSE_TIMEOUT_SECS: u64 = 60;

/// Extra commits walked past `max_commits` so the oldest candidates still get a full window
pub const HISTORY_LOOKAHEAD: usize = 5;

/// Largest accepted `max_commits`, leaving room for the lookahead
pub const MAX_COMMITS_CEILING: usize = i32::MAX as usize - HISTORY_LOOKAHEAD;

/// Which implementation of the git backend to use
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Spawn the `git` executable
    Cli,
    /// Read the repository in-process through libgit2
    #[default]
    Native,
}

/// Settings for one extraction run, built once at startup
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub repos_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_commits: usize,
    pub max_diff_size: usize,
    pub max_contrib_size: usize,
    pub threads: usize,
    pub skip_bot_commits: bool,
    pub mark_source: bool,
    pub include_license: bool,
    pub license_timeout: Duration,
    pub backend: BackendKind,
}

impl ExtractConfig {
    /// Number of history entries to request from the backend
    pub fn walk_limit(&self) -> usize {
        self.max_commits + HISTORY_LOOKAHEAD
    }

    /// Clamps numeric settings into their valid ranges
    pub fn normalized(mut self) -> Self {
        self.max_commits = self.max_commits.clamp(1, MAX_COMMITS_CEILING);
        self.threads = self.threads.max(1);
        self
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            repos_dir: PathBuf::from(DEFAULT_REPOS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_commits: DEFAULT_MAX_COMMITS,
            max_diff_size: DEFAULT_MAX_DIFF_SIZE,
            max_contrib_size: DEFAULT_MAX_CONTRIB_SIZE,
            threads: DEFAULT_THREADS,
            skip_bot_commits: false,
            mark_source: false,
            include_license: false,
            license_timeout: Duration::from_secs(DEFAULT_LICENSE_TIMEOUT_SECS),
            backend: BackendKind::default(),
        }
    }
}
