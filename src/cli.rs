// src/cli.rs

use crate::config::{self, BackendKind, ExtractConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Structured git data extractor", long_about = None)]
pub struct Args {
    /// Directory containing one cloned git repository per subdirectory
    #[arg(short, long, default_value = config::DEFAULT_REPOS_DIR)]
    pub repos_dir: PathBuf,

    /// Directory where one `<repo>.jsonl` file per repository is written
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Maximum number of commits to extract from each repository
    #[arg(
        short,
        long,
        allow_negative_numbers = true,
        default_value_t = config::DEFAULT_MAX_COMMITS as i64
    )]
    pub max_commits: i64,

    /// Byte threshold above which commit diffs are truncated
    #[arg(short = 'd', long, default_value_t = config::DEFAULT_MAX_DIFF_SIZE)]
    pub max_diff_size: usize,

    /// Byte threshold above which CONTRIBUTING/style guide content is truncated
    #[arg(short = 'c', long, default_value_t = config::DEFAULT_MAX_CONTRIB_SIZE)]
    pub max_contrib_size: usize,

    /// Number of repositories processed concurrently
    #[arg(short, long, default_value_t = config::DEFAULT_THREADS)]
    pub threads: usize,

    /// Skip commits whose author name looks like a bot
    #[arg(short = 'b', long)]
    pub skip_bot_commits: bool,

    /// Include the repository's remote fetch URL in every entry
    #[arg(short = 's', long)]
    pub mark_source: bool,

    /// Detect the project license with the `licensee` command-line tool
    #[arg(long)]
    pub include_license: bool,

    /// Seconds to wait for the license classifier before giving up
    #[arg(long, default_value_t = config::DEFAULT_LICENSE_TIMEOUT_SECS)]
    pub license_timeout: u64,

    /// How repositories are read
    #[arg(long, value_enum, default_value_t = BackendKind::Native)]
    pub backend: BackendKind,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn to_config(&self) -> ExtractConfig {
        ExtractConfig {
            repos_dir: self.repos_dir.clone(),
            output_dir: self.output_dir.clone(),
            max_commits: self.max_commits.clamp(1, config::MAX_COMMITS_CEILING as i64) as usize,
            max_diff_size: self.max_diff_size,
            max_contrib_size: self.max_contrib_size,
            threads: self.threads,
            skip_bot_commits: self.skip_bot_commits,
            mark_source: self.mark_source,
            include_license: self.include_license,
            license_timeout: Duration::from_secs(self.license_timeout),
            backend: self.backend,
        }
        .normalized()
    }
}
