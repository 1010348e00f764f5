// src/extract.rs

use crate::backend::GitBackend;
use crate::config::ExtractConfig;
use crate::diff;
use crate::error::{BackendError, UnitError};
use crate::filter::CommitFilter;
use crate::metadata::{LicenseClassifier, MetadataResolver};
use crate::model::{CommitRecord, ExtractedSample, Repository};
use crate::sanitize::sanitize;
use crate::window::HistoryLines;
use chrono::TimeZone;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Result of extracting one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Extracted { name: String, count: usize },
    Skipped { path: String, reason: String },
    Failed { name: String, reason: String },
    Critical { name: String, reason: String },
}

impl UnitOutcome {
    pub fn from_result(repo: &Repository, result: Result<usize, UnitError>) -> Self {
        match result {
            Ok(count) => UnitOutcome::Extracted {
                name: repo.name.clone(),
                count,
            },
            Err(UnitError::Skipped(reason)) => UnitOutcome::Skipped {
                path: repo.path.display().to_string(),
                reason,
            },
            Err(e) => UnitOutcome::Failed {
                name: repo.name.clone(),
                reason: e.to_string(),
            },
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitOutcome::Extracted { name, count } => {
                write!(f, "Extracted {count} commits from {name}")
            }
            UnitOutcome::Skipped { path, reason } => write!(f, "Skipped: {path} ({reason})"),
            UnitOutcome::Failed { name, reason } => write!(f, "Error in {name}: {reason}"),
            UnitOutcome::Critical { name, reason } => {
                write!(f, "Critical failure in {name}: {reason}")
            }
        }
    }
}

/// Extracts every accepted commit of one repository into `<name>.jsonl`.
///
/// Returns the number of samples written. A commit whose diff cannot be read is
/// logged and skipped; failing to open the repository, list its history or write
/// the output file ends the unit.
pub fn extract_repository(
    repo: &Repository,
    config: &ExtractConfig,
    backend: &dyn GitBackend,
    classifier: Option<&dyn LicenseClassifier>,
) -> Result<usize, UnitError> {
    let handle = backend.open(&repo.path).map_err(|e| match e {
        BackendError::NotARepository(_) => UnitError::Skipped("no .git folder".to_string()),
        e => UnitError::Backend(e),
    })?;

    let metadata = MetadataResolver {
        classifier,
        max_contrib_size: config.max_contrib_size,
    }
    .resolve(handle.as_ref());
    let repo_source = if config.mark_source {
        metadata.repo_source.as_deref()
    } else {
        None
    };

    let commits = handle.walk_history(config.walk_limit())?;
    log_history_span(repo, &commits);
    let history = HistoryLines::from_commits(&commits);
    let filter = CommitFilter::new(config.skip_bot_commits);

    let output_path = repo.output_file(&config.output_dir);
    let mut writer = BufWriter::new(File::create(&output_path)?);

    let mut count = 0;
    for (i, commit) in commits.iter().enumerate().take(config.max_commits) {
        if !filter.accept(commit) {
            tracing::trace!(repo = %repo.name, commit = %commit.short_hash(), "filtered");
            continue;
        }

        let diff = match diff::extract(handle.as_ref(), commit, config.max_diff_size) {
            Ok(diff) => diff,
            Err(e) => {
                tracing::warn!(
                    repo = %repo.name,
                    commit = %commit.short_hash(),
                    error = %e,
                    "skipping commit"
                );
                continue;
            }
        };

        let sample = ExtractedSample {
            commit_msg: sanitize(&commit.message),
            change: diff.text,
            recent_commits_message: history.recent_context(i),
            license: &metadata.license,
            code_style: &metadata.code_style,
            affected_files: diff.files,
            repo_source,
        };
        serde_json::to_writer(&mut writer, &sample).map_err(io::Error::from)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;

    tracing::debug!(
        repo = %repo.name,
        samples = count,
        output = %output_path.display(),
        "repository done"
    );
    Ok(count)
}

fn log_history_span(repo: &Repository, commits: &[CommitRecord]) {
    let (Some(newest), Some(oldest)) = (commits.first(), commits.last()) else {
        tracing::debug!(repo = %repo.name, "no commits walked");
        return;
    };
    let fmt_time = |ts: i64| {
        chrono::Utc
            .timestamp_opt(ts, 0)
            .single()
            .map_or_else(|| ts.to_string(), |t| t.to_rfc2822())
    };
    tracing::debug!(
        repo = %repo.name,
        commits = commits.len(),
        "history spans from {} to {}",
        fmt_time(oldest.timestamp),
        fmt_time(newest.timestamp)
    );
}
