// src/backend/cli_git.rs

use super::{ensure_git_store, GitBackend, RepoHandle};
use crate::diff::DiffAccumulator;
use crate::error::{BackendError, BackendResult};
use crate::model::CommitRecord;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const FIELD_SEP: char = '\x1f';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%P%x1f%ct%x1f%B";

/// Reads repositories by spawning the `git` executable
#[derive(Debug, Clone)]
pub struct CliBackend {
    program: PathBuf,
}

impl CliBackend {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GitBackend for CliBackend {
    fn name(&self) -> &'static str {
        "cli"
    }

    fn open(&self, path: &Path) -> BackendResult<Box<dyn RepoHandle>> {
        ensure_git_store(path)?;
        let handle = CliHandle {
            program: self.program.clone(),
            path: path.to_path_buf(),
        };
        match handle.git(&["rev-parse", "--git-dir"]) {
            Ok(_) => Ok(Box::new(handle)),
            Err(BackendError::Command { .. }) => {
                Err(BackendError::NotARepository(path.to_path_buf()))
            }
            Err(e) => Err(e),
        }
    }
}

struct CliHandle {
    program: PathBuf,
    path: PathBuf,
}

impl CliHandle {
    /// Runs git against this repository's own store, never a parent's
    fn git(&self, args: &[&str]) -> BackendResult<String> {
        let output = Command::new(&self.program)
            .arg("--git-dir=.git")
            .args(args)
            .current_dir(&self.path)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(BackendError::Command {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RepoHandle for CliHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn remote_url(&self) -> Option<String> {
        match self.git(&["remote", "-v"]) {
            Ok(out) => parse_fetch_url(&out),
            Err(e) => {
                tracing::debug!(repo = %self.path.display(), error = %e, "could not list remotes");
                None
            }
        }
    }

    fn walk_history(&self, limit: usize) -> BackendResult<Vec<CommitRecord>> {
        let count = format!("-n{limit}");
        let out = self.git(&[
            "log",
            &count,
            "--no-merges",
            "--date-order",
            "-z",
            LOG_FORMAT,
        ])?;
        parse_log(&out)
    }

    fn diff_and_files(
        &self,
        commit: &CommitRecord,
        byte_budget: usize,
    ) -> BackendResult<(String, Vec<String>)> {
        let hash = commit.hash.as_str();
        let names = self.git(&[
            "diff-tree",
            "--no-commit-id",
            "-r",
            "--root",
            "--no-renames",
            "--name-status",
            "-z",
            hash,
        ])?;
        let files = parse_name_status(&names)?;

        let patch = self.git(&[
            "diff-tree",
            "-p",
            "--no-commit-id",
            "-r",
            "--root",
            "--no-renames",
            "--no-color",
            "--no-ext-diff",
            hash,
        ])?;
        let mut acc = DiffAccumulator::new(byte_budget);
        for fragment in split_patch(&patch) {
            if !acc.push(fragment) {
                break;
            }
        }

        Ok((acc.into_text(), files))
    }
}

fn parse_fetch_url(remote_v: &str) -> Option<String> {
    remote_v
        .lines()
        .filter(|line| line.contains("(fetch)"))
        .find_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
}

fn parse_log(out: &str) -> BackendResult<Vec<CommitRecord>> {
    let mut commits = Vec::new();
    for entry in out.split('\0') {
        if entry.trim().is_empty() {
            continue;
        }
        let mut fields = entry.splitn(5, FIELD_SEP);
        let (Some(hash), Some(author), Some(parents), Some(time), Some(message)) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(BackendError::Parse(format!(
                "truncated log entry: {:?}",
                entry.chars().take(60).collect::<String>()
            )));
        };
        let timestamp = time
            .trim()
            .parse::<i64>()
            .map_err(|e| BackendError::Parse(format!("bad commit time {time:?}: {e}")))?;
        commits.push(CommitRecord {
            hash: hash.trim().to_string(),
            author: author.to_string(),
            message: message.to_string(),
            parents: parents.split_whitespace().map(str::to_string).collect(),
            timestamp,
        });
    }
    Ok(commits)
}

/// Parses `--name-status -z` output, keeping both sides of renames and copies
fn parse_name_status(out: &str) -> BackendResult<Vec<String>> {
    let mut files = BTreeSet::new();
    let mut tokens = out.split('\0').filter(|t| !t.is_empty());
    while let Some(status) = tokens.next() {
        let paths = if status.starts_with('R') || status.starts_with('C') {
            2
        } else {
            1
        };
        for _ in 0..paths {
            let path = tokens.next().ok_or_else(|| {
                BackendError::Parse(format!("missing path after status {status}"))
            })?;
            files.insert(path.to_string());
        }
    }
    Ok(files.into_iter().collect())
}

/// Splits a multi-file patch into one fragment per `diff --git` header
fn split_patch(patch: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = patch
        .match_indices("\ndiff --git ")
        .map(|(i, _)| i + 1)
        .collect();
    if !patch.is_empty() {
        starts.insert(0, 0);
    }
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(patch.len());
            &patch[start..end]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_url_prefers_fetch_lines() {
        let out = "origin\tgit@example.com:a/b.git (push)\n\
                   origin\thttps://example.com/a/b.git (fetch)\n";
        assert_eq!(
            parse_fetch_url(out).as_deref(),
            Some("https://example.com/a/b.git")
        );
        assert_eq!(parse_fetch_url(""), None);
    }

    #[test]
    fn log_entries_are_parsed() {
        let out = format!(
            "{h1}\x1fAda\x1f{h2}\x1f1700000100\x1fAdd parser\n\nBody line\n\0\
             {h2}\x1fBob Builder\x1f\x1f1700000000\x1fInitial commit\n\0",
            h1 = "a".repeat(40),
            h2 = "b".repeat(40),
        );
        let commits = parse_log(&out).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].subject(), "Add parser");
        assert_eq!(commits[0].parents, vec!["b".repeat(40)]);
        assert_eq!(commits[1].author, "Bob Builder");
        assert!(commits[1].parents.is_empty());
        assert_eq!(commits[1].timestamp, 1_700_000_000);
    }

    #[test]
    fn malformed_log_entry_is_an_error() {
        assert!(matches!(
            parse_log("deadbeef\x1fAda\0"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn name_status_collects_both_rename_sides() {
        let out = "M\0src/lib.rs\0R087\0old.txt\0new.txt\0A\0a b.txt\0";
        assert_eq!(
            parse_name_status(out).unwrap(),
            vec!["a b.txt", "new.txt", "old.txt", "src/lib.rs"]
        );
    }

    #[test]
    fn patch_splits_per_file() {
        let patch = "diff --git a/x b/x\n+1\ndiff --git a/y b/y\n-2\n";
        assert_eq!(
            split_patch(patch),
            vec!["diff --git a/x b/x\n+1\n", "diff --git a/y b/y\n-2\n"]
        );
        assert!(split_patch("").is_empty());
    }
}
