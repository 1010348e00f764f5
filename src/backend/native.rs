// src/backend/native.rs

use super::{ensure_git_store, GitBackend, RepoHandle};
use crate::diff::DiffAccumulator;
use crate::error::{BackendError, BackendResult};
use crate::model::CommitRecord;
use git2::{DiffOptions, ErrorCode, Oid, Patch, Repository, Sort};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Reads repositories in-process through libgit2
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl GitBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn open(&self, path: &Path) -> BackendResult<Box<dyn RepoHandle>> {
        ensure_git_store(path)?;
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => BackendError::NotARepository(path.to_path_buf()),
            _ => BackendError::Git(e),
        })?;
        Ok(Box::new(NativeHandle {
            repo,
            path: path.to_path_buf(),
        }))
    }
}

struct NativeHandle {
    repo: Repository,
    path: PathBuf,
}

impl RepoHandle for NativeHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn remote_url(&self) -> Option<String> {
        let names = match self.repo.remotes() {
            Ok(names) => names,
            Err(e) => {
                tracing::debug!(repo = %self.path.display(), error = %e, "could not list remotes");
                return None;
            }
        };
        names.iter().flatten().find_map(|name| {
            let remote = self.repo.find_remote(name).ok()?;
            remote
                .url()
                .filter(|url| !url.is_empty())
                .map(str::to_string)
        })
    }

    fn walk_history(&self, limit: usize) -> BackendResult<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            if commits.len() >= limit {
                break;
            }
            let commit = self.repo.find_commit(oid?)?;
            if commit.parent_count() > 1 {
                continue;
            }
            let author = commit.author();
            commits.push(CommitRecord {
                hash: commit.id().to_string(),
                author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
                timestamp: commit.time().seconds(),
            });
        }
        Ok(commits)
    }

    fn diff_and_files(
        &self,
        commit: &CommitRecord,
        byte_budget: usize,
    ) -> BackendResult<(String, Vec<String>)> {
        let commit = self.repo.find_commit(Oid::from_str(&commit.hash)?)?;
        let current_tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.include_untracked(false).context_lines(3);
        let diff = self.repo.diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&current_tree),
            Some(&mut diff_opts),
        )?;

        let mut files = BTreeSet::new();
        for delta in diff.deltas() {
            for path in [delta.old_file().path(), delta.new_file().path()]
                .into_iter()
                .flatten()
            {
                files.insert(path.to_string_lossy().into_owned());
            }
        }

        let mut acc = DiffAccumulator::new(byte_budget);
        for idx in 0..diff.deltas().len() {
            let Some(mut patch) = Patch::from_diff(&diff, idx)? else {
                continue;
            };
            let buf = patch.to_buf()?;
            if !acc.push(&String::from_utf8_lossy(&buf)) {
                break;
            }
        }

        Ok((acc.into_text(), files.into_iter().collect()))
    }
}
