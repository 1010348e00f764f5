// src/backend/mod.rs

//! Read-only access to a git repository.
//!
//! Two interchangeable implementations exist: [`CliBackend`] drives the `git`
//! executable and [`NativeBackend`] reads the object store through libgit2.
//! Both must report the same history, diffs and file sets for the same
//! repository state.

mod cli_git;
mod native;

pub use cli_git::CliBackend;
pub use native::NativeBackend;

use crate::config::BackendKind;
use crate::error::{BackendError, BackendResult};
use crate::model::CommitRecord;
use std::path::Path;

/// Opens repositories; shared by every worker of a run
pub trait GitBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails with [`BackendError::NotARepository`] when `path` has no git store
    fn open(&self, path: &Path) -> BackendResult<Box<dyn RepoHandle>>;
}

/// An opened repository, owned by a single worker
pub trait RepoHandle {
    fn path(&self) -> &Path;

    /// Fetch URL of the first remote that has one
    fn remote_url(&self) -> Option<String>;

    /// Up to `limit` non-merge commits reachable from HEAD, newest first
    fn walk_history(&self, limit: usize) -> BackendResult<Vec<CommitRecord>>;

    /// Patch text against the first parent (or the empty tree) and every touched path.
    ///
    /// Per-file patches stop being collected once their running length exceeds
    /// `byte_budget`; the path list is always complete and sorted.
    fn diff_and_files(
        &self,
        commit: &CommitRecord,
        byte_budget: usize,
    ) -> BackendResult<(String, Vec<String>)>;
}

pub fn backend_for(kind: BackendKind) -> Box<dyn GitBackend> {
    match kind {
        BackendKind::Cli => Box::new(CliBackend::new()),
        BackendKind::Native => Box::new(NativeBackend),
    }
}

/// True when `path` carries a `.git` directory
pub fn has_git_store(path: &Path) -> bool {
    path.join(".git").is_dir()
}

fn ensure_git_store(path: &Path) -> BackendResult<()> {
    if has_git_store(path) {
        Ok(())
    } else {
        Err(BackendError::NotARepository(path.to_path_buf()))
    }
}
