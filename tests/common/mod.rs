#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;

/// Builds fixture repositories commit by commit through libgit2
pub struct RepoBuilder {
    pub repo: Repository,
    clock: i64,
}

impl RepoBuilder {
    pub fn init(path: &Path) -> Self {
        std::fs::create_dir_all(path).unwrap();
        let repo = Repository::init(path).unwrap();
        Self {
            repo,
            clock: 1_700_000_000,
        }
    }

    fn workdir(&self) -> &Path {
        self.repo.workdir().unwrap()
    }

    pub fn write(&mut self, file: &str, content: &str) -> &mut Self {
        let path = self.workdir().join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        self
    }

    pub fn remove(&mut self, file: &str) -> &mut Self {
        std::fs::remove_file(self.workdir().join(file)).unwrap();
        let mut index = self.repo.index().unwrap();
        index.remove_path(Path::new(file)).unwrap();
        index.write().unwrap();
        self
    }

    /// Commits the index on top of HEAD
    pub fn commit(&mut self, author: &str, message: &str) -> Oid {
        let parents: Vec<Oid> = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .into_iter()
            .collect();
        self.commit_with_parents(author, message, &parents, Some("HEAD"))
    }

    pub fn commit_with_parents(
        &mut self,
        author: &str,
        message: &str,
        parents: &[Oid],
        update_ref: Option<&str>,
    ) -> Oid {
        self.clock += 60;
        let sig = Signature::new(author, "dev@example.com", &Time::new(self.clock, 0)).unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parents: Vec<_> = parents
            .iter()
            .map(|id| self.repo.find_commit(*id).unwrap())
            .collect();
        let parent_refs: Vec<_> = parents.iter().collect();
        self.repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    pub fn add_remote(&mut self, name: &str, url: &str) -> &mut Self {
        self.repo.remote(name, url).unwrap();
        self
    }
}

/// A linear history of `n` commits, each touching its own file
pub fn linear_repo(path: &Path, n: usize) -> Vec<Oid> {
    let mut builder = RepoBuilder::init(path);
    (0..n)
        .map(|i| {
            builder.write(&format!("file{i}.txt"), &format!("content {i}\n"));
            builder.commit("Ada Lovelace", &format!("Change number {i}\n\nDetails for {i}\n"))
        })
        .collect()
}

pub fn git_available() -> bool {
    which::which("git").is_ok()
}
