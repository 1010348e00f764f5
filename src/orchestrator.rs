// src/orchestrator.rs

use crate::backend::{has_git_store, GitBackend};
use crate::config::ExtractConfig;
use crate::error::DiscoveryError;
use crate::extract::{extract_repository, UnitOutcome};
use crate::metadata::LicenseClassifier;
use crate::model::Repository;
use indicatif::{ProgressBar, ProgressStyle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Immediate subdirectories of `base` that look like git repositories
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub subdirectories: usize,
    pub repositories: Vec<Repository>,
}

pub fn discover_repositories(base: &Path) -> Result<Discovery, DiscoveryError> {
    if !base.exists() {
        return Err(DiscoveryError::MissingBaseDir(base.to_path_buf()));
    }
    let io_err = |source| DiscoveryError::Io {
        path: base.to_path_buf(),
        source,
    };

    let mut discovery = Discovery::default();
    for entry in std::fs::read_dir(base).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_dir() {
            continue;
        }
        discovery.subdirectories += 1;
        if has_git_store(&path) {
            discovery.repositories.push(Repository::new(path));
        }
    }
    discovery.repositories.sort_by(|a, b| a.path.cmp(&b.path));

    if discovery.repositories.is_empty() {
        return Err(DiscoveryError::NoRepositories(base.to_path_buf()));
    }
    Ok(discovery)
}

/// Totals over every unit of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub critical: usize,
    pub samples: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn record(&mut self, outcome: &UnitOutcome) {
        self.repositories += 1;
        match outcome {
            UnitOutcome::Extracted { count, .. } => {
                self.succeeded += 1;
                self.samples += count;
            }
            UnitOutcome::Skipped { .. } => self.skipped += 1,
            UnitOutcome::Failed { .. } => self.failed += 1,
            UnitOutcome::Critical { .. } => self.critical += 1,
        }
    }
}

/// Runs one extraction unit per repository on a fixed-width worker pool
pub struct Orchestrator {
    config: Arc<ExtractConfig>,
    backend: Arc<dyn GitBackend>,
    classifier: Option<Arc<dyn LicenseClassifier>>,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(
        config: ExtractConfig,
        backend: Arc<dyn GitBackend>,
        classifier: Option<Arc<dyn LicenseClassifier>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            classifier,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Processes `repos`, calling `report` with each outcome as soon as its unit finishes.
    ///
    /// Outcomes arrive in completion order. A panicking unit is reported as
    /// [`UnitOutcome::Critical`] and the remaining units keep running.
    pub fn run<F>(&self, repos: Vec<Repository>, mut report: F) -> anyhow::Result<RunSummary>
    where
        F: FnMut(&UnitOutcome),
    {
        let started = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .thread_name(|i| format!("extract-{i}"))
            .build()?;

        let bar = if self.show_progress {
            ProgressBar::new(repos.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(
                "Processing repos {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}]",
            )?
            .progress_chars("##-"),
        );

        let total = repos.len();
        let (tx, rx) = mpsc::channel();
        for repo in repos {
            let tx = tx.clone();
            let config = Arc::clone(&self.config);
            let backend = Arc::clone(&self.backend);
            let classifier = self.classifier.clone();
            pool.spawn(move || {
                let outcome = run_unit(&repo, &config, backend.as_ref(), classifier.as_deref());
                // receiver only goes away once every outcome has been collected
                let _ = tx.send(outcome);
            });
        }
        drop(tx);

        let mut summary = RunSummary::default();
        for outcome in rx.iter().take(total) {
            match &outcome {
                UnitOutcome::Extracted { name, count } => {
                    tracing::debug!(repo = %name, samples = count, "extracted")
                }
                UnitOutcome::Skipped { path, reason } => {
                    tracing::warn!(repo = %path, reason = %reason, "skipped")
                }
                UnitOutcome::Failed { name, reason } => {
                    tracing::warn!(repo = %name, reason = %reason, "failed")
                }
                UnitOutcome::Critical { name, reason } => {
                    tracing::error!(repo = %name, reason = %reason, "critical worker failure")
                }
            }
            bar.suspend(|| report(&outcome));
            bar.inc(1);
            summary.record(&outcome);
        }
        bar.finish_and_clear();

        summary.elapsed = started.elapsed();
        Ok(summary)
    }
}

/// One unit of work, with panics contained to the unit
pub fn run_unit(
    repo: &Repository,
    config: &ExtractConfig,
    backend: &dyn GitBackend,
    classifier: Option<&dyn LicenseClassifier>,
) -> UnitOutcome {
    let _span = tracing::info_span!("repo", name = %repo.name).entered();
    let classifier = if config.include_license {
        classifier
    } else {
        None
    };
    match panic::catch_unwind(AssertUnwindSafe(|| {
        extract_repository(repo, config, backend, classifier)
    })) {
        Ok(result) => UnitOutcome::from_result(repo, result),
        Err(payload) => UnitOutcome::Critical {
            name: repo.name.clone(),
            reason: panic_message(payload.as_ref()),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_base_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = discover_repositories(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingBaseDir(_)));
    }

    #[test]
    fn base_without_repositories_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("plain")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();
        let err = discover_repositories(dir.path()).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoRepositories(_)));
    }

    #[test]
    fn only_subdirectories_with_git_store_are_kept() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("b/.git")).unwrap();
        std::fs::create_dir_all(dir.path().join("a/.git")).unwrap();
        std::fs::create_dir(dir.path().join("plain")).unwrap();

        let found = discover_repositories(dir.path()).unwrap();
        assert_eq!(found.subdirectories, 3);
        let names: Vec<_> = found.repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(format!("bad {}", 1));
        assert_eq!(panic_message(payload.as_ref()), "bad 1");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        summary.record(&UnitOutcome::Extracted {
            name: "a".into(),
            count: 3,
        });
        summary.record(&UnitOutcome::Skipped {
            path: "/b".into(),
            reason: "no .git folder".into(),
        });
        summary.record(&UnitOutcome::Critical {
            name: "c".into(),
            reason: "boom".into(),
        });
        assert_eq!(summary.repositories, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.critical, 1);
    }
}
