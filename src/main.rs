// src/main.rs

use anyhow::Context;
use clap::Parser;
use commit_harvest::backend::{backend_for, GitBackend};
use commit_harvest::cli::Args;
use commit_harvest::metadata::{LicenseClassifier, LicenseeClassifier};
use commit_harvest::orchestrator::{discover_repositories, Orchestrator};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let start_time = Instant::now();
    let config = args.to_config();

    let base = if config.repos_dir.is_absolute() {
        config.repos_dir.clone()
    } else {
        std::env::current_dir()?.join(&config.repos_dir)
    };
    println!("Looking for repositories in: {}", base.display());

    let discovery = discover_repositories(&base)?;
    println!(
        "Found {} subdirectories, {} valid Git repos.",
        discovery.subdirectories,
        discovery.repositories.len()
    );

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let backend: Arc<dyn GitBackend> = Arc::from(backend_for(config.backend));
    let classifier: Option<Arc<dyn LicenseClassifier>> = config.include_license.then(|| {
        Arc::new(LicenseeClassifier::new(config.license_timeout)) as Arc<dyn LicenseClassifier>
    });
    tracing::debug!(backend = backend.name(), threads = config.threads, "starting extraction");

    let orchestrator = Orchestrator::new(config, backend, classifier);
    let summary = orchestrator.run(discovery.repositories, |outcome| println!("{outcome}"))?;

    println!(
        "Processed {} repositories in {:.2?}: {} extracted, {} skipped, {} failed, {} critical; \
         {} samples written to {}.",
        summary.repositories,
        summary.elapsed,
        summary.succeeded,
        summary.skipped,
        summary.failed,
        summary.critical,
        summary.samples,
        orchestrator.config().output_dir.display()
    );
    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
