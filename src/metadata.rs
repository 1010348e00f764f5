// src/metadata.rs

use crate::backend::RepoHandle;
use crate::diff::truncate_with_marker;
use crate::error::ClassifierError;
use crate::model::{RepoMetadata, LICENSE_NONE, LICENSE_UNKNOWN};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Style guide files, in order of preference
pub const STYLE_GUIDE_CANDIDATES: &[&str] =
    &["CONTRIBUTING.md", ".github/CONTRIBUTING.md", "STYLEGUIDE.md"];

/// One license reported by a classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LicenseEntry {
    #[serde(default)]
    pub spdx_id: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

impl LicenseEntry {
    /// SPDX id when present, else the classifier's own key
    pub fn identifier(&self) -> &str {
        [self.spdx_id.as_deref(), self.key.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(LICENSE_UNKNOWN)
    }
}

/// Classifier verdict for one repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LicenseInfo {
    #[serde(default)]
    pub licenses: Vec<LicenseEntry>,
}

impl LicenseInfo {
    pub fn label(&self) -> String {
        match self.licenses.first() {
            Some(entry) => entry.identifier().to_string(),
            None => LICENSE_NONE.to_string(),
        }
    }
}

/// Something that can tell which license a repository carries
pub trait LicenseClassifier: Send + Sync {
    fn classify(&self, repo_path: &Path) -> Result<LicenseInfo, ClassifierError>;
}

/// Runs `licensee detect --json <path>`
#[derive(Debug, Clone)]
pub struct LicenseeClassifier {
    program: PathBuf,
    timeout: Duration,
}

impl LicenseeClassifier {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("licensee", timeout)
    }

    pub fn with_program(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl LicenseClassifier for LicenseeClassifier {
    fn classify(&self, repo_path: &Path) -> Result<LicenseInfo, ClassifierError> {
        let mut child = Command::new(&self.program)
            .arg("detect")
            .arg("--json")
            .arg(repo_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ClassifierError::ToolUnavailable(self.program.display().to_string())
                }
                _ => ClassifierError::Io(e),
            })?;

        // Drain stdout on its own thread so a chatty tool cannot fill the pipe
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClassifierError::MalformedOutput("no stdout".into()))?;
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let started = Instant::now();
        loop {
            if child.try_wait()?.is_some() {
                break;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ClassifierError::Timeout(self.timeout.as_secs()));
            }
            thread::sleep(Duration::from_millis(50));
        }

        let buf = reader
            .join()
            .map_err(|_| ClassifierError::MalformedOutput("stdout reader panicked".into()))??;
        Ok(serde_json::from_slice(&buf)?)
    }
}

/// Maps a classifier result onto the license field, never failing
pub fn license_label(result: Result<LicenseInfo, ClassifierError>) -> String {
    match result {
        Ok(info) => info.label(),
        Err(e) => format!("Detection Failed: {}", e.kind()),
    }
}

/// Content of the first readable style guide, capped at `max_size` bytes
pub fn read_style_guide(repo_path: &Path, max_size: usize) -> String {
    for path in STYLE_GUIDE_CANDIDATES.iter().map(|name| repo_path.join(name)) {
        if !path.exists() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                return truncate_with_marker(&String::from_utf8_lossy(&bytes), max_size);
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "could not read style guide"
                );
            }
        }
    }
    String::new()
}

/// Gathers everything about a repository that does not change per commit
pub struct MetadataResolver<'a> {
    pub classifier: Option<&'a dyn LicenseClassifier>,
    pub max_contrib_size: usize,
}

impl MetadataResolver<'_> {
    pub fn resolve(&self, handle: &dyn RepoHandle) -> RepoMetadata {
        let repo_path = handle.path();

        let repo_source = handle.remote_url();
        if repo_source.is_none() {
            tracing::debug!(repo = %repo_path.display(), "no remote fetch URL");
        }

        let license = match self.classifier {
            Some(classifier) => {
                let result = classifier.classify(repo_path);
                if let Err(e) = &result {
                    tracing::warn!(
                        repo = %repo_path.display(),
                        error = %e,
                        "license detection failed"
                    );
                }
                license_label(result)
            }
            None => LICENSE_UNKNOWN.to_string(),
        };

        RepoMetadata {
            license,
            repo_source,
            code_style: read_style_guide(repo_path, self.max_contrib_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn label_prefers_spdx_then_key() {
        let info: LicenseInfo = serde_json::from_str(
            r#"{"licenses":[{"key":"mit","spdx_id":"MIT"},{"key":"apache-2.0"}]}"#,
        )
        .unwrap();
        assert_eq!(info.label(), "MIT");

        let info: LicenseInfo =
            serde_json::from_str(r#"{"licenses":[{"key":"other","spdx_id":null}]}"#).unwrap();
        assert_eq!(info.label(), "other");

        let info: LicenseInfo = serde_json::from_str(r#"{"licenses":[{}]}"#).unwrap();
        assert_eq!(info.label(), "Unknown");
    }

    #[test]
    fn empty_or_missing_license_list_means_no_license() {
        let info: LicenseInfo = serde_json::from_str(r#"{"licenses":[]}"#).unwrap();
        assert_eq!(info.label(), "No License");
        let info: LicenseInfo = serde_json::from_str(r#"{"matched_files":[]}"#).unwrap();
        assert_eq!(info.label(), "No License");
    }

    #[test]
    fn failures_become_detection_failed() {
        assert_eq!(
            license_label(Err(ClassifierError::Timeout(3))),
            "Detection Failed: Timeout"
        );
        let malformed = serde_json::from_slice::<LicenseInfo>(b"not json").map_err(Into::into);
        assert_eq!(license_label(malformed), "Detection Failed: MalformedOutput");
    }

    #[test]
    fn missing_classifier_tool_is_reported() {
        let classifier = LicenseeClassifier::with_program(
            "/nonexistent/licensee-for-tests",
            Duration::from_secs(1),
        );
        let err = classifier.classify(Path::new(".")).unwrap_err();
        assert_eq!(err.kind(), "ToolUnavailable");
    }

    #[cfg(unix)]
    fn stub_classifier(dir: &TempDir, body: &str, timeout: Duration) -> LicenseeClassifier {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.path().join("licensee-stub");
        std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        LicenseeClassifier::with_program(script, timeout)
    }

    #[cfg(unix)]
    #[test]
    fn hung_classifier_is_killed_after_timeout() {
        let dir = TempDir::new().unwrap();
        let classifier = stub_classifier(&dir, "exec sleep 5", Duration::from_secs(1));
        let started = Instant::now();
        let label = license_label(classifier.classify(dir.path()));
        assert_eq!(label, "Detection Failed: Timeout");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn garbage_output_is_malformed() {
        let dir = TempDir::new().unwrap();
        let classifier = stub_classifier(&dir, "echo garbage", Duration::from_secs(10));
        assert_eq!(
            license_label(classifier.classify(dir.path())),
            "Detection Failed: MalformedOutput"
        );
    }

    #[cfg(unix)]
    #[test]
    fn classifier_json_is_decoded() {
        let dir = TempDir::new().unwrap();
        let classifier = stub_classifier(
            &dir,
            r#"echo '{"licenses":[{"key":"mit","spdx_id":"MIT"}]}'"#,
            Duration::from_secs(10),
        );
        assert_eq!(license_label(classifier.classify(dir.path())), "MIT");
    }

    #[test]
    fn style_guide_uses_first_candidate() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".github")).unwrap();
        std::fs::write(dir.path().join(".github/CONTRIBUTING.md"), "github guide").unwrap();
        std::fs::write(dir.path().join("STYLEGUIDE.md"), "style guide").unwrap();
        assert_eq!(read_style_guide(dir.path(), 100), "github guide");

        std::fs::write(dir.path().join("CONTRIBUTING.md"), "root guide").unwrap();
        assert_eq!(read_style_guide(dir.path(), 100), "root guide");
    }

    #[test]
    fn style_guide_is_capped_and_lossy() {
        let dir = TempDir::new().unwrap();
        let mut bytes = b"Use tabs ".to_vec();
        bytes.push(0xff);
        bytes.extend_from_slice(b" always and forever");
        std::fs::write(dir.path().join("STYLEGUIDE.md"), bytes).unwrap();

        let text = read_style_guide(dir.path(), 1000);
        assert!(text.starts_with("Use tabs \u{fffd}"));

        assert_eq!(read_style_guide(dir.path(), 8), "Use tabs...TRUNCATED");
    }

    #[test]
    fn unreadable_candidate_falls_through_to_next() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("CONTRIBUTING.md")).unwrap();
        std::fs::write(dir.path().join("STYLEGUIDE.md"), "style guide").unwrap();
        assert_eq!(read_style_guide(dir.path(), 100), "style guide");
    }

    #[test]
    fn no_style_guide_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_style_guide(dir.path(), 100), "");
    }
}
