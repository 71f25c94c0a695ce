//! Artifact evaluation.
//!
//! Collects recognized artifact files under a directory and measures two
//! things independently over the same text:
//!
//! - **validity**: pytest files must parse as Python, Robot files must be
//!   non-empty after trimming
//! - **traceability**: requirement identifiers referenced anywhere in the file,
//!   deduplicated across the whole directory
//!
//! A file that fails the validity check still contributes its identifiers.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use globset::{Glob, GlobMatcher};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use testgen_core::requirements::requirement_id_pattern;
use testgen_core::{OutputFormat, TestgenError};

use crate::syntax::is_valid_python;

/// Pytest artifacts link requirements through a `REQ-ID:` comment.
static PYTEST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REQ-ID:\s*(REQ-\d+)").unwrap());

static PYTEST_FILES: LazyLock<GlobMatcher> =
    LazyLock::new(|| Glob::new("test_*.py").unwrap().compile_matcher());

static ROBOT_FILES: LazyLock<GlobMatcher> =
    LazyLock::new(|| Glob::new("*.robot").unwrap().compile_matcher());

// ============================================================================
// Errors
// ============================================================================

/// Error evaluating a directory or persisting the report.
#[derive(Debug, Error)]
pub enum EvaluateError {
    /// The artifact directory does not exist.
    #[error("artifact directory not found: {path}")]
    DirNotFound { path: PathBuf },

    /// The report could not be written.
    #[error("cannot write report {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The report could not be serialized.
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<EvaluateError> for TestgenError {
    fn from(err: EvaluateError) -> Self {
        match err {
            EvaluateError::DirNotFound { path } => {
                TestgenError::not_found(path.display().to_string())
            }
            EvaluateError::Write { path, source } => {
                TestgenError::write(path.display().to_string(), &source)
            }
            EvaluateError::Serialize(e) => TestgenError::internal(e.to_string()),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Aggregate validity and traceability over a directory of artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Recognized artifact files.
    pub files_total: usize,
    /// Pytest artifacts.
    pub files_python: usize,
    /// Robot artifacts.
    pub files_robot: usize,
    /// Artifacts that passed the validity check.
    pub compile_success: usize,
    /// Number of distinct requirement identifiers.
    pub traceability_unique_reqs: usize,
    /// Distinct requirement identifiers, sorted.
    pub req_ids: Vec<String>,
}

/// Classify `path` by file name.
pub fn artifact_format(path: &Path) -> Option<OutputFormat> {
    let name = path.file_name()?;
    if PYTEST_FILES.is_match(name) {
        Some(OutputFormat::Pytest)
    } else if ROBOT_FILES.is_match(name) {
        Some(OutputFormat::Robot)
    } else {
        None
    }
}

/// Recognized artifacts under `dir`, in file-name-sorted walk order.
pub fn collect_artifacts(dir: &Path) -> Vec<(PathBuf, OutputFormat)> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| artifact_format(e.path()).map(|f| (e.into_path(), f)))
        .collect()
}

/// Evaluate every artifact under `dir`.
pub fn evaluate_dir(dir: &Path) -> Result<MetricsReport, EvaluateError> {
    if !dir.is_dir() {
        return Err(EvaluateError::DirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut report = MetricsReport::default();
    let mut ids = BTreeSet::new();

    for (path, format) in collect_artifacts(dir) {
        report.files_total += 1;
        match format {
            OutputFormat::Pytest => report.files_python += 1,
            OutputFormat::Robot => report.files_robot += 1,
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read artifact");
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        if is_valid_artifact(&text, format) {
            report.compile_success += 1;
        } else {
            debug!(path = %path.display(), "artifact failed validity check");
        }
        ids.extend(requirement_ids(&text, format));
    }

    report.traceability_unique_reqs = ids.len();
    report.req_ids = ids.into_iter().collect();
    Ok(report)
}

/// Validity check for one artifact's text.
pub fn is_valid_artifact(text: &str, format: OutputFormat) -> bool {
    match format {
        OutputFormat::Pytest => is_valid_python(text),
        OutputFormat::Robot => !text.trim().is_empty(),
    }
}

/// Requirement identifiers referenced by one artifact's text.
pub fn requirement_ids(text: &str, format: OutputFormat) -> Vec<String> {
    match format {
        OutputFormat::Pytest => PYTEST_MARKER
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        OutputFormat::Robot => requirement_id_pattern()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

/// Evaluate `dir` and persist the report as pretty JSON at `out_path`.
pub fn write_report(dir: &Path, out_path: &Path) -> Result<MetricsReport, EvaluateError> {
    let report = evaluate_dir(dir)?;
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EvaluateError::Write {
            path: out_path.to_path_buf(),
            source,
        })?;
    }
    fs::write(out_path, format!("{}\n", json)).map_err(|source| EvaluateError::Write {
        path: out_path.to_path_buf(),
        source,
    })?;
    info!(path = %out_path.display(), files = report.files_total, "wrote metrics report");

    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GOOD_PY: &str = "# REQ-ID: REQ-101\ndef test_add():\n    assert 1\n";
    const BAD_PY: &str = "# REQ-ID: REQ-102\ndef test_x(:\n";
    const ROBOT: &str = "*** Test Cases ***\nT\n    [Tags]    REQ-103\n    Log    x\n";

    fn write(dir: &Path, rel: &str, text: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    mod collection {
        use super::*;

        #[test]
        fn recognizes_both_conventions() {
            assert_eq!(artifact_format(Path::new("a/test_x.py")), Some(OutputFormat::Pytest));
            assert_eq!(artifact_format(Path::new("suite.robot")), Some(OutputFormat::Robot));
            assert_eq!(artifact_format(Path::new("helper.py")), None);
            assert_eq!(artifact_format(Path::new("conftest.py")), None);
        }

        #[test]
        fn walks_recursively() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test_a.py", GOOD_PY);
            write(dir.path(), "nested/test_b.py", GOOD_PY);
            write(dir.path(), "nested/deeper/s.robot", ROBOT);
            write(dir.path(), "notes.md", "REQ-999");

            let found = collect_artifacts(dir.path());
            assert_eq!(found.len(), 3);
        }
    }

    mod metrics {
        use super::*;

        #[test]
        fn validity_and_traceability_are_independent() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test_good.py", GOOD_PY);
            write(dir.path(), "test_bad.py", BAD_PY);
            write(dir.path(), "suite.robot", ROBOT);

            let report = evaluate_dir(dir.path()).unwrap();
            assert_eq!(report.files_total, 3);
            assert_eq!(report.files_python, 2);
            assert_eq!(report.files_robot, 1);
            assert_eq!(report.compile_success, 2);
            assert_eq!(report.req_ids, vec!["REQ-101", "REQ-102", "REQ-103"]);
            assert_eq!(report.traceability_unique_reqs, 3);
        }

        #[test]
        fn identifiers_are_deduplicated() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test_a.py", GOOD_PY);
            write(dir.path(), "test_b.py", GOOD_PY);
            let report = evaluate_dir(dir.path()).unwrap();
            assert_eq!(report.req_ids, vec!["REQ-101"]);
        }

        #[test]
        fn sentinel_and_bare_ids_in_pytest_do_not_count() {
            let text = "# REQ-ID: REQ-N/A\n# see REQ-500\ndef test_x():\n    pass\n";
            assert!(requirement_ids(text, OutputFormat::Pytest).is_empty());
            assert_eq!(requirement_ids("REQ-500 REQ-N/A", OutputFormat::Robot), vec!["REQ-500"]);
        }

        #[test]
        fn empty_robot_is_invalid() {
            assert!(!is_valid_artifact("  \n", OutputFormat::Robot));
            assert!(is_valid_artifact(ROBOT, OutputFormat::Robot));
        }

        #[test]
        fn validity_never_exceeds_total() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "test_a.py", GOOD_PY);
            write(dir.path(), "test_b.py", BAD_PY);
            write(dir.path(), "empty.robot", "");
            let report = evaluate_dir(dir.path()).unwrap();
            assert!(report.compile_success <= report.files_total);
            assert_eq!(report.compile_success, 1);
        }

        #[test]
        fn empty_directory_yields_zero_report() {
            let dir = TempDir::new().unwrap();
            assert_eq!(evaluate_dir(dir.path()).unwrap(), MetricsReport::default());
        }

        #[test]
        fn missing_directory_is_not_found() {
            let dir = TempDir::new().unwrap();
            let err = evaluate_dir(&dir.path().join("gone")).unwrap_err();
            let err: TestgenError = err.into();
            assert_eq!(err.error_code().code(), 3);
        }
    }

    mod persistence {
        use super::*;

        #[test]
        fn report_round_trips_through_disk() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "tests/test_a.py", GOOD_PY);
            let out = dir.path().join("reports/metrics.json");

            let report = write_report(&dir.path().join("tests"), &out).unwrap();
            let on_disk: MetricsReport =
                serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
            assert_eq!(report, on_disk);
            assert_eq!(on_disk.compile_success, 1);
        }
    }
}
