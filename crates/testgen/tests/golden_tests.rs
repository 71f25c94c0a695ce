//! Golden tests for artifact text and output schema stability.
//!
//! Generated artifacts and the `scan --json` envelope are compared against
//! checked-in files under `tests/golden/`.
//!
//! ## Updating Golden Files
//!
//! When making intentional output changes:
//! ```bash
//! TESTGEN_UPDATE_GOLDEN=1 cargo nextest run -p testgen golden
//! git diff tests/golden/  # Review changes
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Directory containing input fixtures.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Directory containing expected output files.
fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("golden")
}

/// Check if golden update mode is enabled.
fn update_mode() -> bool {
    std::env::var("TESTGEN_UPDATE_GOLDEN").is_ok()
}

/// Copy the sample project and design document into a fresh workspace.
///
/// Layout: `<tmp>/src/example_module.py`, `<tmp>/design/requirements.md`.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (from, to) in [("src_project", "src"), ("design", "design")] {
        let dest = tmp.path().join(to);
        fs::create_dir_all(&dest).unwrap();
        for entry in fs::read_dir(fixtures_dir().join(from)).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), dest.join(entry.file_name())).unwrap();
        }
    }
    tmp
}

fn testgen(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_testgen"))
        .current_dir(cwd)
        .env_remove("LLM_PROVIDER")
        .env_remove("TESTGEN_FRAMEWORK")
        .args(args)
        .output()
        .expect("failed to run testgen")
}

/// Compare `actual` with the golden file, or rewrite it in update mode.
fn check_text(golden_file: &str, actual: &str) {
    let path = golden_dir().join(golden_file);
    if update_mode() {
        fs::write(&path, actual).unwrap();
        return;
    }
    let expected = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing golden file {}: {}", path.display(), e));
    assert_eq!(
        actual, expected,
        "artifact differs from {}; rerun with TESTGEN_UPDATE_GOLDEN=1 to accept",
        golden_file
    );
}

/// Drop fields that hold absolute paths.
fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !matches!(k.as_str(), "source_root" | "out_dir" | "path"))
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(normalize_json).collect()),
        other => other.clone(),
    }
}

fn generate(tmp: &Path, framework: &str) -> String {
    let output = testgen(
        tmp,
        &[
            "generate",
            "--src",
            "src",
            "--out",
            "generated",
            "--design",
            "design/requirements.md",
            "--framework",
            framework,
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let ext = if framework == "robot" { "robot" } else { "py" };
    fs::read_to_string(tmp.join("generated").join(format!("test_example_module.{}", ext))).unwrap()
}

// ============================================================================
// Golden Tests
// ============================================================================

#[test]
fn golden_pytest_artifact() {
    let tmp = workspace();
    let actual = generate(tmp.path(), "pytest");
    check_text("test_example_module.py", &actual);
}

#[test]
fn golden_robot_artifact() {
    let tmp = workspace();
    let actual = generate(tmp.path(), "robot");
    check_text("test_example_module.robot", &actual);
}

#[test]
fn golden_scan_json() {
    let tmp = workspace();
    let output = testgen(tmp.path(), &["scan", "--src", "src", "--json"]);
    assert!(output.status.success());

    let actual: Value = serde_json::from_slice(&output.stdout).unwrap();
    let path = golden_dir().join("scan.json");
    if update_mode() {
        let pretty = serde_json::to_string_pretty(&normalize_json(&actual)).unwrap();
        fs::write(&path, format!("{}\n", pretty)).unwrap();
        return;
    }
    let expected: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(normalize_json(&actual), normalize_json(&expected));
}
