//! Python source file discovery.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Directory names never descended into, in addition to hidden components.
const EXCLUDED_DIRS: &[&str] = &["__pycache__", "node_modules", "venv", "target"];

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file discovery.
#[derive(Debug, Error)]
pub enum FileError {
    /// The scan root does not exist or is not a directory.
    #[error("source root not found: {path}")]
    RootNotFound { path: String },

    /// An exclusion pattern is not a valid glob.
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type for file discovery.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Collection
// ============================================================================

/// A discovered Python file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute (or root-joined) path for reading.
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
}

impl SourceFile {
    /// Dotted module name: separators become `.`, the `.py` suffix is dropped.
    pub fn module_name(&self) -> String {
        let without_ext = self
            .relative_path
            .strip_suffix(".py")
            .unwrap_or(&self.relative_path);
        without_ext.replace('/', ".")
    }
}

/// Compile user exclusion globs.
pub fn build_exclusions(patterns: &[String]) -> FileResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| FileError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| FileError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Collect Python files under `root`, sorted by relative path.
///
/// Skips any path with a hidden component (leading `.`), the standard
/// build/cache directories, and paths matching `exclusions`. Only the part of
/// the path below `root` is inspected, so a hidden root directory is fine.
pub fn collect_python_files(root: &Path, exclusions: &GlobSet) -> FileResult<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(FileError::RootNotFound {
            path: root.display().to_string(),
        });
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py") {
            continue;
        }

        let rel_path = match path.strip_prefix(root) {
            Ok(p) => p,
            Err(_) => continue,
        };

        if rel_path
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            debug!(path = %rel_path.display(), "skipping hidden path");
            continue;
        }
        if rel_path.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            EXCLUDED_DIRS.iter().any(|dir| name == *dir)
        }) {
            continue;
        }

        let relative_path = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if exclusions.is_match(&relative_path) {
            debug!(path = %relative_path, "skipping excluded path");
            continue;
        }

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative_path,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(files)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x = 1\n").unwrap();
    }

    fn rel_paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[test]
    fn collects_sorted_python_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.py");
        touch(dir.path(), "a.py");
        touch(dir.path(), "pkg/util.py");
        touch(dir.path(), "notes.txt");

        let files = collect_python_files(dir.path(), &GlobSet::empty()).unwrap();
        assert_eq!(rel_paths(&files), vec!["a.py", "b.py", "pkg/util.py"]);
    }

    #[test]
    fn skips_hidden_and_cache_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep.py");
        touch(dir.path(), ".hidden/skip.py");
        touch(dir.path(), "pkg/.secret.py");
        touch(dir.path(), "__pycache__/cached.py");
        touch(dir.path(), "venv/lib/site.py");

        let files = collect_python_files(dir.path(), &GlobSet::empty()).unwrap();
        assert_eq!(rel_paths(&files), vec!["keep.py"]);
    }

    #[test]
    fn applies_exclusion_globs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "keep.py");
        touch(dir.path(), "legacy/old.py");

        let exclusions = build_exclusions(&["legacy/**".to_string()]).unwrap();
        let files = collect_python_files(dir.path(), &exclusions).unwrap();
        assert_eq!(rel_paths(&files), vec!["keep.py"]);
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = build_exclusions(&["a[".to_string()]).unwrap_err();
        assert!(matches!(err, FileError::InvalidPattern { .. }));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_python_files(&dir.path().join("nope"), &GlobSet::empty()).unwrap_err();
        assert!(matches!(err, FileError::RootNotFound { .. }));
    }

    #[test]
    fn module_names_use_dots() {
        let file = SourceFile {
            path: PathBuf::from("/x/pkg/util.py"),
            relative_path: "pkg/util.py".to_string(),
        };
        assert_eq!(file.module_name(), "pkg.util");
    }
}
