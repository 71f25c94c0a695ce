//! Shared record types.
//!
//! [`Declaration`] is the unit a scanner produces for every function or method
//! it discovers. [`OutputFormat`] selects which artifact flavour the
//! synthesizer renders and which files the evaluator recognizes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Declaration Record
// ============================================================================

/// One discovered function or method.
///
/// Records are immutable once produced and grouped into artifacts by `module`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Dotted module path derived from the file location relative to the scan root.
    pub module: String,
    /// Enclosing class names joined with `.`, followed by the declaration name.
    ///
    /// Enclosing *functions* are not represented: a helper nested inside a
    /// function appears under its own simple name, prefixed only by classes.
    #[serde(rename = "qualname")]
    pub qualified_name: String,
    /// The declaration's own simple name.
    pub name: String,
    /// Positional parameter names in declaration order, positional-only ones
    /// (before `/`) included, up to the first `*`, `*args` or `**kwargs`.
    #[serde(rename = "args")]
    pub parameters: Vec<String>,
    /// Normalized annotation text per parameter. Missing key = no annotation.
    #[serde(rename = "annotations")]
    pub parameter_annotations: BTreeMap<String, String>,
    /// Normalized return annotation text.
    #[serde(rename = "returns")]
    pub return_annotation: Option<String>,
    /// Cleaned docstring, if any.
    pub docstring: Option<String>,
    /// Source file path relative to the scan root, `/`-separated.
    #[serde(rename = "rel_path")]
    pub relative_path: String,
}

impl Declaration {
    /// Separator used in qualified names and module paths.
    pub const SEPARATOR: char = '.';

    /// True if the declaration is nested inside at least one class.
    pub fn is_method(&self) -> bool {
        self.qualified_name.contains(Self::SEPARATOR)
    }

    /// Enclosing class path (everything before the final segment).
    ///
    /// Returns `None` for free functions.
    pub fn class_path(&self) -> Option<&str> {
        self.qualified_name
            .rsplit_once(Self::SEPARATOR)
            .map(|(classes, _)| classes)
    }

    /// Annotation text for a parameter, if one was written.
    pub fn annotation_for(&self, parameter: &str) -> Option<&str> {
        self.parameter_annotations.get(parameter).map(String::as_str)
    }
}

// ============================================================================
// Output Format
// ============================================================================

/// Artifact flavour produced by synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Function-call style: a pytest module per source module.
    #[default]
    Pytest,
    /// Keyword style: a Robot Framework suite per source module.
    Robot,
}

impl OutputFormat {
    /// File extension (without the dot) of artifacts in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pytest => "py",
            OutputFormat::Robot => "robot",
        }
    }

    /// Whether candidate bodies in this format can be structurally parsed.
    ///
    /// Only pytest artifacts are checked for well-formedness; Robot suites are
    /// held to the safety rules alone.
    pub fn is_structurally_checkable(&self) -> bool {
        matches!(self, OutputFormat::Pytest)
    }

    /// Deterministic artifact file name for a module.
    ///
    /// `pkg.util` becomes `test_pkg_util.py` (or `.robot`).
    pub fn artifact_file_name(&self, module: &str) -> String {
        format!(
            "test_{}.{}",
            module.replace(Declaration::SEPARATOR, "_"),
            self.extension()
        )
    }

    /// Name used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pytest => "pytest",
            OutputFormat::Robot => "robot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format '{0}' (expected 'pytest' or 'robot')")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pytest" | "python" | "py" => Ok(OutputFormat::Pytest),
            "robot" | "robotframework" => Ok(OutputFormat::Robot),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(qualified_name: &str) -> Declaration {
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name)
            .to_string();
        Declaration {
            module: "pkg.mod".to_string(),
            qualified_name: qualified_name.to_string(),
            name,
            parameters: vec![],
            parameter_annotations: BTreeMap::new(),
            return_annotation: None,
            docstring: None,
            relative_path: "pkg/mod.py".to_string(),
        }
    }

    mod declaration {
        use super::*;

        #[test]
        fn free_function_is_not_method() {
            let d = decl("add");
            assert!(!d.is_method());
            assert_eq!(d.class_path(), None);
        }

        #[test]
        fn nested_class_path() {
            let d = decl("Outer.Inner.run");
            assert!(d.is_method());
            assert_eq!(d.class_path(), Some("Outer.Inner"));
        }

        #[test]
        fn serializes_with_catalog_field_names() {
            let json = serde_json::to_value(decl("Math.square")).unwrap();
            assert_eq!(json["qualname"], "Math.square");
            assert_eq!(json["rel_path"], "pkg/mod.py");
            assert!(json["args"].is_array());
        }
    }

    mod output_format {
        use super::*;

        #[test]
        fn artifact_names_replace_separators() {
            assert_eq!(
                OutputFormat::Pytest.artifact_file_name("pkg.util"),
                "test_pkg_util.py"
            );
            assert_eq!(
                OutputFormat::Robot.artifact_file_name("example_module"),
                "test_example_module.robot"
            );
        }

        #[test]
        fn parses_case_insensitively() {
            assert_eq!("PyTest".parse::<OutputFormat>(), Ok(OutputFormat::Pytest));
            assert_eq!(" robot ".parse::<OutputFormat>(), Ok(OutputFormat::Robot));
            assert!("junit".parse::<OutputFormat>().is_err());
        }

        #[test]
        fn only_pytest_is_structurally_checkable() {
            assert!(OutputFormat::Pytest.is_structurally_checkable());
            assert!(!OutputFormat::Robot.is_structurally_checkable());
        }
    }
}
