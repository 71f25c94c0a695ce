//! Declaration scanner.
//!
//! Walks a source tree, parses every Python file with tree-sitter, and
//! produces a flat catalog of [`Declaration`] records.
//!
//! ## Traversal
//!
//! The walk is a recursive function that threads the enclosing *class* path
//! through each call. Entering a class extends the path for that subtree only;
//! entering a function records it under the current path and keeps descending,
//! so nested helpers are discovered but their enclosing functions are not part
//! of their qualified name.
//!
//! `async def` declarations are not recorded, though sync functions nested
//! inside them are.
//!
//! ## Parameters
//!
//! Recorded parameters are the ones that can be passed positionally: plain,
//! annotated, and defaulted parameters up to the first `*`, `*args`, or
//! `**kwargs`. Keyword-only parameters and variadics are not recorded.
//!
//! ## Failure handling
//!
//! A file that cannot be read or that does not parse contributes zero records.
//! It is reported in [`ScanOutcome::skipped`] and the scan continues.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};
use tree_sitter::Node;

use testgen_core::{Declaration, TestgenError};

use crate::files::{build_exclusions, collect_python_files, FileError, SourceFile};
use crate::syntax::{node_text, parse_python};

// ============================================================================
// Scan Results
// ============================================================================

/// Why a file contributed no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be read as text.
    Unreadable,
    /// The file contains syntax errors.
    ParseError,
}

/// A file left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Path relative to the scan root.
    pub relative_path: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Result of scanning a source tree.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Declarations in file order, then source order within each file.
    pub declarations: Vec<Declaration>,
    /// Number of Python files visited.
    pub files_scanned: usize,
    /// Files that contributed no records because of a failure.
    pub skipped: Vec<SkippedFile>,
}

// ============================================================================
// Scanning
// ============================================================================

/// Scan every Python file under `root`.
///
/// Only an unusable root or a bad exclusion pattern is an error; per-file
/// failures are recorded in the outcome.
pub fn scan_python_functions(root: &Path, exclude: &[String]) -> Result<ScanOutcome, FileError> {
    let exclusions = build_exclusions(exclude)?;
    let files = collect_python_files(root, &exclusions)?;

    let mut outcome = ScanOutcome {
        files_scanned: files.len(),
        ..ScanOutcome::default()
    };

    for file in &files {
        match scan_file(file) {
            Ok(declarations) => {
                debug!(
                    path = %file.relative_path,
                    count = declarations.len(),
                    "scanned file"
                );
                outcome.declarations.extend(declarations);
            }
            Err(reason) => outcome.skipped.push(SkippedFile {
                relative_path: file.relative_path.clone(),
                reason,
            }),
        }
    }

    Ok(outcome)
}

fn scan_file(file: &SourceFile) -> Result<Vec<Declaration>, SkipReason> {
    let source = fs::read_to_string(&file.path).map_err(|e| {
        warn!(path = %file.relative_path, error = %e, "cannot read source file");
        SkipReason::Unreadable
    })?;
    extract_declarations(&source, &file.module_name(), &file.relative_path).ok_or_else(|| {
        debug!(path = %file.relative_path, "parse failure, skipping file");
        SkipReason::ParseError
    })
}

/// Extract declarations from one module's source.
///
/// Returns `None` if the source does not parse; no partial catalog is ever
/// produced for a malformed file.
pub fn extract_declarations(
    source: &str,
    module: &str,
    relative_path: &str,
) -> Option<Vec<Declaration>> {
    let tree = parse_python(source)?;
    let file = FileContext {
        source,
        module,
        relative_path,
    };
    Some(visit(tree.root_node(), &[], &file))
}

struct FileContext<'a> {
    source: &'a str,
    module: &'a str,
    relative_path: &'a str,
}

fn visit(node: Node<'_>, classes: &[String], file: &FileContext<'_>) -> Vec<Declaration> {
    let mut found = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if !is_async(child) {
                    if let Some(decl) = declaration_from(child, classes, file) {
                        found.push(decl);
                    }
                }
                found.extend(visit(child, classes, file));
            }
            "class_definition" => {
                let mut nested = classes.to_vec();
                if let Some(name) = child.child_by_field_name("name") {
                    nested.push(node_text(name, file.source).to_string());
                }
                found.extend(visit(child, &nested, file));
            }
            _ => found.extend(visit(child, classes, file)),
        }
    }
    found
}

fn is_async(function: Node<'_>) -> bool {
    let mut cursor = function.walk();
    let first = function.children(&mut cursor).next();
    first.is_some_and(|token| token.kind() == "async")
}

fn declaration_from(
    function: Node<'_>,
    classes: &[String],
    file: &FileContext<'_>,
) -> Option<Declaration> {
    let name = node_text(function.child_by_field_name("name")?, file.source).to_string();

    let qualified_name = classes
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(name.as_str()))
        .collect::<Vec<_>>()
        .join(".");

    let (parameters, parameter_annotations) = function
        .child_by_field_name("parameters")
        .map(|params| positional_parameters(params, file.source))
        .unwrap_or_default();

    let return_annotation = function
        .child_by_field_name("return_type")
        .map(|ty| normalize_annotation(node_text(ty, file.source)));

    let docstring = function
        .child_by_field_name("body")
        .and_then(|body| docstring_of(body, file.source));

    Some(Declaration {
        module: file.module.to_string(),
        qualified_name,
        name,
        parameters,
        parameter_annotations,
        return_annotation,
        docstring,
        relative_path: file.relative_path.to_string(),
    })
}

// ============================================================================
// Parameters
// ============================================================================

fn positional_parameters(
    parameters: Node<'_>,
    source: &str,
) -> (Vec<String>, BTreeMap<String, String>) {
    let mut names = Vec::new();
    let mut annotations = BTreeMap::new();

    let mut cursor = parameters.walk();
    for param in parameters.named_children(&mut cursor) {
        let (name, annotation) = match param.kind() {
            "identifier" => (Some(param), None),
            "typed_parameter" => {
                let mut inner = param.walk();
                let target = param.named_children(&mut inner).next();
                match target {
                    Some(t) if t.kind() == "identifier" => {
                        (Some(t), param.child_by_field_name("type"))
                    }
                    _ => break,
                }
            }
            "default_parameter" => (param.child_by_field_name("name"), None),
            "typed_default_parameter" => (
                param.child_by_field_name("name"),
                param.child_by_field_name("type"),
            ),
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => continue,
        };

        let Some(name) = name else { continue };
        let name = node_text(name, source).to_string();
        if let Some(annotation) = annotation {
            annotations.insert(name.clone(), normalize_annotation(node_text(annotation, source)));
        }
        names.push(name);
    }

    (names, annotations)
}

/// Normalize annotation text: collapse whitespace, no padding inside
/// brackets, exactly one space after commas.
pub fn normalize_annotation(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut out = String::with_capacity(collapsed.len());
    let mut chars = collapsed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' if matches!(chars.peek(), Some(']' | ')' | ',')) || out.ends_with(['[', '(']) => {}
            ',' => {
                out.push(',');
                if !matches!(chars.peek(), Some(' ' | ']' | ')') | None) {
                    out.push(' ');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Docstrings
// ============================================================================

fn docstring_of(body: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;
    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }
    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    string_literal_body(string, source).map(|raw| clean_docstring(&raw))
}

/// Text between the opening and closing quotes of a plain (non-f, non-bytes) literal.
fn string_literal_body(string: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = string.walk();
    let mut start = None;
    let mut end = None;
    for part in string.children(&mut cursor) {
        match part.kind() {
            "string_start" => start = Some(part),
            "string_end" => end = Some(part),
            _ => {}
        }
    }
    let (start, end) = (start?, end?);

    let prefix = node_text(start, source);
    if prefix
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .any(|c| matches!(c, 'f' | 'F' | 'b' | 'B'))
    {
        return None;
    }

    source
        .get(start.end_byte()..end.start_byte())
        .map(str::to_string)
}

/// Strip docstring indentation: the first line is trimmed, later lines lose
/// their common leading whitespace, leading and trailing blank lines go.
pub fn clean_docstring(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            cleaned.push(line.trim_start().to_string());
        } else {
            cleaned.push(line.get(margin..).unwrap_or("").trim_end().to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

// ============================================================================
// Bridge: FileError -> TestgenError
// ============================================================================

impl From<FileError> for TestgenError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::RootNotFound { path } => TestgenError::NotFound { path },
            FileError::InvalidPattern { .. } => TestgenError::invalid_args(err.to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
