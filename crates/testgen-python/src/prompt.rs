//! Prompt construction for provider-assisted generation.

use std::fmt::Write;

use testgen_core::requirements::NO_REQUIREMENT;
use testgen_core::{Declaration, OutputFormat};

const PYTEST_GUIDE: &str = "\
- Output Format: Python (pytest)
- Use # REQ-ID: <id> comments to link Requirements.
- Use only 'pytest' and Python stdlib.";

const ROBOT_GUIDE: &str = "\
- Output Format: Robot Framework
- Use '*** Settings ***' for library imports.
- Use '*** Test Cases ***' for tests.
- Use Tags to link Requirements IDs (e.g. [Tags]    REQ-123).";

/// First `limit` characters of the design document.
pub fn design_excerpt(design: Option<&str>, limit: usize) -> &str {
    let Some(design) = design else { return "" };
    match design.char_indices().nth(limit) {
        Some((end, _)) => &design[..end],
        None => design,
    }
}

/// Build the prompt asking a provider for a test file covering `decl`.
pub fn build_prompt(
    decl: &Declaration,
    design: Option<&str>,
    format: OutputFormat,
    excerpt_chars: usize,
) -> String {
    let guide = match format {
        OutputFormat::Pytest => PYTEST_GUIDE,
        OutputFormat::Robot => ROBOT_GUIDE,
    };

    let annotations = decl
        .parameter_annotations
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, ty))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = String::new();
    prompt.push_str("You are an expert software test engineer.\n");
    prompt.push_str("Generate a concise, runnable test file for the target function.\n\n");
    prompt.push_str("Target:\n");
    let _ = writeln!(prompt, "- module: {}", decl.module);
    let _ = writeln!(prompt, "- function: {}", decl.name);
    if decl.is_method() {
        let _ = writeln!(prompt, "- qualname: {}", decl.qualified_name);
    }
    let _ = writeln!(prompt, "- args: [{}]", decl.parameters.join(", "));
    let _ = writeln!(prompt, "- types: {{{}}}", annotations);
    let _ = writeln!(
        prompt,
        "- returns: {}",
        decl.return_annotation.as_deref().unwrap_or("None")
    );
    let _ = writeln!(
        prompt,
        "- docstring: {}",
        decl.docstring.as_deref().unwrap_or("None")
    );
    prompt.push_str("\nDesign context (Requirements):\n");
    prompt.push_str(design_excerpt(design, excerpt_chars));
    prompt.push_str("\n\nInstructions:\n");
    let _ = writeln!(prompt, "1. Follow this syntax guide:\n{}", guide);
    prompt.push_str(
        "2. Look for a Requirement ID (e.g., REQ-101) in the design context that relates to this function.\n",
    );
    let _ = writeln!(
        prompt,
        "3. If found, explicitly include it (via comment or Tag). If not found, mark as {}.",
        NO_REQUIREMENT
    );
    prompt.push_str("4. Do NOT do any network or file I/O.\n");
    prompt.push_str("5. Prefer small, deterministic inputs.\n\n");
    prompt.push_str("Return ONLY the test code content. Do not wrap in markdown.\n");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn add() -> Declaration {
        let mut annotations = BTreeMap::new();
        annotations.insert("a".to_string(), "int".to_string());
        annotations.insert("b".to_string(), "int".to_string());
        Declaration {
            module: "example_module".into(),
            qualified_name: "add".into(),
            name: "add".into(),
            parameters: vec!["a".into(), "b".into()],
            parameter_annotations: annotations,
            return_annotation: Some("int".into()),
            docstring: Some("Return the sum of two integers.".into()),
            relative_path: "example_module.py".into(),
        }
    }

    #[test]
    fn includes_target_metadata() {
        let prompt = build_prompt(&add(), None, OutputFormat::Pytest, 2000);
        assert!(prompt.contains("- module: example_module"));
        assert!(prompt.contains("- args: [a, b]"));
        assert!(prompt.contains("- types: {a: int, b: int}"));
        assert!(prompt.contains("- docstring: Return the sum of two integers."));
        assert!(prompt.contains("# REQ-ID: <id>"));
        assert!(prompt.contains("REQ-N/A"));
    }

    #[test]
    fn method_is_named_by_simple_name() {
        let square = Declaration {
            qualified_name: "Math.square".into(),
            name: "square".into(),
            parameters: vec!["self".into(), "n".into()],
            ..add()
        };
        let prompt = build_prompt(&square, None, OutputFormat::Pytest, 2000);
        assert!(prompt.contains("- function: square\n"));
        assert!(prompt.contains("- qualname: Math.square\n"));
        assert!(!build_prompt(&add(), None, OutputFormat::Pytest, 2000).contains("- qualname:"));
    }

    #[test]
    fn robot_guide_for_robot_format() {
        let prompt = build_prompt(&add(), None, OutputFormat::Robot, 2000);
        assert!(prompt.contains("Robot Framework"));
        assert!(!prompt.contains("Python (pytest)"));
    }

    #[test]
    fn design_is_truncated_by_characters() {
        let design = "é".repeat(10);
        assert_eq!(design_excerpt(Some(&design), 3), "ééé");
        assert_eq!(design_excerpt(Some("short"), 100), "short");
        assert_eq!(design_excerpt(None, 100), "");

        let prompt = build_prompt(&add(), Some("REQ-1: add\nmore"), OutputFormat::Pytest, 10);
        assert!(prompt.contains("REQ-1: add"));
        assert!(!prompt.contains("more"));
    }
}
