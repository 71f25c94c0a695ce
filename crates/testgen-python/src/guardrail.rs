//! Guardrail for candidate artifact bodies.
//!
//! A candidate is accepted only if it is safe (no disallowed side-effecting
//! construct) and, for pytest, well-formed Python. [`sanitize`] removes
//! markdown code fences and surrounding whitespace; it never touches code, so
//! it cannot turn an unsafe candidate into a safe one.

use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};
use serde::Serialize;

use testgen_core::OutputFormat;

use crate::syntax::is_valid_python;

// ============================================================================
// Rules
// ============================================================================

/// Category of a disallowed construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// HTTP clients and raw sockets.
    Network,
    /// Subprocess spawning.
    Process,
    /// Shell command execution.
    Shell,
    /// Opening or manipulating files.
    FileAccess,
    /// Building filesystem paths.
    PathConstruction,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::Network => "network",
            ViolationKind::Process => "process",
            ViolationKind::Shell => "shell",
            ViolationKind::FileAccess => "file access",
            ViolationKind::PathConstruction => "path construction",
        };
        f.write_str(name)
    }
}

struct Rule {
    pattern: &'static str,
    kind: ViolationKind,
}

const RULES: &[Rule] = &[
    Rule { pattern: r"requests\.", kind: ViolationKind::Network },
    Rule { pattern: r"httpx\.", kind: ViolationKind::Network },
    Rule { pattern: r"urllib\.", kind: ViolationKind::Network },
    Rule { pattern: r"socket\.", kind: ViolationKind::Network },
    Rule { pattern: r"os\.system", kind: ViolationKind::Shell },
    Rule { pattern: r"os\.popen", kind: ViolationKind::Shell },
    Rule { pattern: r"subprocess\.", kind: ViolationKind::Process },
    Rule { pattern: r"open\(", kind: ViolationKind::FileAccess },
    Rule { pattern: r"shutil\.", kind: ViolationKind::FileAccess },
    Rule { pattern: r"Path\(", kind: ViolationKind::PathConstruction },
    Rule { pattern: r"(?m)^Library\s+(Process|OperatingSystem)\b", kind: ViolationKind::Process },
    Rule { pattern: r"\b(Run|Start) Process\b", kind: ViolationKind::Process },
];

static RULE_SET: LazyLock<RegexSet> =
    LazyLock::new(|| RegexSet::new(RULES.iter().map(|r| r.pattern)).unwrap());

/// A fence line: three backticks, an optional info string, nothing else.
static FENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*```[A-Za-z0-9_+-]*\s*$").unwrap());

/// A matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Rule category.
    pub kind: ViolationKind,
    /// The rule's pattern.
    pub pattern: &'static str,
}

// ============================================================================
// Checks
// ============================================================================

/// Strip code fences and surrounding whitespace.
pub fn sanitize(candidate: &str) -> String {
    let unfenced = candidate
        .lines()
        .filter(|line| !FENCE_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");
    unfenced.replace("```", "").trim().to_string()
}

/// Every rule `candidate` violates, in rule order.
pub fn violations(candidate: &str) -> Vec<Violation> {
    RULE_SET
        .matches(candidate)
        .into_iter()
        .map(|i| Violation {
            kind: RULES[i].kind,
            pattern: RULES[i].pattern,
        })
        .collect()
}

/// True if `candidate` contains no disallowed construct.
pub fn is_safe(candidate: &str) -> bool {
    !RULE_SET.is_match(candidate)
}

/// True if `candidate` parses as Python.
pub fn is_well_formed(candidate: &str) -> bool {
    is_valid_python(candidate)
}

/// Why a candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left after sanitizing.
    Empty,
    /// Contains disallowed constructs.
    Unsafe(Vec<Violation>),
    /// Does not parse in the artifact's grammar.
    Malformed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => f.write_str("empty candidate"),
            Rejection::Unsafe(found) => {
                let kinds = found
                    .iter()
                    .map(|v| format!("{} ({})", v.kind, v.pattern))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "unsafe candidate: {}", kinds)
            }
            Rejection::Malformed => f.write_str("candidate does not parse"),
        }
    }
}

/// Sanitize `candidate` and decide whether it may be used as a `format` artifact.
///
/// Safety is checked for every format; well-formedness only for formats with
/// a structurally checkable grammar.
pub fn review(candidate: &str, format: OutputFormat) -> Result<String, Rejection> {
    let cleaned = sanitize(candidate);
    if cleaned.is_empty() {
        return Err(Rejection::Empty);
    }
    let found = violations(&cleaned);
    if !found.is_empty() {
        return Err(Rejection::Unsafe(found));
    }
    if format.is_structurally_checkable() && !is_well_formed(&cleaned) {
        return Err(Rejection::Malformed);
    }
    Ok(cleaned)
}

// ============================================================================
// Tests
// ============================================================================
