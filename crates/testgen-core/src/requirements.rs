//! Requirement-identifier linking.
//!
//! A requirement identifier is the literal prefix `REQ-` followed by digits
//! (`REQ-101`). Linking is a two-phase lookup:
//!
//! 1. [`RequirementIndex::from_design`] indexes every design-document line that
//!    carries an identifier, once per run, preserving document order.
//! 2. [`RequirementIndex::lookup`] returns the identifier of the **first**
//!    indexed line whose text contains the declaration's simple name.
//!
//! The lookup is order-dependent by contract: when several lines mention the
//! same name, the earliest wins. Matching is plain substring containment, so a
//! short name (`add`) also matches inside longer words (`address`). This is a
//! known limitation of the heuristic and is kept as-is.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Serialize, Serializer};

/// Literal prefix of every requirement identifier.
pub const REQUIREMENT_PREFIX: &str = "REQ-";

/// Marker text used when no requirement could be linked.
pub const NO_REQUIREMENT: &str = "REQ-N/A";

/// Pattern for a single identifier anywhere in text.
pub fn requirement_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"REQ-\d+").expect("static regex"))
}

// ============================================================================
// Requirement Marker
// ============================================================================

/// Traceability marker carried by every skeleton unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequirementMarker {
    /// A concrete identifier such as `REQ-101`.
    Linked(String),
    /// No design line mentioned the declaration.
    Unlinked,
}

impl Serialize for RequirementMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl RequirementMarker {
    /// Text embedded in artifacts.
    pub fn as_str(&self) -> &str {
        match self {
            RequirementMarker::Linked(id) => id,
            RequirementMarker::Unlinked => NO_REQUIREMENT,
        }
    }

    /// True if a concrete identifier was linked.
    pub fn is_linked(&self) -> bool {
        matches!(self, RequirementMarker::Linked(_))
    }
}

impl fmt::Display for RequirementMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requirement Index
// ============================================================================

/// A design-document line that carries a requirement identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TaggedLine {
    text: String,
    /// First identifier on the line.
    id: String,
}

/// Requirement-tagged lines of a design document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementIndex {
    lines: Vec<TaggedLine>,
}

impl RequirementIndex {
    /// Index with no design document; every lookup yields [`RequirementMarker::Unlinked`].
    pub fn empty() -> Self {
        RequirementIndex::default()
    }

    /// Index every line of `design` that contains an identifier.
    pub fn from_design(design: &str) -> Self {
        let pattern = requirement_id_pattern();
        let lines = design
            .lines()
            .filter(|line| line.contains(REQUIREMENT_PREFIX))
            .filter_map(|line| {
                pattern.find(line).map(|m| TaggedLine {
                    text: line.to_string(),
                    id: m.as_str().to_string(),
                })
            })
            .collect();
        RequirementIndex { lines }
    }

    /// Build from an optional design text.
    pub fn from_optional_design(design: Option<&str>) -> Self {
        design.map(Self::from_design).unwrap_or_default()
    }

    /// Link a declaration's simple name to the first tagged line mentioning it.
    pub fn lookup(&self, simple_name: &str) -> RequirementMarker {
        if simple_name.is_empty() {
            return RequirementMarker::Unlinked;
        }
        self.lines
            .iter()
            .find(|line| line.text.contains(simple_name))
            .map(|line| RequirementMarker::Linked(line.id.clone()))
            .unwrap_or(RequirementMarker::Unlinked)
    }

    /// Number of indexed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if no line carries an identifier.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
