//! Argument synthesis from annotation text.
//!
//! Every parameter maps to exactly one placeholder literal, chosen by
//! case-insensitive keyword search over its annotation. Keywords are checked
//! in a fixed order so that container types win over their element types
//! (`Dict[str, int]` is a mapping, `List[bool]` is a sequence).

use std::fmt;

use serde::Serialize;

/// A placeholder argument value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgLiteral {
    /// `1`
    Int,
    /// `0.5`
    Float,
    /// `"x"`
    Str,
    /// `True`
    Bool,
    /// `[]`
    Sequence,
    /// `{}`
    Mapping,
    /// `0`, used when the annotation is absent or unrecognized.
    Fallback,
}

/// Keyword table in match order.
const KEYWORDS: &[(&str, ArgLiteral)] = &[
    ("dict", ArgLiteral::Mapping),
    ("mapping", ArgLiteral::Mapping),
    ("list", ArgLiteral::Sequence),
    ("sequence", ArgLiteral::Sequence),
    ("tuple", ArgLiteral::Sequence),
    ("bool", ArgLiteral::Bool),
    ("float", ArgLiteral::Float),
    ("decimal", ArgLiteral::Float),
    ("int", ArgLiteral::Int),
    ("str", ArgLiteral::Str),
];

impl ArgLiteral {
    /// Choose the literal for an annotation.
    pub fn for_annotation(annotation: Option<&str>) -> Self {
        let Some(annotation) = annotation else {
            return ArgLiteral::Fallback;
        };
        let lowered = annotation.to_ascii_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, literal)| *literal)
            .unwrap_or(ArgLiteral::Fallback)
    }

    /// Python source text of the literal.
    pub fn python(&self) -> &'static str {
        match self {
            ArgLiteral::Int => "1",
            ArgLiteral::Float => "0.5",
            ArgLiteral::Str => "\"x\"",
            ArgLiteral::Bool => "True",
            ArgLiteral::Sequence => "[]",
            ArgLiteral::Mapping => "{}",
            ArgLiteral::Fallback => "0",
        }
    }

    /// Robot Framework argument text of the literal.
    ///
    /// Plain words are strings in Robot, so every non-string value uses
    /// variable syntax to keep its Python type.
    pub fn robot(&self) -> &'static str {
        match self {
            ArgLiteral::Int => "${1}",
            ArgLiteral::Float => "${0.5}",
            ArgLiteral::Str => "x",
            ArgLiteral::Bool => "${True}",
            ArgLiteral::Sequence => "${{ [] }}",
            ArgLiteral::Mapping => "${{ {} }}",
            ArgLiteral::Fallback => "${0}",
        }
    }
}

impl fmt::Display for ArgLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.python())
    }
}
