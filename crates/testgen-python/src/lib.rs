//! Python language support for testgen.
//!
//! The pipeline, leaf first:
//!
//! - [`scanner`]: source tree to declaration catalog (tree-sitter)
//! - [`guardrail`]: safety and well-formedness gate for candidate bodies
//! - [`synthesize`]: declarations to artifact files, provider-assisted or
//!   rule-based, through the shared [`skeleton`] model and the [`render`]ers
//! - [`evaluate`]: artifact directory to metrics report

pub mod args;
pub mod evaluate;
pub mod files;
pub mod guardrail;
pub mod prompt;
pub mod render;
pub mod scanner;
pub mod skeleton;
pub mod synthesize;
pub mod syntax;

pub use evaluate::{evaluate_dir, write_report, MetricsReport};
pub use scanner::{scan_python_functions, ScanOutcome};
pub use synthesize::{write_tests, GenerateRequest, GenerateSummary};
