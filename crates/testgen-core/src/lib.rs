//! Core infrastructure for testgen.
//!
//! This crate provides the language-agnostic pieces of the pipeline:
//! - The declaration record produced by scanners
//! - Output formats and artifact naming
//! - Requirement-identifier indexing over a design document
//! - The generative provider seam
//! - Layered configuration
//! - Error types, exit codes, and JSON output envelopes

pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod requirements;
pub mod types;

pub use error::{OutputErrorCode, TestgenError};
pub use types::{Declaration, OutputFormat};
