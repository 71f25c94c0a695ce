//! testgen library crate.
//!
//! Command executors behind the `testgen` binary. The pipeline itself lives
//! in `testgen-python`; configuration and output envelopes in `testgen-core`.

pub mod cli;

pub use testgen_core::{OutputErrorCode, OutputFormat, TestgenError};
