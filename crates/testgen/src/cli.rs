//! Command executors for the `testgen` binary.
//!
//! Each `run_*` function resolves configuration, drives the pipeline, and
//! returns a serializable payload plus any absorbed warnings. Rendering the
//! payload (text or JSON envelope) is left to the caller.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, TestgenError>`. Only fatal conditions
//! surface as errors: a missing source or artifact directory, a bad flag or
//! config value, or a failed write. Unparseable files and a missing design
//! document become warnings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use testgen_core::config::{CliOverrides, ResolvedConfig};
use testgen_core::output::Warning;
use testgen_core::provider::{build_provider, Provider};
use testgen_core::{Declaration, OutputFormat, TestgenError};
use testgen_python::evaluate::{write_report, MetricsReport};
use testgen_python::scanner::{scan_python_functions, ScanOutcome, SkipReason, SkippedFile};
use testgen_python::synthesize::{write_tests, ArtifactSummary, GenerateRequest};

/// Warning code: a source file contributed no declarations.
pub const W_FILE_SKIPPED: &str = "W001";
/// Warning code: the design document could not be read.
pub const W_DESIGN_UNAVAILABLE: &str = "W002";

// ============================================================================
// Payloads
// ============================================================================

/// Payload of `scan`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanData {
    /// Scanned root.
    pub source_root: String,
    /// Python files visited.
    pub files_scanned: usize,
    /// The catalog.
    pub declarations: Vec<Declaration>,
}

/// Payload of `generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateData {
    /// Scanned root.
    pub source_root: String,
    /// Artifact directory.
    pub out_dir: String,
    /// Artifact format.
    pub framework: OutputFormat,
    /// Resolved provider kind.
    pub provider: String,
    /// Declarations synthesized.
    pub declarations: usize,
    /// Artifact files written.
    pub files_written: usize,
    /// Per-file details.
    pub files: Vec<ArtifactSummary>,
    /// Units whose body came from the provider.
    pub provider_accepted: usize,
    /// Units rendered from the template.
    pub template_fallbacks: usize,
    /// Units linked to a requirement identifier.
    pub requirements_linked: usize,
}

/// Payload of `evaluate`.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateData {
    /// Where the report was written.
    pub report_path: String,
    /// The report itself.
    pub metrics: MetricsReport,
}

/// A payload together with absorbed warnings.
#[derive(Debug, Clone)]
pub struct CommandOutput<T> {
    /// Command-specific payload.
    pub data: T,
    /// Absorbed non-fatal conditions.
    pub warnings: Vec<Warning>,
}

// ============================================================================
// Commands
// ============================================================================

/// Scan `src` and return the declaration catalog.
pub fn run_scan(src: &Path, overrides: &CliOverrides) -> Result<CommandOutput<ScanData>, TestgenError> {
    let config = ResolvedConfig::resolve(Some(src), overrides)?;
    let outcome = scan_python_functions(src, &config.exclude_globs())?;
    let warnings = skipped_warnings(&outcome.skipped);

    Ok(CommandOutput {
        data: ScanData {
            source_root: src.display().to_string(),
            files_scanned: outcome.files_scanned,
            declarations: outcome.declarations,
        },
        warnings,
    })
}

/// Arguments of `generate`.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Source root to scan.
    pub src: PathBuf,
    /// Artifact directory.
    pub out: PathBuf,
    /// Optional design document.
    pub design: Option<PathBuf>,
    /// Flag overrides.
    pub overrides: CliOverrides,
}

/// Scan, synthesize, and write artifacts using the configured provider.
pub fn run_generate(args: &GenerateArgs) -> Result<CommandOutput<GenerateData>, TestgenError> {
    let config = ResolvedConfig::resolve(Some(&args.src), &args.overrides)?;
    let provider = build_provider(config.provider.value);
    generate_with(args, &config, provider.as_deref())
}

/// Like [`run_generate`], with an explicit provider in place of the configured one.
pub fn run_generate_with_provider(
    args: &GenerateArgs,
    provider: &dyn Provider,
) -> Result<CommandOutput<GenerateData>, TestgenError> {
    let config = ResolvedConfig::resolve(Some(&args.src), &args.overrides)?;
    generate_with(args, &config, Some(provider))
}

fn generate_with(
    args: &GenerateArgs,
    config: &ResolvedConfig,
    provider: Option<&dyn Provider>,
) -> Result<CommandOutput<GenerateData>, TestgenError> {
    let outcome: ScanOutcome = scan_python_functions(&args.src, &config.exclude_globs())?;
    let mut warnings = skipped_warnings(&outcome.skipped);

    let design = match args.design.as_deref() {
        Some(path) => read_design(path, &mut warnings),
        None => None,
    };

    let request = GenerateRequest {
        source_root: &args.src,
        out_dir: &args.out,
        format: config.framework.value,
        design: design.as_deref(),
        design_excerpt_chars: config.design_excerpt_chars.value,
    };
    let summary = write_tests(&outcome.declarations, &request, provider)?;

    Ok(CommandOutput {
        data: GenerateData {
            source_root: args.src.display().to_string(),
            out_dir: args.out.display().to_string(),
            framework: summary.format,
            provider: provider
                .map(|p| p.name().to_string())
                .unwrap_or_else(|| config.provider.value.to_string()),
            declarations: outcome.declarations.len(),
            files_written: summary.file_count(),
            files: summary.files,
            provider_accepted: summary.provider_accepted,
            template_fallbacks: summary.template_fallbacks,
            requirements_linked: summary.requirements_linked,
        },
        warnings,
    })
}

fn read_design(path: &Path, warnings: &mut Vec<Warning>) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "design document unavailable, no requirements linked");
            warnings.push(
                Warning::new(
                    W_DESIGN_UNAVAILABLE,
                    format!("design document unavailable: {}", e),
                )
                .with_file(path.display().to_string()),
            );
            None
        }
    }
}

/// Evaluate `tests` and persist the report at `out`.
pub fn run_evaluate(tests: &Path, out: &Path) -> Result<CommandOutput<EvaluateData>, TestgenError> {
    let metrics = write_report(tests, out)?;
    Ok(CommandOutput {
        data: EvaluateData {
            report_path: out.display().to_string(),
            metrics,
        },
        warnings: vec![],
    })
}

fn skipped_warnings(skipped: &[SkippedFile]) -> Vec<Warning> {
    skipped
        .iter()
        .map(|file| {
            let why = match file.reason {
                SkipReason::Unreadable => "file could not be read",
                SkipReason::ParseError => "file does not parse",
            };
            Warning::new(W_FILE_SKIPPED, why).with_file(file.relative_path.clone())
        })
        .collect()
}

// ============================================================================
// Text Rendering
// ============================================================================

/// One line per declaration: `module:qualname args=['a', 'b'] returns=int`.
pub fn format_scan(data: &ScanData) -> String {
    data.declarations
        .iter()
        .map(|d| {
            let args = d
                .parameters
                .iter()
                .map(|p| format!("'{}'", p))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{}:{} args=[{}] returns={}",
                d.module,
                d.qualified_name,
                args,
                d.return_annotation.as_deref().unwrap_or("None")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Generated N test file(s) in DIR`.
pub fn format_generate(data: &GenerateData) -> String {
    format!("Generated {} test file(s) in {}", data.files_written, data.out_dir)
}

/// `Wrote metrics to PATH: {...}` with the report as compact JSON.
pub fn format_evaluate(data: &EvaluateData) -> Result<String, TestgenError> {
    let json = serde_json::to_string(&data.metrics)
        .map_err(|e| TestgenError::internal(format!("cannot serialize report: {}", e)))?;
    Ok(format!("Wrote metrics to {}: {}", data.report_path, json))
}

/// Warnings as `warning: ...` lines for stderr.
pub fn format_warnings(warnings: &[Warning]) -> Vec<String> {
    warnings
        .iter()
        .map(|w| match &w.file {
            Some(file) => format!("warning: {}: {}", file, w.message),
            None => format!("warning: {}", w.message),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
