//! Binary entry point for the testgen CLI.
//!
//! ## Usage
//!
//! ```bash
//! # List the declaration catalog
//! testgen scan --src ./src
//!
//! # Write pytest skeletons linked to a design document
//! testgen generate --src ./src --out ./generated_tests --design ./design/requirements.md
//!
//! # Measure the generated artifacts
//! testgen evaluate --tests ./generated_tests --out ./reports/metrics.json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use testgen::cli::{
    format_evaluate, format_generate, format_scan, format_warnings, run_evaluate, run_generate,
    run_scan, CommandOutput, GenerateArgs,
};
use testgen_core::config::CliOverrides;
use testgen_core::output::{emit_response, ErrorResponse, JsonResponse};
use testgen_core::{OutputFormat, TestgenError};

// ============================================================================
// CLI Structure
// ============================================================================

/// Generate traceable test skeletons for Python code.
#[derive(Parser, Debug)]
#[command(
    name = "testgen",
    version,
    about = "Generate traceable pytest / Robot Framework test skeletons for Python code"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Emit a JSON envelope on stdout instead of text.
    #[arg(long, global = true)]
    json: bool,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Artifact flavour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Framework {
    /// pytest modules.
    Pytest,
    /// Robot Framework suites.
    Robot,
}

impl From<Framework> for OutputFormat {
    fn from(framework: Framework) -> Self {
        match framework {
            Framework::Pytest => OutputFormat::Pytest,
            Framework::Robot => OutputFormat::Robot,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the functions and methods found under a source tree.
    Scan {
        /// Source root to scan.
        #[arg(long)]
        src: PathBuf,

        /// Glob of relative paths to skip (repeatable).
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,
    },

    /// Write one test artifact per source module.
    Generate {
        /// Source root to scan.
        #[arg(long)]
        src: PathBuf,

        /// Directory to write artifacts into.
        #[arg(long)]
        out: PathBuf,

        /// Design document with requirement identifiers.
        #[arg(long)]
        design: Option<PathBuf>,

        /// Artifact flavour (default from config, else pytest).
        #[arg(long, value_enum)]
        framework: Option<Framework>,

        /// Provider backend name (overrides LLM_PROVIDER).
        #[arg(long)]
        provider: Option<String>,

        /// Glob of relative paths to skip (repeatable).
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,
    },

    /// Measure validity and traceability of a directory of artifacts.
    Evaluate {
        /// Directory of generated artifacts.
        #[arg(long)]
        tests: PathBuf,

        /// Where to write the JSON report.
        #[arg(long, default_value = "metrics.json")]
        out: PathBuf,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Scan { .. } => "scan",
            Command::Generate { .. } => "generate",
            Command::Evaluate { .. } => "evaluate",
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    let command = cli.command.name();
    let json = cli.global.json;
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                let response = ErrorResponse::new(command, &err);
                let _ = emit_response(&response, &mut io::stdout());
                let _ = io::stdout().flush();
            } else {
                eprintln!("error: {}", err);
            }
            ExitCode::from(err.error_code().code())
        }
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TestgenError> {
    let json = cli.global.json;
    match cli.command {
        Command::Scan { src, exclude } => {
            let overrides = CliOverrides {
                exclude_patterns: exclude,
                ..CliOverrides::default()
            };
            let output = run_scan(&src, &overrides)?;
            let text = format_scan(&output.data);
            respond("scan", json, output, text)
        }
        Command::Generate {
            src,
            out,
            design,
            framework,
            provider,
            exclude,
        } => {
            let args = GenerateArgs {
                src,
                out,
                design,
                overrides: CliOverrides {
                    provider,
                    framework: framework.map(OutputFormat::from),
                    exclude_patterns: exclude,
                },
            };
            let output = run_generate(&args)?;
            let text = format_generate(&output.data);
            respond("generate", json, output, text)
        }
        Command::Evaluate { tests, out } => {
            let output = run_evaluate(&tests, &out)?;
            let text = format_evaluate(&output.data)?;
            respond("evaluate", json, output, text)
        }
    }
}

/// Print either the JSON envelope or the text rendering plus warnings.
fn respond<T: Serialize>(
    command: &str,
    json: bool,
    output: CommandOutput<T>,
    text: String,
) -> Result<(), TestgenError> {
    let mut stdout = io::stdout();
    let written = if json {
        let response = JsonResponse::ok_with_warnings(command, output.data, output.warnings);
        emit_response(&response, &mut stdout)
    } else {
        for line in format_warnings(&output.warnings) {
            eprintln!("{}", line);
        }
        if text.is_empty() {
            Ok(())
        } else {
            writeln!(stdout, "{}", text)
        }
    };
    written
        .and_then(|()| stdout.flush())
        .map_err(|e| TestgenError::internal(format!("failed to write output: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================
