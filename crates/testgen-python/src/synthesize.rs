//! Skeleton synthesis and artifact writing.
//!
//! For each declaration the [`Synthesizer`] runs a two-step stage:
//!
//! 1. **Attempt**: if a provider is configured, build a prompt and ask for a
//!    candidate; a non-empty candidate goes through [`guardrail::review`].
//! 2. **Fallback**: otherwise render the rule-based skeleton for the
//!    declaration's [`SkeletonUnit`].
//!
//! Units are grouped by module, in catalog order, into one artifact file per
//! module. Writing overwrites by file name, so identical input produces
//! byte-identical output.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use testgen_core::provider::Provider;
use testgen_core::requirements::{RequirementIndex, RequirementMarker};
use testgen_core::{Declaration, OutputFormat, TestgenError};

use crate::guardrail;
use crate::prompt::build_prompt;
use crate::render::{renderer_for, SkeletonRenderer};
use crate::skeleton::SkeletonUnit;

// ============================================================================
// Errors
// ============================================================================

/// Error writing artifacts.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The output directory could not be created or resolved.
    #[error("cannot prepare output directory {path}: {source}")]
    OutputDir { path: PathBuf, source: io::Error },

    /// An artifact could not be written.
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl From<SynthesisError> for TestgenError {
    fn from(err: SynthesisError) -> Self {
        match &err {
            SynthesisError::OutputDir { path, source } | SynthesisError::Write { path, source } => {
                TestgenError::write(path.display().to_string(), source)
            }
        }
    }
}

// ============================================================================
// Units
// ============================================================================

/// Where a unit's body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitOrigin {
    /// Accepted provider candidate.
    Provider,
    /// Rule-based skeleton.
    Template,
}

/// One synthesized unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedUnit {
    /// Qualified name of the declaration.
    pub qualified_name: String,
    /// Artifact text for the unit.
    pub body: String,
    /// Where the body came from.
    pub origin: UnitOrigin,
    /// Linked requirement.
    pub requirement: RequirementMarker,
}

/// Turns declarations into units.
pub struct Synthesizer<'a> {
    renderer: Box<dyn SkeletonRenderer>,
    provider: Option<&'a dyn Provider>,
    requirements: RequirementIndex,
    design: Option<&'a str>,
    excerpt_chars: usize,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer.
    ///
    /// The requirement index is built here, once, from `design`.
    pub fn new(
        renderer: Box<dyn SkeletonRenderer>,
        provider: Option<&'a dyn Provider>,
        design: Option<&'a str>,
        excerpt_chars: usize,
    ) -> Self {
        Synthesizer {
            renderer,
            provider,
            requirements: RequirementIndex::from_optional_design(design),
            design,
            excerpt_chars,
        }
    }

    /// Output format of produced units.
    pub fn format(&self) -> OutputFormat {
        self.renderer.format()
    }

    /// Produce exactly one unit for `decl`.
    pub fn synthesize(&self, decl: &Declaration) -> SynthesizedUnit {
        let unit = SkeletonUnit::from_declaration(decl, &self.requirements);

        if let Some(body) = self.attempt_provider(decl) {
            return SynthesizedUnit {
                qualified_name: decl.qualified_name.clone(),
                body,
                origin: UnitOrigin::Provider,
                requirement: unit.requirement,
            };
        }

        SynthesizedUnit {
            qualified_name: decl.qualified_name.clone(),
            body: self.renderer.render(&unit),
            origin: UnitOrigin::Template,
            requirement: unit.requirement,
        }
    }

    fn attempt_provider(&self, decl: &Declaration) -> Option<String> {
        let provider = self.provider?;
        let prompt = build_prompt(decl, self.design, self.format(), self.excerpt_chars);

        let Some(candidate) = provider.generate(&prompt).filter(|c| !c.trim().is_empty()) else {
            debug!(
                provider = provider.name(),
                target = %decl.qualified_name,
                "provider returned nothing, using template"
            );
            return None;
        };

        match guardrail::review(&candidate, self.format()) {
            Ok(body) => Some(body),
            Err(rejection) => {
                debug!(
                    provider = provider.name(),
                    target = %decl.qualified_name,
                    reason = %rejection,
                    "guardrail rejected candidate, using template"
                );
                None
            }
        }
    }
}

// ============================================================================
// Artifact Files
// ============================================================================

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    /// Scanned source root.
    pub source_root: &'a Path,
    /// Directory receiving artifacts.
    pub out_dir: &'a Path,
    /// Artifact format.
    pub format: OutputFormat,
    /// Design document text, if any.
    pub design: Option<&'a str>,
    /// Characters of the design document included in prompts.
    pub design_excerpt_chars: usize,
}

/// A written artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    /// Source module.
    pub module: String,
    /// File path written.
    pub path: String,
    /// Number of units in the file.
    pub units: usize,
    /// Hex SHA-256 of the file content.
    pub sha256: String,
}

/// Result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    /// Artifact format.
    pub format: OutputFormat,
    /// Output directory.
    pub out_dir: String,
    /// Files written, in first-appearance order of their modules.
    pub files: Vec<ArtifactSummary>,
    /// Total units across files.
    pub units_total: usize,
    /// Units whose body came from the provider.
    pub provider_accepted: usize,
    /// Units rendered from the template.
    pub template_fallbacks: usize,
    /// Units linked to a concrete requirement identifier.
    pub requirements_linked: usize,
}

impl GenerateSummary {
    /// Number of artifact files written.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Synthesize and write one artifact file per module.
pub fn write_tests(
    declarations: &[Declaration],
    request: &GenerateRequest<'_>,
    provider: Option<&dyn Provider>,
) -> Result<GenerateSummary, SynthesisError> {
    fs::create_dir_all(request.out_dir).map_err(|source| SynthesisError::OutputDir {
        path: request.out_dir.to_path_buf(),
        source,
    })?;

    let source_path = import_path(request.source_root, request.out_dir)?;
    let synthesizer = Synthesizer::new(
        renderer_for(request.format, &source_path),
        provider,
        request.design,
        request.design_excerpt_chars,
    );

    let mut summary = GenerateSummary {
        format: request.format,
        out_dir: request.out_dir.display().to_string(),
        files: Vec::new(),
        units_total: 0,
        provider_accepted: 0,
        template_fallbacks: 0,
        requirements_linked: 0,
    };

    for (module, decls) in group_by_module(declarations) {
        let units: Vec<SynthesizedUnit> = decls.iter().map(|d| synthesizer.synthesize(d)).collect();
        for unit in &units {
            match unit.origin {
                UnitOrigin::Provider => summary.provider_accepted += 1,
                UnitOrigin::Template => summary.template_fallbacks += 1,
            }
            if unit.requirement.is_linked() {
                summary.requirements_linked += 1;
            }
        }

        let content = assemble(&units);
        let path = request.out_dir.join(request.format.artifact_file_name(module));
        fs::write(&path, &content).map_err(|source| SynthesisError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), units = units.len(), "wrote artifact");

        summary.units_total += units.len();
        summary.files.push(ArtifactSummary {
            module: module.to_string(),
            path: path.display().to_string(),
            units: units.len(),
            sha256: hex::encode(Sha256::digest(content.as_bytes())),
        });
    }

    Ok(summary)
}

/// Group declarations by module, modules in first-appearance order.
pub fn group_by_module(declarations: &[Declaration]) -> Vec<(&str, Vec<&Declaration>)> {
    let mut groups: Vec<(&str, Vec<&Declaration>)> = Vec::new();
    for decl in declarations {
        match groups.iter_mut().find(|(module, _)| *module == decl.module) {
            Some((_, members)) => members.push(decl),
            None => groups.push((decl.module.as_str(), vec![decl])),
        }
    }
    groups
}

/// Join unit bodies with two blank lines and end with one newline.
fn assemble(units: &[SynthesizedUnit]) -> String {
    let mut content = units
        .iter()
        .map(|u| u.body.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n\n");
    content.push('\n');
    content
}

/// Path of `source_root` relative to `out_dir`, `/`-separated.
///
/// Falls back to the absolute source root when no relative path exists.
fn import_path(source_root: &Path, out_dir: &Path) -> Result<String, SynthesisError> {
    let out = out_dir
        .canonicalize()
        .map_err(|source| SynthesisError::OutputDir {
            path: out_dir.to_path_buf(),
            source,
        })?;
    let src = source_root
        .canonicalize()
        .unwrap_or_else(|_| source_root.to_path_buf());

    Ok(match relative_to(&src, &out) {
        Some(rel) => to_slash(&rel),
        None => to_slash(&src),
    })
}

fn relative_to(target: &Path, base: &Path) -> Option<PathBuf> {
    let target: Vec<Component<'_>> = target.components().collect();
    let base: Vec<Component<'_>> = base.components().collect();
    if target.first() != base.first() {
        return None;
    }

    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

// ============================================================================
// Tests
// ============================================================================
