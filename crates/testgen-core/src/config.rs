//! Layered configuration.
//!
//! Values resolve in order of increasing precedence:
//!
//! 1. Built-in defaults
//! 2. Project config: `testgen.toml` in the scanned source root, `[testgen]` table
//! 3. Environment variables (`LLM_PROVIDER`, `TESTGEN_FRAMEWORK`)
//! 4. CLI flags
//!
//! Every resolved value remembers where it came from ([`ConfigValue::source`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderKind;
use crate::types::OutputFormat;

/// File name of the project config, looked up in the source root.
pub const PROJECT_CONFIG_FILE: &str = "testgen.toml";

/// Environment variable naming the provider backend.
pub const ENV_PROVIDER: &str = "LLM_PROVIDER";

/// Environment variable naming the output format.
pub const ENV_FRAMEWORK: &str = "TESTGEN_FRAMEWORK";

/// Default number of design-document characters fed into a prompt.
pub const DEFAULT_DESIGN_EXCERPT_CHARS: usize = 2000;

// ============================================================================
// Errors
// ============================================================================

/// Error raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The project config file exists but could not be read.
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// The project config file is not valid TOML for the expected schema.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A framework name that is neither `pytest` nor `robot`.
    #[error("unknown framework '{value}' from {source_name}")]
    UnknownFramework { value: String, source_name: String },
}

// ============================================================================
// Config Values
// ============================================================================

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `testgen.toml`.
    ProjectConfig = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

// ============================================================================
// Project Config File
// ============================================================================

/// Contents of `testgen.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// The `[testgen]` table.
    #[serde(default)]
    pub testgen: ProjectSettings,
}

/// Settings under `[testgen]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSettings {
    /// Provider kind name.
    pub provider: Option<String>,
    /// Output format name.
    pub framework: Option<String>,
    /// Design excerpt limit for prompts.
    pub design_excerpt_chars: Option<usize>,
    /// Extra exclusion globs for scanning.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `testgen.toml` from `root` if present, else an empty config.
    pub fn load_from_root(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(PROJECT_CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(ProjectConfig::default())
        }
    }
}

// ============================================================================
// Resolved Config
// ============================================================================

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// `--provider`.
    pub provider: Option<String>,
    /// `--framework`.
    pub framework: Option<OutputFormat>,
    /// `--exclude` (repeatable).
    pub exclude_patterns: Vec<String>,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Provider backend.
    pub provider: ConfigValue<ProviderKind>,
    /// Artifact format.
    pub framework: ConfigValue<OutputFormat>,
    /// Characters of the design document included in prompts.
    pub design_excerpt_chars: ConfigValue<usize>,
    /// Extra scan exclusions, project patterns first.
    pub exclude_patterns: Vec<ConfigValue<String>>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            provider: ConfigValue::new(ProviderKind::Unconfigured, ConfigSource::Default),
            framework: ConfigValue::new(OutputFormat::Pytest, ConfigSource::Default),
            design_excerpt_chars: ConfigValue::new(
                DEFAULT_DESIGN_EXCERPT_CHARS,
                ConfigSource::Default,
            ),
            exclude_patterns: Vec::new(),
        }
    }
}

impl ResolvedConfig {
    /// Resolve configuration from all sources using the process environment.
    pub fn resolve(
        source_root: Option<&Path>,
        overrides: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with_env(source_root, overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve_with_env(
        source_root: Option<&Path>,
        overrides: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = ResolvedConfig::default();

        if let Some(root) = source_root {
            let project = ProjectConfig::load_from_root(root)?;
            config.apply_project_config(&project.testgen, &root.join(PROJECT_CONFIG_FILE))?;
        }

        config.apply_env_vars(env)?;
        config.apply_cli_overrides(overrides);

        Ok(config)
    }

    fn apply_project_config(
        &mut self,
        settings: &ProjectSettings,
        path: &Path,
    ) -> Result<(), ConfigError> {
        if let Some(ref provider) = settings.provider {
            self.provider = self.provider.clone().merge(ConfigValue::new(
                ProviderKind::from_config(provider),
                ConfigSource::ProjectConfig,
            ));
        }

        if let Some(ref framework) = settings.framework {
            let format = parse_framework(framework, &path.display().to_string())?;
            self.framework = self
                .framework
                .clone()
                .merge(ConfigValue::new(format, ConfigSource::ProjectConfig));
        }

        if let Some(chars) = settings.design_excerpt_chars {
            self.design_excerpt_chars = self
                .design_excerpt_chars
                .clone()
                .merge(ConfigValue::new(chars, ConfigSource::ProjectConfig));
        }

        self.exclude_patterns.extend(
            settings
                .exclude
                .iter()
                .map(|p| ConfigValue::new(p.clone(), ConfigSource::ProjectConfig)),
        );

        Ok(())
    }

    fn apply_env_vars(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(provider) = env(ENV_PROVIDER) {
            self.provider = ConfigValue::new(ProviderKind::from_config(&provider), ConfigSource::EnvVar);
        }

        if let Some(framework) = env(ENV_FRAMEWORK).filter(|v| !v.trim().is_empty()) {
            let format = parse_framework(&framework, ENV_FRAMEWORK)?;
            self.framework = ConfigValue::new(format, ConfigSource::EnvVar);
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(ref provider) = overrides.provider {
            self.provider =
                ConfigValue::new(ProviderKind::from_config(provider), ConfigSource::CliFlag);
        }

        if let Some(framework) = overrides.framework {
            self.framework = ConfigValue::new(framework, ConfigSource::CliFlag);
        }

        self.exclude_patterns.extend(
            overrides
                .exclude_patterns
                .iter()
                .map(|p| ConfigValue::new(p.clone(), ConfigSource::CliFlag)),
        );
    }

    /// Exclusion patterns as plain strings.
    pub fn exclude_globs(&self) -> Vec<String> {
        self.exclude_patterns.iter().map(|p| p.value.clone()).collect()
    }
}

fn parse_framework(value: &str, source_name: &str) -> Result<OutputFormat, ConfigError> {
    value
        .parse::<OutputFormat>()
        .map_err(|_| ConfigError::UnknownFramework {
            value: value.to_string(),
            source_name: source_name.to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
