//! Generative provider seam.
//!
//! A [`Provider`] turns a prompt into a candidate artifact body, or returns
//! `None` to say "unavailable". The synthesizer never treats `None` as an
//! error: it is the signal to fall back to the rule-based template.
//!
//! Provider selection is a closed set ([`ProviderKind`]). Configuration strings
//! that name no known backend resolve to [`ProviderKind::Unconfigured`].
//! Network clients for the known kinds are not part of this crate; until one
//! is linked in, [`build_provider`] returns an [`UnavailableProvider`] for them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Provider Trait
// ============================================================================

/// A blocking text generator.
///
/// Implementations own their latency, retry, and cost policy. Callers that
/// need a bound on latency wrap the provider themselves.
pub trait Provider {
    /// Generate a candidate body for `prompt`, or `None` if unavailable.
    fn generate(&self, prompt: &str) -> Option<String>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Provider that is never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl Provider for NullProvider {
    fn generate(&self, _prompt: &str) -> Option<String> {
        None
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// A known backend kind whose client is not linked into this build.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableProvider {
    kind: ProviderKind,
}

impl UnavailableProvider {
    /// Create a placeholder for `kind`.
    pub fn new(kind: ProviderKind) -> Self {
        UnavailableProvider { kind }
    }
}

impl Provider for UnavailableProvider {
    fn generate(&self, _prompt: &str) -> Option<String> {
        debug!(provider = %self.kind, "provider backend not linked, no candidate");
        None
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }
}

/// Adapts a closure into a [`Provider`].
///
/// ```
/// use testgen_core::provider::{FnProvider, Provider};
///
/// let canned = FnProvider::new(|_prompt: &str| Some("def test_x():\n    pass\n".to_string()));
/// assert!(canned.generate("anything").is_some());
/// ```
pub struct FnProvider<F> {
    func: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Wrap `func`.
    pub fn new(func: F) -> Self {
        FnProvider { func }
    }
}

impl<F> Provider for FnProvider<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn generate(&self, prompt: &str) -> Option<String> {
        (self.func)(prompt)
    }
}

// ============================================================================
// Provider Kind
// ============================================================================

/// Known provider backends plus the unconfigured state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// No provider; always use the rule-based template.
    #[default]
    Unconfigured,
    /// OpenAI-compatible chat completion endpoint.
    OpenAi,
    /// Hugging Face inference endpoint.
    HuggingFace,
    /// Local Ollama server.
    Ollama,
}

impl ProviderKind {
    /// Resolve a configuration value. Unknown or empty values are `Unconfigured`.
    pub fn from_config(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => ProviderKind::OpenAi,
            "huggingface" | "hf" => ProviderKind::HuggingFace,
            "ollama" => ProviderKind::Ollama,
            _ => ProviderKind::Unconfigured,
        }
    }

    /// Canonical configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Unconfigured => "none",
            ProviderKind::OpenAi => "openai",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// True for every kind except `Unconfigured`.
    pub fn is_configured(&self) -> bool {
        !matches!(self, ProviderKind::Unconfigured)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the provider for a configured kind.
///
/// Returns `None` for [`ProviderKind::Unconfigured`] so the synthesizer skips
/// prompt construction entirely.
pub fn build_provider(kind: ProviderKind) -> Option<Box<dyn Provider>> {
    if !kind.is_configured() {
        return None;
    }
    Some(Box::new(UnavailableProvider::new(kind)))
}

// ============================================================================
// Tests
// ============================================================================
