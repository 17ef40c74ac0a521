//! Configuration types for Evol.
//!
//! - [`EvolConfig`]: user-level configuration stored in `~/.evol/config.yaml`
//! - [`PipelineLimits`]: target defaults and excerpt sizes used by the phases
//!
//! Generation backend settings reuse [`evol_model::GenerationConfig`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use evol_model::GenerationConfig;

use crate::errors::EvolError;
use crate::model_adapter::from_model_error;

// ======================================================================
// Constants
// ======================================================================

/// Smallest accepted target question count.
pub const MIN_TARGET_QUESTIONS: usize = 3;

/// Largest accepted target question count.
pub const MAX_TARGET_QUESTIONS: usize = 15;

/// Target used when a request does not name one.
pub const DEFAULT_TARGET_QUESTIONS: usize = 9;

/// Characters of a document shown to the seed prompt.
pub const DEFAULT_SEED_EXCERPT_CHARS: usize = 1500;

/// Characters per document in the combined multi-context excerpt.
pub const DEFAULT_MULTI_CONTEXT_EXCERPT_CHARS: usize = 800;

/// Characters of the source document shown to the reasoning prompt.
pub const DEFAULT_REASONING_EXCERPT_CHARS: usize = 1000;

/// Characters per document in the answer context.
pub const DEFAULT_ANSWER_EXCERPT_CHARS: usize = 1000;

/// Prefix length used when no chunk is relevant.
pub const DEFAULT_CONTEXT_FALLBACK_CHARS: usize = 300;

/// Documents combined for a multi-document prompt.
pub const MAX_COMBINED_DOCUMENTS: usize = 3;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "EVOL_CONFIG";

// ============================================================================
// PipelineLimits
// ============================================================================

/// Sizes and defaults the phases read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineLimits {
    /// Target used when a request omits one.
    #[serde(default = "default_target_questions")]
    pub default_target_questions: usize,

    #[serde(default = "default_seed_excerpt_chars")]
    pub seed_excerpt_chars: usize,

    #[serde(default = "default_multi_context_excerpt_chars")]
    pub multi_context_excerpt_chars: usize,

    #[serde(default = "default_reasoning_excerpt_chars")]
    pub reasoning_excerpt_chars: usize,

    #[serde(default = "default_answer_excerpt_chars")]
    pub answer_excerpt_chars: usize,

    /// Fallback prefix for context extraction.
    #[serde(default = "default_context_fallback_chars")]
    pub context_fallback_chars: usize,
}

fn default_target_questions() -> usize {
    DEFAULT_TARGET_QUESTIONS
}
fn default_seed_excerpt_chars() -> usize {
    DEFAULT_SEED_EXCERPT_CHARS
}
fn default_multi_context_excerpt_chars() -> usize {
    DEFAULT_MULTI_CONTEXT_EXCERPT_CHARS
}
fn default_reasoning_excerpt_chars() -> usize {
    DEFAULT_REASONING_EXCERPT_CHARS
}
fn default_answer_excerpt_chars() -> usize {
    DEFAULT_ANSWER_EXCERPT_CHARS
}
fn default_context_fallback_chars() -> usize {
    DEFAULT_CONTEXT_FALLBACK_CHARS
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            default_target_questions: DEFAULT_TARGET_QUESTIONS,
            seed_excerpt_chars: DEFAULT_SEED_EXCERPT_CHARS,
            multi_context_excerpt_chars: DEFAULT_MULTI_CONTEXT_EXCERPT_CHARS,
            reasoning_excerpt_chars: DEFAULT_REASONING_EXCERPT_CHARS,
            answer_excerpt_chars: DEFAULT_ANSWER_EXCERPT_CHARS,
            context_fallback_chars: DEFAULT_CONTEXT_FALLBACK_CHARS,
        }
    }
}

impl PipelineLimits {
    /// Validate the limits.
    ///
    /// Returns warnings for unusual values, or an error for values the
    /// pipeline cannot run with.
    pub fn validate(&self) -> Result<Vec<String>, EvolError> {
        let mut warnings = Vec::new();

        if !(MIN_TARGET_QUESTIONS..=MAX_TARGET_QUESTIONS).contains(&self.default_target_questions) {
            return Err(EvolError::InvalidConfiguration {
                message: format!(
                    "pipeline.defaultTargetQuestions={} is out of range",
                    self.default_target_questions
                ),
                hint: format!(
                    "Set defaultTargetQuestions between {} and {}",
                    MIN_TARGET_QUESTIONS, MAX_TARGET_QUESTIONS
                ),
            });
        }

        let excerpts = [
            ("seedExcerptChars", self.seed_excerpt_chars),
            ("multiContextExcerptChars", self.multi_context_excerpt_chars),
            ("reasoningExcerptChars", self.reasoning_excerpt_chars),
            ("answerExcerptChars", self.answer_excerpt_chars),
            ("contextFallbackChars", self.context_fallback_chars),
        ];
        for (name, value) in excerpts {
            if value == 0 {
                return Err(EvolError::InvalidConfiguration {
                    message: format!("pipeline.{} cannot be 0", name),
                    hint: format!("Set {} to at least 1", name),
                });
            }
            if value < 100 {
                warnings.push(format!(
                    "pipeline.{}={} is very small; prompts will see little document text",
                    name, value
                ));
            }
        }

        if self.default_target_questions % 3 != 0 {
            warnings.push(format!(
                "pipeline.defaultTargetQuestions={} is not a multiple of 3; runs will produce fewer questions",
                self.default_target_questions
            ));
        }

        Ok(warnings)
    }
}

// ============================================================================
// EvolConfig
// ============================================================================

/// User-level configuration for Evol.
///
/// # Example YAML
///
/// ```yaml
/// generation:
///   provider: ollama
///   model: llama3.2
///   endpoint: http://localhost:11434
///   temperature: 0.7
///   maxTokens: 1000
///
/// pipeline:
///   defaultTargetQuestions: 9
///   seedExcerptChars: 1500
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolConfig {
    /// Text-generation backend.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Phase limits and defaults.
    #[serde(default)]
    pub pipeline: PipelineLimits,
}

impl EvolConfig {
    /// Load from `$EVOL_CONFIG` or `~/.evol/config.yaml`.
    ///
    /// A missing file yields the defaults.
    pub fn load_default() -> Result<Self, EvolError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Self::from_path(Path::new(&path));
            }
        }
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path.
    ///
    /// If the file does not exist, returns a default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvolError::InvalidConfig`] if the file exists but cannot be parsed.
    /// Returns [`EvolError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, EvolError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            EvolError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&content)
            .map_err(|e| match e {
                EvolError::InvalidConfig(msg) => {
                    EvolError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), msg))
                }
                other => other,
            })
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, EvolError> {
        // An empty file deserializes to unit; treat it as defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self =
            serde_yaml::from_str(content).map_err(|e| EvolError::InvalidConfig(e.to_string()))?;

        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Default config directory (`~/.evol`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".evol"))
    }

    /// Default config file path (`~/.evol/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join("config.yaml"))
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<Vec<String>, EvolError> {
        self.generation.validate().map_err(from_model_error)?;

        let mut warnings = self.pipeline.validate()?;

        if self.generation.temperature > 1.5 {
            warnings.push(format!(
                "generation.temperature={} is high; questions may drift off-topic",
                self.generation.temperature
            ));
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evol_model::GenerationProviderKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = EvolConfig::default();
        assert_eq!(config.pipeline.default_target_questions, 9);
        assert_eq!(config.pipeline.seed_excerpt_chars, 1500);
        assert_eq!(config.generation.provider, GenerationProviderKind::OpenAi);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
generation:
  provider: ollama
  model: llama3.2
  temperature: 0.2
pipeline:
  defaultTargetQuestions: 6
  contextFallbackChars: 250
"#;
        let config = EvolConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.generation.provider, GenerationProviderKind::Ollama);
        assert_eq!(config.generation.effective_model(), "llama3.2");
        assert_eq!(config.pipeline.default_target_questions, 6);
        assert_eq!(config.pipeline.context_fallback_chars, 250);
        assert_eq!(config.pipeline.answer_excerpt_chars, 1000);
    }

    #[test]
    fn test_config_missing_file() {
        let config = EvolConfig::from_path(Path::new("/nonexistent/evol/config.yaml")).unwrap();
        assert_eq!(config.pipeline, PipelineLimits::default());
    }

    #[test]
    fn test_config_empty_file_is_default() {
        let config = EvolConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.pipeline, PipelineLimits::default());
    }

    #[test]
    fn test_config_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "generation: [not, a, map").unwrap();

        let err = EvolConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, EvolError::InvalidConfig(_)));
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_limits_reject_zero_excerpt() {
        let limits = PipelineLimits {
            seed_excerpt_chars: 0,
            ..Default::default()
        };
        let err = limits.validate().unwrap_err();
        assert!(err.to_string().contains("seedExcerptChars cannot be 0"));
    }

    #[test]
    fn test_limits_reject_target_out_of_range() {
        let limits = PipelineLimits {
            default_target_questions: 20,
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(EvolError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_limits_warn_on_uneven_target() {
        let limits = PipelineLimits {
            default_target_questions: 10,
            ..Default::default()
        };
        let warnings = limits.validate().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not a multiple of 3"));
    }

    #[test]
    fn test_config_rejects_bad_temperature() {
        let yaml = "generation:\n  temperature: 3.5\n";
        assert!(EvolConfig::from_yaml(yaml).is_err());
    }
}
