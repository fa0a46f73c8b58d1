//! Configuration loader
//!
//! `defaults/endoscore.default.toml` is embedded into the crate so the library
//! and the binary share one source of truth for every vocabulary, budget and
//! window. Callers layer their own TOML files and single-key overrides on top
//! via [`Loader`] before deserializing into [`EndoscoreConfig`].

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../defaults/endoscore.default.toml");

static DEFAULTS: Lazy<EndoscoreConfig> = Lazy::new(|| {
    load_defaults().expect("embedded endoscore.default.toml must deserialize and validate")
});

/// Errors raised while loading configuration or compiling its vocabularies.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Top-level configuration consumed by the extractors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndoscoreConfig {
    pub tokenizer: TokenizerConfig,
    pub mayo: MayoConfig,
    pub ses_cd: SesCdConfig,
    pub rutgeerts: RutgeertsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizerConfig {
    pub lowercase: bool,
}

/// Mayo vocabulary and skip budget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MayoConfig {
    pub anchor: String,
    pub max_skips: usize,
    pub splitters: Vec<String>,
    pub stop_words: Vec<String>,
    pub stool_frequency: Vec<String>,
    pub rectal_bleeding: Vec<String>,
    pub mucosal_appearance: Vec<String>,
    pub physician_global: Vec<String>,
    pub total: String,
}

/// SES-CD anchors, window and keyword classes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SesCdConfig {
    pub window: usize,
    pub anchors: Vec<String>,
    pub skip_words: Vec<String>,
    pub pertinent_preludes: Vec<String>,
    pub subscore_preludes: Vec<String>,
}

/// Rutgeerts marker words and connector allowance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RutgeertsConfig {
    pub markers: Vec<String>,
    pub connectors: Vec<String>,
    pub max_connectors: usize,
}

impl EndoscoreConfig {
    /// Reject settings no extractor can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mayo.anchor.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "mayo.anchor",
                message: "must not be empty".into(),
            });
        }
        if self.ses_cd.window == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ses_cd.window",
                message: "must be at least 1".into(),
            });
        }
        if self.ses_cd.anchors.iter().all(|a| a.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "ses_cd.anchors",
                message: "needs at least one non-empty phrase".into(),
            });
        }
        if self.rutgeerts.markers.iter().all(|m| m.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "rutgeerts.markers",
                message: "needs at least one non-empty marker".into(),
            });
        }
        Ok(())
    }
}

impl Default for EndoscoreConfig {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        DEFAULTS.tokenizer.clone()
    }
}

impl Default for MayoConfig {
    fn default() -> Self {
        DEFAULTS.mayo.clone()
    }
}

impl Default for SesCdConfig {
    fn default() -> Self {
        DEFAULTS.ses_cd.clone()
    }
}

impl Default for RutgeertsConfig {
    fn default() -> Self {
        DEFAULTS.rutgeerts.clone()
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for `--set` on the command line).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder, deserialize and validate the configuration.
    pub fn build(self) -> Result<EndoscoreConfig, ConfigError> {
        let config: EndoscoreConfig = self.builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<EndoscoreConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(config.tokenizer.lowercase);
        assert_eq!(config.mayo.max_skips, 19);
        assert_eq!(config.mayo.splitters, vec![":", "-", "=", "/"]);
        assert_eq!(config.mayo.total, "total");
        assert_eq!(config.ses_cd.window, 30);
        assert_eq!(
            config.ses_cd.anchors,
            vec!["ses-cd", "simple endoscopic score for crohn's disease"]
        );
        assert_eq!(config.rutgeerts.max_connectors, 4);
    }

    #[test]
    fn default_impls_match_embedded_file() {
        let config = load_defaults().unwrap();
        assert_eq!(EndoscoreConfig::default(), config);
        assert_eq!(MayoConfig::default(), config.mayo);
        assert_eq!(SesCdConfig::default(), config.ses_cd);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("mayo.max_skips", 5i64)
            .expect("override to apply")
            .set_override("ses_cd.window", "12")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.mayo.max_skips, 5);
        assert_eq!(config.ses_cd.window, 12);
        assert_eq!(config.mayo.anchor, "mayo");
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[rutgeerts]\nmax_connectors = 2").unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.rutgeerts.max_connectors, 2);
        assert_eq!(config.rutgeerts.markers.len(), 3);
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/endoscore.toml")
            .build()
            .unwrap();
        assert_eq!(config, load_defaults().unwrap());
    }

    #[test]
    fn missing_required_file_errors() {
        let result = Loader::new().with_file("/nonexistent/endoscore.toml").build();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn rejects_zero_window() {
        let result = Loader::new()
            .set_override("ses_cd.window", 0i64)
            .unwrap()
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                key: "ses_cd.window",
                ..
            })
        ));
    }
}
