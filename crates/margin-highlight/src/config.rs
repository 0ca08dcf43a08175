//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.

use margin_text::AnchorMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration shared by the orchestrator and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    /// Excerpts shorter than this (in characters, after trimming) are ignored
    pub min_excerpt_chars: usize,
    /// Strip running headers/footers from excerpts before locating
    pub sanitize_anchors: bool,
    /// `tracing` filter directive; `RUST_LOG` wins when set
    pub log_filter: Option<String>,
}

impl MarginConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With minimum excerpt length
    #[inline]
    #[must_use]
    pub fn with_min_excerpt_chars(mut self, chars: usize) -> Self {
        self.min_excerpt_chars = chars;
        self
    }

    /// With anchor sanitizing
    #[inline]
    #[must_use]
    pub fn with_sanitize_anchors(mut self, enabled: bool) -> Self {
        self.sanitize_anchors = enabled;
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Locator mode implied by `sanitize_anchors`
    #[inline]
    #[must_use]
    pub fn anchor_mode(&self) -> AnchorMode {
        if self.sanitize_anchors {
            AnchorMode::Sanitized
        } else {
            AnchorMode::Plain
        }
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid TOML for this shape
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            min_excerpt_chars: 10,
            sanitize_anchors: false,
            log_filter: None,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = MarginConfig::default();
        assert_eq!(config.min_excerpt_chars, 10);
        assert!(!config.sanitize_anchors);
        assert_eq!(config.anchor_mode(), AnchorMode::Plain);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(MarginConfig::from_toml_str("").unwrap(), MarginConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = MarginConfig::from_toml_str(
            "sanitize_anchors = true\nlog_filter = \"margin=debug\"\n",
        )
        .unwrap();
        assert!(config.sanitize_anchors);
        assert_eq!(config.anchor_mode(), AnchorMode::Sanitized);
        assert_eq!(config.log_filter.as_deref(), Some("margin=debug"));
        assert_eq!(config.min_excerpt_chars, 10);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = MarginConfig::from_toml_str("cache_capacity = 8").unwrap();
        assert_eq!(config, MarginConfig::default());
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = MarginConfig::from_toml_str("min_excerpt_chars = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_excerpt_chars = 4").unwrap();
        writeln!(file, "sanitize_anchors = true").unwrap();

        let config = MarginConfig::load(file.path()).unwrap();
        assert_eq!(
            config,
            MarginConfig::new()
                .with_min_excerpt_chars(4)
                .with_sanitize_anchors(true)
        );
    }

    #[test]
    fn load_missing_file() {
        let err = MarginConfig::load("/nonexistent/margin.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
