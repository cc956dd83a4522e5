//! Site configuration.

use crate::error::ConfigError;
use axiom_render::{DiagramAssets, MathAssets};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of an Axiom site.
///
/// Every field has a default, so `{}` is a valid configuration that loads the
/// engines from the public CDN.
///
/// # Example
///
/// ```
/// use axiom_content::SiteConfig;
///
/// let config = SiteConfig::from_json_str(r#"{ "diagram_theme": "forest" }"#)?;
/// assert_eq!(config.diagram_theme, "forest");
/// assert!(config.math.script.ends_with("katex.min.js"));
/// # Ok::<(), axiom_content::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Math engine stylesheet and script.
    pub math: MathAssets,
    /// Diagram engine script.
    pub diagram: DiagramAssets,
    /// Theme the diagram engine is initialized with.
    pub diagram_theme: String,
    /// Default log level, overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            math: MathAssets::default(),
            diagram: DiagramAssets::default(),
            diagram_theme: "default".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the text is not a valid configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it is not a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded site configuration");
        Ok(config)
    }

    /// Parses the configured log level, falling back to `INFO`.
    #[must_use]
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
