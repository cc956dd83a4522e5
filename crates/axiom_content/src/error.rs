//! Error types for site configuration and page loading.

use std::path::PathBuf;

/// Errors raised while reading a [`SiteConfig`](crate::SiteConfig) or page data.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The contents are not valid JSON for the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while composing a page.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A global the composer reads was not inserted by any plugin.
    #[error("site is missing {0}; add SitePlugins or the individual plugins")]
    MissingGlobal(&'static str),

    /// The diagram adapter could not start.
    #[error(transparent)]
    Diagram(#[from] axiom_render::DiagramError),
}
