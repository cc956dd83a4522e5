//! Proof technique site rendered through Axiom.
//!
//! The real engines are JavaScript bundles that cannot run in a headless
//! process, so this example installs two small native engines in their
//! place. The site still fetches the engine bundles, and the readiness gate
//! still waits for them, exactly as a browser-hosted site would.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  proofsite                                                │
//! │                                                           │
//! │  ┌──────────────┐   ┌───────────┐   ┌──────────────────┐  │
//! │  │ HttpEnviron. │──▶│ Readiness │──▶│ PageComposer     │  │
//! │  │ (CDN fetch)  │   │ Gate      │   │  ├ MathRenderer  │  │
//! │  └──────────────┘   └───────────┘   │  └ DiagramRender.│  │
//! │                                     └────────┬─────────┘  │
//! │                                              ▼            │
//! │                                        <out>/*.html       │
//! └───────────────────────────────────────────────────────────┘
//! ```

mod engines;

pub use engines::{FlowchartEngine, PlainMathEngine};

use std::path::PathBuf;

/// Environment variable naming the site configuration file.
pub const CONFIG_VAR: &str = "AXIOM_CONFIG";

/// Environment variable that switches to the in-memory environment.
pub const OFFLINE_VAR: &str = "AXIOM_OFFLINE";

/// Errors that end a site build.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Configuration or page data could not be loaded.
    #[error(transparent)]
    Config(#[from] axiom_content::ConfigError),

    /// A page could not be composed.
    #[error(transparent)]
    Compose(#[from] axiom_content::ComposeError),

    /// The engines never became ready.
    #[error(transparent)]
    Gate(#[from] axiom_resource::GateError),

    /// An engine resource failed to load.
    #[error("engine resources failed to load: {0}")]
    EngineUnavailable(String),

    /// Writing output failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Turns a page title into a file name.
#[must_use]
pub fn slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("page");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(slug("Proof by Contradiction"), "proof-by-contradiction");
        assert_eq!(slug("  (Strong) Induction!  "), "strong-induction");
        assert_eq!(slug("∀∃"), "page");
    }
}
