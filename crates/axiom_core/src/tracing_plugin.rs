//! Log output for Axiom sites.
//!
//! [`TracingPlugin`] installs a `tracing-subscriber` registry when the site
//! becomes ready and publishes what it installed as the [`TracingConfig`]
//! global.
//!
//! The filter is chosen in this order:
//!
//! 1. directives given to [`TracingPlugin::with_env_filter`]
//! 2. `RUST_LOG`
//! 3. the plugin level for Axiom crates, with the HTTP stack held at `warn`
//!
//! ```
//! use axiom_system::site::Site;
//! use axiom_core::{TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let mut site = Site::new();
//! site.add_plugins(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! );
//! site.finish();
//! ```

use axiom_system::plugin::Plugin;
use axiom_system::resource::{GlobalResource, Resource};
use axiom_system::site::Site;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Crates whose logs stay at `warn` unless a filter says otherwise.
const QUIET_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "h2", "rustls"];

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// One JSON object per event.
    Json,
}

/// What the [`TracingPlugin`] installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level used for Axiom crates when no filter overrides it.
    pub level: Level,
    /// Output layout.
    pub format: TracingFormat,
    /// The filter directives in effect.
    pub filter: String,
}

impl Resource for TracingConfig {}
impl GlobalResource for TracingConfig {}

/// Installs the global `tracing` subscriber for a site.
///
/// If the process already has a global subscriber (a test harness, or a
/// second site in the same process) that subscriber is kept.
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    level: Level,
    format: TracingFormat,
    directives: Option<String>,
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::default(),
            directives: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates the plugin at `INFO`, pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level for Axiom crates.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output layout.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Uses explicit `target=level` directives instead of `RUST_LOG`.
    #[must_use]
    pub fn with_env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    /// Logs span enter and exit.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Directives used when neither an explicit filter nor `RUST_LOG` is set.
    fn default_directives(&self) -> String {
        let level = self.level.as_str().to_ascii_lowercase();
        let mut directives = level;
        for target in QUIET_TARGETS {
            directives.push_str(&format!(",{target}=warn"));
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        let explicit = self
            .directives
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok());
        explicit
            .or_else(|| EnvFilter::try_from_default_env().ok())
            .unwrap_or_else(|| EnvFilter::new(self.default_directives()))
    }

    fn output(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let spans = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(spans);
        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, _site: &mut Site) {}

    fn ready(&self, site: &mut Site) {
        let filter = self.filter();
        let effective = filter.to_string();

        let installed = tracing_subscriber::registry()
            .with(self.output())
            .with(filter)
            .try_init()
            .is_ok();

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            filter = %effective,
            installed,
            "logging ready"
        );
        site.insert_global(TracingConfig {
            level: self.level,
            format: self.format,
            filter: effective,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_quiet_http_stack() {
        let directives = TracingPlugin::default()
            .with_level(Level::DEBUG)
            .default_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
    }

    #[test]
    fn builder_keeps_settings() {
        let plugin = TracingPlugin::new()
            .with_format(TracingFormat::Json)
            .with_env_filter("axiom_render=debug")
            .with_span_events(true);

        assert_eq!(plugin.format, TracingFormat::Json);
        assert_eq!(plugin.directives.as_deref(), Some("axiom_render=debug"));
        assert!(plugin.span_events);
    }

    #[test]
    fn ready_publishes_installed_config() {
        let mut site = Site::new();
        site.add_plugins(
            TracingPlugin::default()
                .with_format(TracingFormat::Compact)
                .with_env_filter("axiom_resource=trace"),
        );
        site.finish();

        let config = site.get_global::<TracingConfig>().unwrap();
        assert_eq!(config.format, TracingFormat::Compact);
        assert_eq!(config.level, Level::INFO);
        assert!(config.filter.contains("axiom_resource=trace"));
    }
}
