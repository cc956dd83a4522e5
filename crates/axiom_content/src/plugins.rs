//! The plugin bundle for a complete site.

use crate::config::SiteConfig;
use axiom_core::{TracingFormat, TracingPlugin};
use axiom_render::{DiagramEngine, DiagramPlugin, MathEngine, MathPlugin};
use axiom_resource::{ResourceEnvironment, ResourcePlugin};
use axiom_system::plugin::{PluginGroup, PluginGroupBuilder};
use std::sync::Arc;

/// Every plugin a technique site needs, configured from a [`SiteConfig`].
///
/// Includes:
/// - [`TracingPlugin`] - Logging at the configured level
/// - [`ResourcePlugin`] - Loader, scope and readiness gate
/// - [`MathPlugin`] - Math engine assets and slot
/// - [`DiagramPlugin`] - Diagram engine asset, theme and slot
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use axiom_content::{SiteConfig, SitePlugins};
/// use axiom_core::TracingPlugin;
/// use axiom_render::dev::{MockDiagramEngine, MockMathEngine};
/// use axiom_resource::Document;
/// use axiom_system::plugin::PluginGroup;
/// use axiom_system::site::Site;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let plugins = SitePlugins::new(
///     SiteConfig::default(),
///     Arc::new(Document::new()),
///     Arc::new(MockMathEngine::new()),
///     Arc::new(MockDiagramEngine::new()),
/// );
///
/// let mut site = Site::new();
/// site.add_plugins(plugins.build().disable::<TracingPlugin>());
/// site.finish();
/// # });
/// ```
pub struct SitePlugins {
    config: SiteConfig,
    environment: Arc<dyn ResourceEnvironment>,
    math: Arc<dyn MathEngine>,
    diagram: Arc<dyn DiagramEngine>,
    format: TracingFormat,
}

impl SitePlugins {
    /// Creates the bundle.
    #[must_use]
    pub fn new(
        config: SiteConfig,
        environment: Arc<dyn ResourceEnvironment>,
        math: Arc<dyn MathEngine>,
        diagram: Arc<dyn DiagramEngine>,
    ) -> Self {
        Self {
            config,
            environment,
            math,
            diagram,
            format: TracingFormat::default(),
        }
    }

    /// Sets the log output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }
}

impl PluginGroup for SitePlugins {
    fn build(self) -> PluginGroupBuilder {
        let tracing = TracingPlugin::default()
            .with_level(self.config.level())
            .with_format(self.format);

        PluginGroupBuilder::new()
            .add(tracing)
            .add(ResourcePlugin::from_arc(self.environment))
            .add(MathPlugin::from_arc(self.math).with_assets(self.config.math.clone()))
            .add(
                DiagramPlugin::from_arc(self.diagram)
                    .with_assets(self.config.diagram.clone())
                    .with_theme(self.config.diagram_theme),
            )
    }
}
