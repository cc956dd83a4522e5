//! Plugins that load the engines and install them into their slots.

use crate::diagram::{DiagramConfig, DiagramEngine, DiagramEngineSlot};
use crate::math::{MathConfig, MathEngine, MathEngineSlot};
use axiom_resource::{
    LoaderScope, ReadinessRegistry, ReadinessSignal, ResourceDescriptor, ResourcePlugin,
};
use axiom_system::plugin::{Plugin, PluginId};
use axiom_system::site::Site;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Locators of the math engine's stylesheet and script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathAssets {
    /// Stylesheet locator.
    pub stylesheet: String,
    /// Script locator.
    pub script: String,
}

impl Default for MathAssets {
    fn default() -> Self {
        Self {
            stylesheet: "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css".to_string(),
            script: "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js".to_string(),
        }
    }
}

/// Locator of the diagram engine's script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramAssets {
    /// Script locator.
    pub script: String,
}

impl Default for DiagramAssets {
    fn default() -> Self {
        Self {
            script: "https://cdn.jsdelivr.net/npm/mermaid@10.6.1/dist/mermaid.min.js".to_string(),
        }
    }
}

fn scope_of(site: &Site, plugin: &str) -> Arc<LoaderScope> {
    site.get_global::<LoaderScope>()
        .unwrap_or_else(|| panic!("{plugin} requires ResourcePlugin"))
}

fn request(
    scope: &LoaderScope,
    descriptor: Result<ResourceDescriptor, axiom_resource::ResourceError>,
    on_loaded: impl FnOnce() + Send + 'static,
) -> ReadinessSignal {
    descriptor
        .and_then(|descriptor| scope.load_with(descriptor, on_loaded))
        .unwrap_or_else(|err| panic!("cannot request engine resource: {err}"))
}

fn track(site: &mut Site, signals: impl IntoIterator<Item = ReadinessSignal>) {
    let registry = site
        .get_resource_mut::<ReadinessRegistry>()
        .unwrap_or_else(|| panic!("engine plugins must be built before the site is ready"));
    for signal in signals {
        registry.track(signal);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MathPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Loads the math engine and installs it into the [`MathEngineSlot`] global.
///
/// The stylesheet and the script are tracked separately by the readiness
/// gate. The engine is installed with `throw_on_error: false` from the
/// script's load callback, so it is in place before the gate can open.
///
/// # Panics
///
/// Building panics if [`ResourcePlugin`] is missing, if an asset locator is
/// malformed, or if the site is built outside a Tokio runtime.
pub struct MathPlugin {
    engine: Arc<dyn MathEngine>,
    assets: MathAssets,
}

impl core::fmt::Debug for MathPlugin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MathPlugin")
            .field("assets", &self.assets)
            .finish_non_exhaustive()
    }
}

impl MathPlugin {
    /// Creates the plugin for `engine` with the default CDN assets.
    #[must_use]
    pub fn new(engine: impl MathEngine) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Creates the plugin for a shared engine.
    #[must_use]
    pub fn from_arc(engine: Arc<dyn MathEngine>) -> Self {
        Self {
            engine,
            assets: MathAssets::default(),
        }
    }

    /// Overrides the asset locators.
    #[must_use]
    pub fn with_assets(mut self, assets: MathAssets) -> Self {
        self.assets = assets;
        self
    }
}

impl Plugin for MathPlugin {
    fn build(&self, site: &mut Site) {
        let scope = scope_of(site, "MathPlugin");
        let slot = Arc::new(MathEngineSlot::new("math"));
        site.insert_global_arc(slot.clone());

        let stylesheet = request(
            &scope,
            ResourceDescriptor::style("katex-css", &self.assets.stylesheet),
            || {},
        );

        let engine = self.engine.clone();
        let script = request(
            &scope,
            ResourceDescriptor::script("katex", &self.assets.script),
            move || {
                if let Err(err) = slot.install(engine, MathConfig::default()) {
                    tracing::debug!(error = %err, "math engine install skipped");
                }
            },
        );

        track(site, [stylesheet, script]);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<ResourcePlugin>()]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DiagramPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Loads the diagram engine and installs it into the [`DiagramEngineSlot`] global.
///
/// On load the engine is initialized once with `start_on_load: false` and the
/// configured theme, then installed.
///
/// # Panics
///
/// Building panics if [`ResourcePlugin`] is missing, if the asset locator is
/// malformed, or if the site is built outside a Tokio runtime.
pub struct DiagramPlugin {
    engine: Arc<dyn DiagramEngine>,
    assets: DiagramAssets,
    config: DiagramConfig,
}

impl core::fmt::Debug for DiagramPlugin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiagramPlugin")
            .field("assets", &self.assets)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DiagramPlugin {
    /// Creates the plugin for `engine` with the default CDN asset and theme.
    #[must_use]
    pub fn new(engine: impl DiagramEngine) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Creates the plugin for a shared engine.
    #[must_use]
    pub fn from_arc(engine: Arc<dyn DiagramEngine>) -> Self {
        Self {
            engine,
            assets: DiagramAssets::default(),
            config: DiagramConfig::default(),
        }
    }

    /// Overrides the asset locator.
    #[must_use]
    pub fn with_assets(mut self, assets: DiagramAssets) -> Self {
        self.assets = assets;
        self
    }

    /// Sets the engine theme.
    ///
    /// Automatic rendering on load stays disabled whatever the theme.
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.config.theme = theme.into();
        self
    }
}

impl Plugin for DiagramPlugin {
    fn build(&self, site: &mut Site) {
        let scope = scope_of(site, "DiagramPlugin");
        let slot = Arc::new(DiagramEngineSlot::new("diagram"));
        site.insert_global_arc(slot.clone());

        let engine = self.engine.clone();
        let config = DiagramConfig {
            start_on_load: false,
            ..self.config.clone()
        };
        let script = request(
            &scope,
            ResourceDescriptor::script("mermaid", &self.assets.script),
            move || {
                if slot.is_installed() {
                    return;
                }
                engine.initialize(&config);
                if let Err(err) = slot.install(engine, config) {
                    tracing::debug!(error = %err, "diagram engine install skipped");
                }
            },
        );

        track(site, [script]);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<ResourcePlugin>()]
    }
}
