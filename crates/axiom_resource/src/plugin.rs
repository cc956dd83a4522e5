//! Provides the [`ResourceLoader`], the site's [`LoaderScope`] and the [`ReadinessGate`].

use crate::document::Document;
use crate::environment::ResourceEnvironment;
use crate::gate::{ReadinessGate, ReadinessRegistry};
use crate::loader::{LoaderScope, ResourceLoader};
use axiom_system::plugin::Plugin;
use axiom_system::site::Site;
use std::sync::Arc;

/// Plugin that owns external resource acquisition for a site.
///
/// # Lifecycle
///
/// 1. **`build()` phase**: inserts the [`ResourceLoader`] and a site-wide
///    [`LoaderScope`] as globals, and a [`ReadinessRegistry`] as a mutable
///    resource. Engine plugins request their resources through the scope and
///    [`track`](ReadinessRegistry::track) the returned signals.
///
/// 2. **`ready()` phase**: the registry is frozen into the [`ReadinessGate`]
///    global, so the set of tracked resources is fixed from then on.
///
/// 3. **`cleanup()` phase**: the scope is closed, detaching everything the site
///    injected and discarding late completions.
///
/// Engine plugins must declare this plugin as a dependency.
pub struct ResourcePlugin {
    loader: ResourceLoader,
}

impl core::fmt::Debug for ResourcePlugin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourcePlugin").finish_non_exhaustive()
    }
}

impl Default for ResourcePlugin {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl ResourcePlugin {
    /// Creates the plugin over `environment`.
    #[must_use]
    pub fn new(environment: impl ResourceEnvironment) -> Self {
        Self::from_arc(Arc::new(environment))
    }

    /// Creates the plugin over a shared environment.
    ///
    /// Keep a clone of the `Arc` to inspect the environment from outside the site.
    #[must_use]
    pub fn from_arc(environment: Arc<dyn ResourceEnvironment>) -> Self {
        Self::with_loader(ResourceLoader::new(environment))
    }

    /// Creates the plugin around an existing loader.
    ///
    /// Sites sharing a loader never inject the same locator twice.
    #[must_use]
    pub fn with_loader(loader: ResourceLoader) -> Self {
        Self { loader }
    }

    /// Creates the plugin over an [`HttpEnvironment`](crate::HttpEnvironment).
    #[cfg(feature = "http")]
    #[must_use]
    pub fn http() -> Self {
        Self::new(crate::http::HttpEnvironment::new())
    }
}

impl Plugin for ResourcePlugin {
    fn build(&self, site: &mut Site) {
        site.insert_global(self.loader.clone());
        site.insert_global(self.loader.scope());
        site.insert_resource(ReadinessRegistry::new());
    }

    fn ready(&self, site: &mut Site) {
        let registry = site
            .remove_resource::<ReadinessRegistry>()
            .unwrap_or_default();
        tracing::debug!(tracked = registry.len(), "freezing readiness registry");
        site.insert_global(registry.freeze());
    }

    fn cleanup(&self, site: &mut Site) {
        if let Some(scope) = site.remove_global::<LoaderScope>() {
            scope.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ResourceDescriptor;

    struct NeedsScript;

    impl Plugin for NeedsScript {
        fn build(&self, site: &mut Site) {
            let scope = site.get_global::<LoaderScope>().unwrap();
            let script = ResourceDescriptor::script("katex", "https://cdn.example/katex.js").unwrap();
            let signal = scope.load(script).unwrap();
            site.get_resource_mut::<ReadinessRegistry>()
                .unwrap()
                .track(signal);
        }

        fn dependencies(&self) -> Vec<axiom_system::plugin::PluginId> {
            vec![axiom_system::plugin::PluginId::of::<ResourcePlugin>()]
        }
    }

    #[tokio::test]
    async fn gate_tracks_signals_registered_during_build() {
        let document = Arc::new(Document::new());
        let mut site = Site::new();
        site.add_plugins(NeedsScript)
            .add_plugins(ResourcePlugin::from_arc(document.clone()));
        site.finish();

        let gate = site.get_global::<ReadinessGate>().unwrap();
        assert_eq!(gate.signals().len(), 1);
        gate.wait_ready().await.unwrap();
        assert!(gate.is_ready());
        assert_eq!(document.attached().len(), 1);

        site.cleanup();
        assert!(document.attached().is_empty());
        assert!(!site.contains_global::<LoaderScope>());
    }

    #[test]
    fn empty_site_has_ready_gate() {
        let mut site = Site::new();
        site.add_plugins(ResourcePlugin::default());
        site.finish();
        assert!(site.get_global::<ReadinessGate>().unwrap().is_ready());
    }
}
