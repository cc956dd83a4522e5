//! Plugins and plugin groups.
//!
//! A site is assembled from plugins. Each one declares the plugins it needs,
//! and [`Site::finish`] builds them in that order regardless of the order
//! they were added in.
//!
//! ```
//! use axiom_system::plugin::{Plugin, PluginId};
//! use axiom_system::site::Site;
//!
//! # struct LoaderPlugin;
//! # impl Plugin for LoaderPlugin {
//! #     fn build(&self, _site: &mut Site) {}
//! # }
//! struct EnginePlugin;
//!
//! impl Plugin for EnginePlugin {
//!     fn build(&self, _site: &mut Site) {}
//!
//!     fn dependencies(&self) -> Vec<PluginId> {
//!         vec![PluginId::of::<LoaderPlugin>()]
//!     }
//! }
//!
//! Site::new()
//!     .add_plugins(EnginePlugin)
//!     .add_plugins(LoaderPlugin)
//!     .finish();
//! ```

use core::any::{TypeId, type_name};

use crate::site::Site;

/// Identity of a plugin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    name: &'static str,
}

impl PluginId {
    /// The id of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: type_name::<P>(),
        }
    }

    /// Full type name of the plugin, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.name
    }
}

/// A unit of site functionality.
///
/// [`Site::finish`] calls `build` on every plugin, dependencies first, then
/// `ready` in the same order. `cleanup` runs once in the opposite order,
/// from [`Site::cleanup`] or when the site is dropped.
pub trait Plugin: Send + Sync + 'static {
    /// Inserts resources and starts acquisitions.
    ///
    /// Resources added with [`Site::insert_resource`] stay writable until
    /// every plugin has been built.
    fn build(&self, site: &mut Site);

    /// Runs once all plugins are built. Registries are frozen here.
    fn ready(&self, _site: &mut Site) {}

    /// Releases what `build` acquired.
    fn cleanup(&self, _site: &mut Site) {}

    /// Name used in logs and panic messages.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Plugins that must be built first.
    ///
    /// A dependency that was never added makes [`Site::finish`] panic.
    fn dependencies(&self) -> Vec<PluginId> {
        Vec::new()
    }

    /// Whether adding the plugin twice is an error.
    fn is_unique(&self) -> bool {
        true
    }
}

/// Anything [`Site::add_plugins`] accepts.
pub trait Plugins {
    /// Hands the plugins to `site`.
    fn add_to_site(self, site: &mut Site);
}

impl<P: Plugin> Plugins for P {
    fn add_to_site(self, site: &mut Site) {
        site.add_plugin_boxed(PluginId::of::<P>(), Box::new(self));
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_site(self, site: &mut Site) {
        for (id, plugin) in self.entries {
            site.add_plugin_boxed(id, plugin);
        }
    }
}

/// Plugins that are normally added together.
pub trait PluginGroup {
    /// Lists the group's plugins.
    fn build(self) -> PluginGroupBuilder;
}

/// An ordered, editable list of plugins.
#[derive(Default)]
pub struct PluginGroupBuilder {
    entries: Vec<(PluginId, Box<dyn Plugin>)>,
}

impl PluginGroupBuilder {
    /// An empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `plugin`.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "builder method, not an arithmetic operator"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.entries.push((PluginId::of::<P>(), Box::new(plugin)));
        self
    }

    /// Drops plugins of type `P`, so a replacement can be added.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let id = PluginId::of::<P>();
        self.entries.retain(|(entry, _)| *entry != id);
        self
    }

    /// Whether a plugin of type `P` is in the group.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        let id = PluginId::of::<P>();
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    /// Number of plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group has no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
