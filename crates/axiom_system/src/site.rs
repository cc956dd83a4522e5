//! The site: plugins plus the resources they publish.
//!
//! Resources come in two kinds:
//!
//! - **Globals** are read-only and shared behind `Arc`. Loaders, engine slots
//!   and the readiness gate live here so renderers can keep them after the
//!   site borrow ends.
//! - **Mutable resources** belong to the site. Plugins fill them during
//!   `build()`, and one plugin usually turns them into a global in `ready()`.
//!
//! [`Site::finish`] orders plugins by their dependencies, builds them all,
//! then readies them all. [`Site::cleanup`] runs in reverse order, once, and
//! also runs when a built site is dropped.

use crate::plugin::{Plugin, PluginId, Plugins};
use crate::resource::{GlobalResource, GlobalResources, Resource, Resources};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Collecting,
    Building,
    Built,
    Closed,
}

struct Registered {
    id: PluginId,
    name: String,
    plugin: Box<dyn Plugin>,
}

/// Plugins and resources of one rendering scope.
///
/// ```
/// use axiom_system::site::Site;
///
/// let mut site = Site::new();
/// site.finish();
/// assert!(site.is_built());
/// site.cleanup();
/// ```
#[derive(Default)]
pub struct Site {
    globals: GlobalResources,
    resources: Resources,
    added: Vec<Registered>,
    built: Vec<Registered>,
    ids: HashSet<PluginId>,
    phase: Phase,
}

impl Site {
    /// An empty site.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugins
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a plugin or a plugin group.
    ///
    /// # Panics
    ///
    /// Panics when a unique plugin is added twice.
    pub fn add_plugins<P: Plugins>(&mut self, plugins: P) -> &mut Self {
        plugins.add_to_site(self);
        self
    }

    pub(crate) fn add_plugin_boxed(&mut self, id: PluginId, plugin: Box<dyn Plugin>) {
        let name = plugin.name().to_string();
        if !self.ids.insert(id) && plugin.is_unique() {
            panic!("plugin '{name}' was added twice; override `is_unique` to allow this");
        }

        let registered = Registered { id, name, plugin };
        if self.phase == Phase::Building {
            // Added from inside another plugin's build().
            registered.plugin.build(self);
            self.built.push(registered);
        } else {
            self.added.push(registered);
        }
    }

    /// Whether a plugin of type `P` was added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.ids.contains(&PluginId::of::<P>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutable resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Stores `resource`, returning any value it replaced.
    pub fn insert_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        self.resources.insert(resource)
    }

    /// Whether a resource of type `R` is stored.
    #[must_use]
    pub fn contains_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    /// Borrows the resource of type `R`.
    #[must_use]
    pub fn get_resource<R: Resource>(&self) -> Option<&R> {
        self.resources.get::<R>().ok()
    }

    /// Mutably borrows the resource of type `R`.
    pub fn get_resource_mut<R: Resource>(&mut self) -> Option<&mut R> {
        self.resources.get_mut::<R>().ok()
    }

    /// Takes the resource of type `R` out of the site.
    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Globals
    // ─────────────────────────────────────────────────────────────────────────

    /// Publishes `resource` as a global, returning the handle it replaced.
    pub fn insert_global<R: GlobalResource>(&mut self, resource: R) -> Option<Arc<R>> {
        self.globals.insert(resource)
    }

    /// Publishes a global the caller keeps a handle to.
    pub fn insert_global_arc<R: GlobalResource>(&mut self, resource: Arc<R>) -> Option<Arc<R>> {
        self.globals.insert_arc(resource)
    }

    /// Whether a global of type `R` is published.
    #[must_use]
    pub fn contains_global<R: GlobalResource>(&self) -> bool {
        self.globals.contains::<R>()
    }

    /// A handle to the global of type `R`.
    #[must_use]
    pub fn get_global<R: GlobalResource>(&self) -> Option<Arc<R>> {
        self.globals.get::<R>().ok()
    }

    /// Unpublishes the global of type `R`. Existing handles keep working.
    pub fn remove_global<R: GlobalResource>(&mut self) -> Option<Arc<R>> {
        self.globals.remove::<R>()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether [`finish`](Self::finish) has run and cleanup has not.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.phase == Phase::Built
    }

    /// Builds, then readies, every added plugin.
    ///
    /// # Panics
    ///
    /// Panics when called twice, when a dependency was never added, or when
    /// dependencies form a cycle.
    pub fn finish(&mut self) {
        assert!(
            self.phase == Phase::Collecting,
            "Site::finish() already called"
        );

        let ordered = self.dependency_order();
        self.phase = Phase::Building;
        for registered in ordered {
            tracing::debug!(plugin = %registered.name, "build");
            registered.plugin.build(self);
            self.built.push(registered);
        }

        let mut built = core::mem::take(&mut self.built);
        for registered in &built {
            registered.plugin.ready(self);
        }
        built.append(&mut self.built);
        self.built = built;

        self.phase = Phase::Built;
    }

    /// Cleans up plugins, dependents first. Only the first call does anything.
    pub fn cleanup(&mut self) {
        if self.phase != Phase::Built {
            return;
        }
        self.phase = Phase::Closed;

        let built = core::mem::take(&mut self.built);
        for registered in built.iter().rev() {
            tracing::debug!(plugin = %registered.name, "cleanup");
            registered.plugin.cleanup(self);
        }
        self.built = built;
    }

    /// Depth-first post-order over the added plugins. Plugins without a
    /// dependency relation keep the order they were added in.
    fn dependency_order(&mut self) -> Vec<Registered> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit(
            at: usize,
            edges: &[Vec<usize>],
            marks: &mut [Mark],
            names: &[&str],
            out: &mut Vec<usize>,
        ) {
            match marks[at] {
                Mark::Done => return,
                Mark::Visiting => {
                    panic!("plugin dependency cycle through '{}'", names[at]);
                }
                Mark::Unvisited => {}
            }
            marks[at] = Mark::Visiting;
            for &dep in &edges[at] {
                visit(dep, edges, marks, names, out);
            }
            marks[at] = Mark::Done;
            out.push(at);
        }

        let added = core::mem::take(&mut self.added);
        let position: HashMap<PluginId, usize> = added
            .iter()
            .enumerate()
            .map(|(index, registered)| (registered.id, index))
            .collect();

        let edges: Vec<Vec<usize>> = added
            .iter()
            .map(|registered| {
                registered
                    .plugin
                    .dependencies()
                    .into_iter()
                    .map(|dep| match position.get(&dep) {
                        Some(&index) => index,
                        None => panic!(
                            "plugin '{}' depends on '{}', which was never added",
                            registered.name,
                            dep.type_name()
                        ),
                    })
                    .collect()
            })
            .collect();

        let names: Vec<&str> = added.iter().map(|registered| registered.name.as_str()).collect();
        let mut marks = vec![Mark::Unvisited; added.len()];
        let mut order = Vec::with_capacity(added.len());
        for start in 0..added.len() {
            visit(start, &edges, &mut marks, &names, &mut order);
        }

        let mut slots: Vec<Option<Registered>> = added.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }
}

impl Drop for Site {
    fn drop(&mut self) {
        self.cleanup();
    }
}
