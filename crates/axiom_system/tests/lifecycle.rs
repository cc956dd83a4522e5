//! Plugin lifecycle tests for `axiom_system`.

use axiom_system::plugin::{Plugin, PluginGroup, PluginGroupBuilder, PluginId};
use axiom_system::resource::{GlobalResource, Resource};
use axiom_system::site::Site;
use std::sync::Arc;
use std::sync::Mutex;

#[derive(Default)]
struct Registry {
    names: Vec<&'static str>,
}
impl Resource for Registry {}

#[derive(Debug)]
struct Frozen {
    names: Vec<&'static str>,
}
impl Resource for Frozen {}
impl GlobalResource for Frozen {}

/// Owns the registry and freezes it once every contributor has been built.
struct RegistryPlugin;

impl Plugin for RegistryPlugin {
    fn build(&self, site: &mut Site) {
        site.insert_resource(Registry::default());
    }

    fn ready(&self, site: &mut Site) {
        let registry = site
            .remove_resource::<Registry>()
            .expect("registry inserted during build");
        site.insert_global(Frozen {
            names: registry.names,
        });
    }
}

struct Contributor(&'static str);

impl Plugin for Contributor {
    fn build(&self, site: &mut Site) {
        site.get_resource_mut::<Registry>()
            .expect("RegistryPlugin must be added before contributors")
            .names
            .push(self.0);
    }

    fn dependencies(&self) -> Vec<PluginId> {
        vec![PluginId::of::<RegistryPlugin>()]
    }

    fn is_unique(&self) -> bool {
        false
    }
}

struct Bundle;

impl PluginGroup for Bundle {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(Contributor("math"))
            .add(RegistryPlugin)
            .add(Contributor("diagram"))
    }
}

#[test]
fn build_phase_registry_is_frozen_in_ready_phase() {
    let mut site = Site::new();
    site.add_plugins(Bundle.build());
    site.finish();

    assert!(!site.contains_resource::<Registry>());
    let frozen = site.get_global::<Frozen>().unwrap();
    assert_eq!(frozen.names, vec!["math", "diagram"]);
}

#[test]
fn disabled_group_members_are_not_built() {
    let mut site = Site::new();
    site.add_plugins(Bundle.build().disable::<Contributor>());
    site.finish();

    assert!(site.get_global::<Frozen>().unwrap().names.is_empty());
}

struct Parent(Arc<Mutex<Vec<&'static str>>>);

struct Child(Arc<Mutex<Vec<&'static str>>>);

impl Plugin for Parent {
    fn build(&self, site: &mut Site) {
        self.0.lock().unwrap().push("parent");
        site.add_plugins(Child(self.0.clone()));
    }
}

impl Plugin for Child {
    fn build(&self, _site: &mut Site) {
        self.0.lock().unwrap().push("child");
    }

    fn ready(&self, _site: &mut Site) {
        self.0.lock().unwrap().push("child ready");
    }
}

#[test]
fn plugins_added_during_build_are_built_and_readied() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut site = Site::new();
    site.add_plugins(Parent(log.clone()));
    site.finish();

    assert!(site.has_plugin::<Child>());
    assert_eq!(*log.lock().unwrap(), vec!["parent", "child", "child ready"]);
}

#[test]
#[should_panic(expected = "already called")]
fn finishing_twice_panics() {
    let mut site = Site::new();
    site.finish();
    site.finish();
}
