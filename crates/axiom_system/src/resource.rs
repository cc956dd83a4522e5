//! Type-keyed storage for shared state.
//!
//! Resources come in two flavours, distinguished by marker traits:
//!
//! - [`Resource`] values are mutable and owned by the [`Site`](crate::site::Site).
//!   Plugins use them as build-phase scratch space (e.g. a registry that other
//!   plugins append to before it is frozen).
//! - [`GlobalResource`] values are shared behind an [`Arc`] and are read-only
//!   once inserted. Engines, loaders and readiness gates live here.

use core::any::{Any, TypeId};
use hashbrown::HashMap;
use std::sync::Arc;

/// Marker trait for values that can be stored in a [`Resources`] map.
///
/// # Example
///
/// ```
/// use axiom_system::resource::Resource;
///
/// struct PendingSignals(Vec<String>);
/// impl Resource for PendingSignals {}
/// ```
pub trait Resource: Send + Sync + 'static {}

/// Marker trait for resources shared read-only for the lifetime of a site.
///
/// Types implementing `GlobalResource` are handed out as `Arc<T>`, so any
/// interior state they expose must be synchronized by the type itself.
///
/// # Example
///
/// ```
/// use axiom_system::resource::{GlobalResource, Resource};
///
/// struct EngineSettings { theme: String }
/// impl Resource for EngineSettings {}
/// impl GlobalResource for EngineSettings {}
/// ```
pub trait GlobalResource: Resource {}

/// Errors that can occur when looking up a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// No resource of the requested type was inserted.
    #[error("resource not found: {0}")]
    NotFound(&'static str),
}

/// Storage for mutable, site-owned resources.
#[derive(Default)]
pub struct Resources {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    /// Creates an empty resource map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts a resource, returning the previous value of the same type.
    pub fn insert<T: Resource>(&mut self, resource: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(resource))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Returns true if a resource of type `T` exists.
    #[must_use]
    pub fn contains<T: Resource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns a shared reference to a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if no resource of type `T` exists.
    pub fn get<T: Resource>(&self) -> Result<&T, ResourceError> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }

    /// Returns a mutable reference to a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if no resource of type `T` exists.
    pub fn get_mut<T: Resource>(&mut self) -> Result<&mut T, ResourceError> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut::<T>())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }

    /// Removes and returns a resource.
    pub fn remove<T: Resource>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns the number of stored resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage for shared, read-only resources.
#[derive(Default)]
pub struct GlobalResources {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl GlobalResources {
    /// Creates an empty global resource map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts a global resource, returning the previous handle of the same type.
    pub fn insert<T: GlobalResource>(&mut self, resource: T) -> Option<Arc<T>> {
        self.insert_arc(Arc::new(resource))
    }

    /// Inserts an already shared global resource.
    pub fn insert_arc<T: GlobalResource>(&mut self, resource: Arc<T>) -> Option<Arc<T>> {
        self.entries
            .insert(TypeId::of::<T>(), resource)
            .and_then(|old| old.downcast::<T>().ok())
    }

    /// Returns true if a global resource of type `T` exists.
    #[must_use]
    pub fn contains<T: GlobalResource>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns a shared handle to a global resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] if no resource of type `T` exists.
    pub fn get<T: GlobalResource>(&self) -> Result<Arc<T>, ResourceError> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|shared| shared.downcast::<T>().ok())
            .ok_or(ResourceError::NotFound(core::any::type_name::<T>()))
    }

    /// Removes a global resource, returning the site's handle to it.
    ///
    /// Other holders of the `Arc` keep their handles alive.
    pub fn remove<T: GlobalResource>(&mut self) -> Option<Arc<T>> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|shared| shared.downcast::<T>().ok())
    }

    /// Returns the number of stored global resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no global resources are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);
    impl Resource for Counter {}

    #[derive(Debug, PartialEq)]
    struct Theme(&'static str);
    impl Resource for Theme {}
    impl GlobalResource for Theme {}

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut resources = Resources::new();
        assert!(resources.insert(Counter(1)).is_none());
        assert_eq!(resources.insert(Counter(2)), Some(Counter(1)));
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn get_mut_mutates_in_place() {
        let mut resources = Resources::new();
        resources.insert(Counter(1));
        resources.get_mut::<Counter>().unwrap().0 += 41;
        assert_eq!(resources.get::<Counter>().unwrap(), &Counter(42));
    }

    #[test]
    fn missing_resource_reports_type_name() {
        let resources = Resources::new();
        let err = resources.get::<Counter>().unwrap_err();
        assert!(err.to_string().contains("Counter"));
    }

    #[test]
    fn global_handles_outlive_removal() {
        let mut globals = GlobalResources::new();
        globals.insert(Theme("default"));

        let handle = globals.get::<Theme>().unwrap();
        let removed = globals.remove::<Theme>().unwrap();

        assert!(!globals.contains::<Theme>());
        assert!(Arc::ptr_eq(&handle, &removed));
        assert_eq!(handle.0, "default");
    }
}
