//! Process-wide engine slots.

use crate::error::EngineError;
use axiom_system::resource::{GlobalResource, Resource};
use std::sync::{Arc, OnceLock};

/// A shared engine paired with the configuration it was installed with.
struct Installed<E: ?Sized, C> {
    engine: Arc<E>,
    config: C,
}

/// Holds one shared engine and its initial configuration.
///
/// The slot starts empty and is filled exactly once, by the plugin that loads
/// the engine, when the engine's script has loaded. Adapters take the engine
/// from the slot at render time and never change its configuration.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use axiom_render::{EngineError, EngineSlot};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// struct Hello;
/// impl Greeter for Hello {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let slot: EngineSlot<dyn Greeter, ()> = EngineSlot::new("greeter");
/// assert!(slot.engine().is_none());
///
/// slot.install(Arc::new(Hello), ())?;
/// assert_eq!(slot.engine().unwrap().greet(), "hello");
///
/// let err = slot.install(Arc::new(Hello), ()).unwrap_err();
/// assert_eq!(err, EngineError::AlreadyInstalled { engine: "greeter" });
/// # Ok::<(), EngineError>(())
/// ```
pub struct EngineSlot<E: ?Sized, C> {
    name: &'static str,
    installed: OnceLock<Installed<E, C>>,
}

impl<E, C> Resource for EngineSlot<E, C>
where
    E: ?Sized + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
}

impl<E, C> GlobalResource for EngineSlot<E, C>
where
    E: ?Sized + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
}

impl<E: ?Sized, C> core::fmt::Debug for EngineSlot<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineSlot")
            .field("name", &self.name)
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl<E: ?Sized, C> EngineSlot<E, C> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            installed: OnceLock::new(),
        }
    }

    /// Returns the slot name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Installs the engine with its initial configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInstalled`] if an engine was installed before.
    /// The existing engine and configuration are left untouched.
    pub fn install(&self, engine: Arc<E>, config: C) -> Result<(), EngineError> {
        self.installed
            .set(Installed { engine, config })
            .map_err(|_| EngineError::AlreadyInstalled { engine: self.name })?;
        tracing::info!(engine = self.name, "engine installed");
        Ok(())
    }

    /// Returns true once an engine is installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    /// Returns the installed engine.
    #[must_use]
    pub fn engine(&self) -> Option<Arc<E>> {
        self.installed.get().map(|installed| installed.engine.clone())
    }

    /// Returns the configuration the engine was installed with.
    #[must_use]
    pub fn config(&self) -> Option<&C> {
        self.installed.get().map(|installed| &installed.config)
    }

    /// Returns the engine together with its configuration.
    #[must_use]
    pub fn get(&self) -> Option<(Arc<E>, &C)> {
        self.installed
            .get()
            .map(|installed| (installed.engine.clone(), &installed.config))
    }
}
