//! Aggregate readiness over a fixed set of resource signals.
//!
//! Plugins register the signals they depend on in a [`ReadinessRegistry`]
//! while the site is being built. When the site finishes, the registry is
//! frozen into a [`ReadinessGate`] global that content reads from.

use crate::error::GateError;
use crate::signal::{LoadStatus, ReadinessSignal, ReadinessState};
use axiom_system::resource::{GlobalResource, Resource};
use core::sync::atomic::{AtomicBool, Ordering};

/// Aggregate state of a [`ReadinessGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// At least one tracked resource has not loaded.
    Loading,
    /// Every tracked resource has loaded. Terminal.
    Ready,
}

/// Mutable collection of signals gathered during site build.
#[derive(Debug, Default)]
pub struct ReadinessRegistry {
    signals: Vec<ReadinessSignal>,
}

impl Resource for ReadinessRegistry {}

impl ReadinessRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signal to the set the gate waits on.
    ///
    /// A signal whose name is already tracked replaces the previous one.
    pub fn track(&mut self, signal: ReadinessSignal) {
        match self
            .signals
            .iter_mut()
            .find(|tracked| tracked.name() == signal.name())
        {
            Some(tracked) => *tracked = signal,
            None => self.signals.push(signal),
        }
    }

    /// Returns the number of tracked signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Consumes the registry into an immutable gate.
    #[must_use]
    pub fn freeze(self) -> ReadinessGate {
        ReadinessGate::new(self.signals)
    }
}

/// Combines resource signals into one "system ready" flag.
///
/// The gate is ready exactly when every tracked signal reports loaded. Once
/// ready it stays ready. An empty gate is ready. There is no timeout: a
/// resource that never loads keeps the gate loading.
///
/// # Example
///
/// ```
/// use axiom_resource::{GateState, ReadinessGate};
///
/// let gate = ReadinessGate::new(Vec::new());
/// assert_eq!(gate.state(), GateState::Ready);
/// assert_eq!(gate.mount(|| "content"), Some("content"));
/// ```
#[derive(Debug)]
pub struct ReadinessGate {
    signals: Vec<ReadinessSignal>,
    ready: AtomicBool,
}

impl Resource for ReadinessGate {}
impl GlobalResource for ReadinessGate {}

impl ReadinessGate {
    /// Creates a gate over `signals`.
    #[must_use]
    pub fn new(signals: Vec<ReadinessSignal>) -> Self {
        Self {
            signals,
            ready: AtomicBool::new(false),
        }
    }

    /// Returns true once every tracked resource has loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        if !self.signals.iter().all(ReadinessSignal::is_ready) {
            return false;
        }
        if self
            .ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::info!(resources = self.signals.len(), "readiness gate opened");
        }
        true
    }

    /// Returns the aggregate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        if self.is_ready() {
            GateState::Ready
        } else {
            GateState::Loading
        }
    }

    /// Returns the individual signals.
    #[must_use]
    pub fn signals(&self) -> &[ReadinessSignal] {
        &self.signals
    }

    /// Returns a snapshot of the individual signals.
    #[must_use]
    pub fn readiness(&self) -> ReadinessState {
        ReadinessState::from_signals(&self.signals)
    }

    /// Returns `(name, reason)` for every resource whose latest attempt failed.
    #[must_use]
    pub fn failures(&self) -> Vec<(String, String)> {
        self.signals
            .iter()
            .filter_map(|signal| match signal.status() {
                LoadStatus::Failed(reason) => Some((signal.name().to_string(), reason)),
                LoadStatus::Pending | LoadStatus::Loaded => None,
            })
            .collect()
    }

    /// Returns the names of resources that have not loaded yet.
    #[must_use]
    pub fn pending(&self) -> Vec<&str> {
        self.signals
            .iter()
            .filter(|signal| !signal.is_ready())
            .map(ReadinessSignal::name)
            .collect()
    }

    /// Constructs dependent content only if the gate is ready.
    ///
    /// `build` is not called at all while loading, so content that touches
    /// an engine is never created before the engine exists.
    pub fn mount<T>(&self, build: impl FnOnce() -> T) -> Option<T> {
        self.is_ready().then(build)
    }

    /// Waits until every tracked resource has loaded.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Load`] if a tracked load was abandoned.
    pub async fn wait_ready(&self) -> Result<(), GateError> {
        futures::future::try_join_all(self.signals.iter().map(|signal| signal.wait())).await?;
        let _ = self.is_ready();
        Ok(())
    }
}
