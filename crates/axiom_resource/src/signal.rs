//! Per-resource readiness signals.

use crate::error::LoadError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Load status of one external resource.
///
/// `Loaded` is terminal: once reached, a resource never returns to
/// `Pending` or `Failed` for the lifetime of the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Requested, not loaded yet.
    Pending,
    /// Loaded and usable.
    Loaded,
    /// The latest attempt failed. Readiness stays false until a manual retry succeeds.
    Failed(String),
}

impl LoadStatus {
    /// Returns true for [`LoadStatus::Loaded`].
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }

    /// Returns true for [`LoadStatus::Pending`].
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadStatus::Pending)
    }
}

/// Observable readiness of one resource.
///
/// Cloning a signal is cheap. All clones observe the same underlying load,
/// including manual retries of a failed load.
#[derive(Debug, Clone)]
pub struct ReadinessSignal {
    name: Arc<str>,
    status: watch::Receiver<LoadStatus>,
}

impl ReadinessSignal {
    pub(crate) fn new(name: Arc<str>, status: watch::Receiver<LoadStatus>) -> Self {
        Self { name, status }
    }

    /// Creates a signal driven by an external status channel.
    ///
    /// Used to gate on readiness that does not come from a [`ResourceLoader`](crate::ResourceLoader).
    /// The sender must uphold that `Loaded` is terminal.
    #[must_use]
    pub fn from_receiver(name: impl Into<Arc<str>>, status: watch::Receiver<LoadStatus>) -> Self {
        Self::new(name.into(), status)
    }

    /// Returns the resource name this signal tracks.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current load status.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.status.borrow().clone()
    }

    /// Returns true once the resource has loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.borrow().is_loaded()
    }

    /// Waits until the resource has loaded.
    ///
    /// Failures do not end the wait, since a manual retry may still succeed.
    /// There is no timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Abandoned`] if the owning scope closed before the
    /// resource loaded.
    pub async fn wait(&self) -> Result<(), LoadError> {
        let mut status = self.status.clone();
        status
            .wait_for(LoadStatus::is_loaded)
            .await
            .map(|_| ())
            .map_err(|_| LoadError::Abandoned {
                name: self.name.to_string(),
            })
    }

    /// Waits until the current attempt settles, either loaded or failed.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Failed`] if the attempt failed, or
    /// [`LoadError::Abandoned`] if the owning scope closed first.
    pub async fn wait_settled(&self) -> Result<(), LoadError> {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|status| !status.is_pending())
            .await
            .map_err(|_| LoadError::Abandoned {
                name: self.name.to_string(),
            })?
            .clone();

        match settled {
            LoadStatus::Failed(reason) => Err(LoadError::Failed {
                name: self.name.to_string(),
                reason,
            }),
            LoadStatus::Pending | LoadStatus::Loaded => Ok(()),
        }
    }
}

/// Snapshot of every tracked resource's readiness, keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessState {
    entries: BTreeMap<String, LoadStatus>,
}

impl ReadinessState {
    pub(crate) fn from_signals<'a>(signals: impl IntoIterator<Item = &'a ReadinessSignal>) -> Self {
        Self {
            entries: signals
                .into_iter()
                .map(|signal| (signal.name().to_string(), signal.status()))
                .collect(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, status: LoadStatus) {
        self.entries.insert(name.into(), status);
    }

    /// Returns whether the named resource is loaded, or `None` if it is not tracked.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(LoadStatus::is_loaded)
    }

    /// Returns the full status of the named resource.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<&LoadStatus> {
        self.entries.get(name)
    }

    /// Returns true if every tracked resource is loaded.
    #[must_use]
    pub fn all_loaded(&self) -> bool {
        self.entries.values().all(LoadStatus::is_loaded)
    }

    /// Iterates over `(name, loaded)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries
            .iter()
            .map(|(name, status)| (name.as_str(), status.is_loaded()))
    }

    /// Returns the number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
