//! The [`ResourceEnvironment`] capability that resources are injected into.

use crate::descriptor::ResourceDescriptor;
use crate::error::EnvironmentError;
use async_trait::async_trait;

/// A runtime environment that can host external style and script resources.
///
/// Implementations insert the resource when [`inject`](Self::inject) is first
/// polled and resolve once the environment reports the resource loaded.
/// [`detach`](Self::detach) may be called for descriptors that never finished
/// loading, or that were never inserted at all, and must tolerate both.
#[async_trait]
pub trait ResourceEnvironment: Send + Sync + 'static {
    /// Inserts the resource and waits for its load outcome.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvironmentError`] if the resource fails to load.
    async fn inject(&self, descriptor: &ResourceDescriptor) -> Result<(), EnvironmentError>;

    /// Removes the resource identified by `descriptor` from the environment.
    fn detach(&self, descriptor: &ResourceDescriptor);
}
