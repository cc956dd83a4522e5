//! An in-memory [`ResourceEnvironment`].
//!
//! [`Document`] keeps track of attached resources the way a page's head
//! element does. Each locator can be scripted to succeed, fail, or hold until
//! the caller releases it, which makes out-of-order completion reproducible.

use crate::descriptor::{ResourceDescriptor, ResourceHandle};
use crate::environment::ResourceEnvironment;
use crate::error::EnvironmentError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;
use url::Url;

/// How a [`Document`] answers an injection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadBehavior {
    /// Complete successfully right away.
    #[default]
    Succeed,
    /// Fail right away with the given reason.
    Fail(String),
    /// Stay pending until [`Document::release`] or [`Document::reject`] is called.
    Hold,
}

type Completion = oneshot::Sender<Result<(), EnvironmentError>>;

#[derive(Default)]
struct DocumentInner {
    attached: Vec<ResourceDescriptor>,
    injections: HashMap<Url, usize>,
    behaviors: HashMap<Url, LoadBehavior>,
    default_behavior: LoadBehavior,
    held: HashMap<ResourceHandle, (Url, Completion)>,
}

/// In-memory document acting as the resource environment.
///
/// # Example
///
/// ```
/// use axiom_resource::{Document, ResourceDescriptor, ResourceEnvironment};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let document = Document::new();
/// let css = ResourceDescriptor::style("katex-css", "https://cdn.example/katex.css").unwrap();
///
/// document.inject(&css).await.unwrap();
/// assert!(document.is_attached(css.locator()));
///
/// document.detach(&css);
/// assert!(document.attached().is_empty());
/// # });
/// ```
#[derive(Default)]
pub struct Document {
    inner: Mutex<DocumentInner>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Document")
            .field("attached", &inner.attached.len())
            .field("held", &inner.held.len())
            .finish()
    }
}

impl Document {
    /// Creates an empty document where every injection succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the behavior used for locators without a specific behavior.
    #[must_use]
    pub fn with_default_behavior(self, behavior: LoadBehavior) -> Self {
        self.inner.lock().default_behavior = behavior;
        self
    }

    /// Sets the behavior for one locator.
    pub fn set_behavior(&self, locator: &Url, behavior: LoadBehavior) {
        self.inner.lock().behaviors.insert(locator.clone(), behavior);
    }

    /// Completes a held injection of `locator` successfully.
    ///
    /// Returns false if no injection of that locator is held.
    pub fn release(&self, locator: &Url) -> bool {
        self.complete(locator, Ok(()))
    }

    /// Completes a held injection of `locator` with a failure.
    ///
    /// Returns false if no injection of that locator is held.
    pub fn reject(&self, locator: &Url, reason: impl Into<String>) -> bool {
        self.complete(locator, Err(EnvironmentError::Rejected(reason.into())))
    }

    fn complete(&self, locator: &Url, outcome: Result<(), EnvironmentError>) -> bool {
        let completion = {
            let mut inner = self.inner.lock();
            let handle = inner
                .held
                .iter()
                .find(|(_, (held, _))| held == locator)
                .map(|(handle, _)| handle.clone());
            handle.and_then(|handle| inner.held.remove(&handle))
        };

        match completion {
            Some((_, sender)) => sender.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Returns the currently attached resources in insertion order.
    #[must_use]
    pub fn attached(&self) -> Vec<ResourceDescriptor> {
        self.inner.lock().attached.clone()
    }

    /// Returns true if a resource with this locator is attached.
    #[must_use]
    pub fn is_attached(&self, locator: &Url) -> bool {
        self.inner
            .lock()
            .attached
            .iter()
            .any(|descriptor| descriptor.locator() == locator)
    }

    /// Returns how many times `locator` has been injected.
    #[must_use]
    pub fn injections(&self, locator: &Url) -> usize {
        self.inner
            .lock()
            .injections
            .get(locator)
            .copied()
            .unwrap_or(0)
    }

    /// Returns true if an injection of `locator` is waiting to be released.
    #[must_use]
    pub fn is_held(&self, locator: &Url) -> bool {
        self.inner
            .lock()
            .held
            .values()
            .any(|(held, _)| held == locator)
    }
}

#[async_trait]
impl ResourceEnvironment for Document {
    async fn inject(&self, descriptor: &ResourceDescriptor) -> Result<(), EnvironmentError> {
        let pending = {
            let mut inner = self.inner.lock();
            inner.attached.push(descriptor.clone());
            *inner
                .injections
                .entry(descriptor.locator().clone())
                .or_insert(0) += 1;

            let behavior = inner
                .behaviors
                .get(descriptor.locator())
                .cloned()
                .unwrap_or_else(|| inner.default_behavior.clone());

            match behavior {
                LoadBehavior::Succeed => return Ok(()),
                LoadBehavior::Fail(reason) => return Err(EnvironmentError::Rejected(reason)),
                LoadBehavior::Hold => {
                    let (tx, rx) = oneshot::channel();
                    inner.held.insert(
                        descriptor.identity().clone(),
                        (descriptor.locator().clone(), tx),
                    );
                    rx
                }
            }
        };

        pending.await.unwrap_or(Err(EnvironmentError::Detached))
    }

    fn detach(&self, descriptor: &ResourceDescriptor) {
        let mut inner = self.inner.lock();
        inner
            .attached
            .retain(|attached| attached.identity() != descriptor.identity());
        // Dropping the completion wakes the injection with `Detached`.
        inner.held.remove(descriptor.identity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(locator: &str) -> ResourceDescriptor {
        ResourceDescriptor::script("engine", locator).unwrap()
    }

    #[tokio::test]
    async fn failing_locator_reports_reason() {
        let document = Document::new();
        let script = descriptor("https://cdn.example/broken.js");
        document.set_behavior(script.locator(), LoadBehavior::Fail("syntax error".into()));

        let err = document.inject(&script).await.unwrap_err();
        assert_eq!(err, EnvironmentError::Rejected("syntax error".into()));
        assert!(document.is_attached(script.locator()));
    }

    #[tokio::test]
    async fn held_injection_completes_on_release() {
        let document = std::sync::Arc::new(Document::new().with_default_behavior(LoadBehavior::Hold));
        let script = descriptor("https://cdn.example/slow.js");

        let task = tokio::spawn({
            let document = document.clone();
            let script = script.clone();
            async move { document.inject(&script).await }
        });
        tokio::task::yield_now().await;

        assert!(document.is_held(script.locator()));
        assert!(document.release(script.locator()));
        assert_eq!(task.await.unwrap(), Ok(()));
        assert!(!document.release(script.locator()));
    }

    #[tokio::test]
    async fn detach_wakes_held_injection() {
        let document = std::sync::Arc::new(Document::new().with_default_behavior(LoadBehavior::Hold));
        let script = descriptor("https://cdn.example/slow.js");

        let task = tokio::spawn({
            let document = document.clone();
            let script = script.clone();
            async move { document.inject(&script).await }
        });
        tokio::task::yield_now().await;

        document.detach(&script);
        assert_eq!(task.await.unwrap(), Err(EnvironmentError::Detached));
        assert!(document.attached().is_empty());
        assert_eq!(document.injections(script.locator()), 1);
    }
}
