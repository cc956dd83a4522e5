//! Acquisition of external resources.
//!
//! The [`ResourceLoader`] remembers every locator it has been asked for. It
//! guarantees that a locator is injected at most once at a time and never
//! again after it has loaded. Requests go through a [`LoaderScope`], which
//! owns what it injected and releases all of it when closed or dropped.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use axiom_resource::{Document, ResourceDescriptor, ResourceLoader};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let document = Arc::new(Document::new());
//! let loader = ResourceLoader::new(document.clone());
//! let scope = loader.scope();
//!
//! let script = ResourceDescriptor::script("katex", "https://cdn.example/katex.js")?;
//! let signal = scope.load(script.clone())?;
//! signal.wait().await?;
//! assert!(loader.readiness().get("katex").unwrap());
//!
//! drop(scope);
//! assert!(!document.is_attached(script.locator()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

use crate::descriptor::ResourceDescriptor;
use crate::environment::ResourceEnvironment;
use crate::error::{EnvironmentError, ResourceError};
use crate::signal::{LoadStatus, ReadinessSignal, ReadinessState};
use axiom_system::resource::{GlobalResource, Resource};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// What the loader keeps of a scope that registered a callback.
#[derive(Clone)]
struct ScopeHandle {
    id: u64,
    closed: Arc<AtomicBool>,
    inner: Weak<Mutex<ScopeInner>>,
    runtime: Handle,
}

impl ScopeHandle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Injects `attempt` on behalf of this scope, taking over a load whose
    /// owner closed.
    fn adopt(&self, loader: &ResourceLoader, attempt: ResourceDescriptor) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.lock();
        // A scope closing concurrently has already handled the entry.
        if self.is_closed() {
            return;
        }
        tracing::debug!(
            resource = %attempt.name(),
            scope = self.id,
            "taking over in-flight load"
        );
        inner.acquired.push(attempt.clone());
        inner.tasks.retain(|task| !task.is_finished());
        inner.tasks.push(loader.spawn_injection(&self.runtime, attempt, self.closed.clone()));
    }
}

/// A completion callback together with the scope that registered it.
struct PendingCallback {
    scope: ScopeHandle,
    callback: Callback,
}

/// Everything the loader knows about one locator.
struct Entry {
    /// Descriptor of the latest injection attempt.
    descriptor: ResourceDescriptor,
    status: watch::Sender<LoadStatus>,
    /// Scope responsible for the in-flight attempt, if any.
    owner: Option<u64>,
    callbacks: Vec<PendingCallback>,
}

impl Entry {
    fn signal(&self) -> ReadinessSignal {
        ReadinessSignal::new(
            self.descriptor.name().into(),
            self.status.subscribe(),
        )
    }

    fn status(&self) -> LoadStatus {
        self.status.borrow().clone()
    }
}

#[derive(Default)]
struct LoaderState {
    entries: HashMap<Url, Entry>,
}

/// Process-wide registry of external resource loads.
///
/// Cloning a loader is cheap; clones share the same registry.
#[derive(Clone)]
pub struct ResourceLoader {
    environment: Arc<dyn ResourceEnvironment>,
    state: Arc<Mutex<LoaderState>>,
}

impl Resource for ResourceLoader {}
impl GlobalResource for ResourceLoader {}

impl core::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

impl ResourceLoader {
    /// Creates a loader that injects into `environment`.
    #[must_use]
    pub fn new(environment: Arc<dyn ResourceEnvironment>) -> Self {
        Self {
            environment,
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    /// Opens a new acquisition scope.
    #[must_use]
    pub fn scope(&self) -> LoaderScope {
        LoaderScope {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            loader: self.clone(),
            closed: Arc::new(AtomicBool::new(false)),
            inner: Arc::new(Mutex::new(ScopeInner::default())),
        }
    }

    /// Returns the environment resources are injected into.
    #[must_use]
    pub fn environment(&self) -> &Arc<dyn ResourceEnvironment> {
        &self.environment
    }

    /// Returns the readiness signal for a locator that was requested before.
    #[must_use]
    pub fn signal(&self, locator: &Url) -> Option<ReadinessSignal> {
        self.state.lock().entries.get(locator).map(Entry::signal)
    }

    /// Returns a snapshot of every known resource, keyed by resource name.
    #[must_use]
    pub fn readiness(&self) -> ReadinessState {
        let state = self.state.lock();
        let mut snapshot = ReadinessState::default();
        for entry in state.entries.values() {
            snapshot.insert(entry.descriptor.name(), entry.status());
        }
        snapshot
    }

    fn spawn_injection(
        &self,
        runtime: &Handle,
        attempt: ResourceDescriptor,
        closed: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let loader = self.clone();
        runtime.spawn(async move {
            let outcome = loader.environment.inject(&attempt).await;
            loader.complete(&attempt, outcome, &closed);
        })
    }

    /// Records the outcome of an injection attempt.
    ///
    /// Outcomes for closed scopes and for attempts that were superseded by a
    /// retry are discarded.
    fn complete(
        &self,
        descriptor: &ResourceDescriptor,
        outcome: Result<(), EnvironmentError>,
        closed: &AtomicBool,
    ) {
        let locator = descriptor.locator();

        if let Err(err) = outcome {
            let mut state = self.state.lock();
            if closed.load(Ordering::Acquire) {
                return;
            }
            let Some(entry) = state.entries.get_mut(locator) else {
                return;
            };
            if entry.descriptor.identity() != descriptor.identity() {
                return;
            }
            tracing::warn!(
                resource = %descriptor.name(),
                locator = %locator,
                error = %err,
                "external resource failed to load"
            );
            entry.owner = None;
            entry.status.send_replace(LoadStatus::Failed(err.to_string()));
            return;
        }

        // Callbacks run outside the lock. The signal is only published once no
        // callback is left, so observers of `Loaded` see their effects.
        loop {
            let callbacks = {
                let mut state = self.state.lock();
                if closed.load(Ordering::Acquire) {
                    return;
                }
                let Some(entry) = state.entries.get_mut(locator) else {
                    return;
                };
                if entry.descriptor.identity() != descriptor.identity() {
                    return;
                }
                if entry.callbacks.is_empty() {
                    entry.owner = None;
                    entry.status.send_replace(LoadStatus::Loaded);
                    tracing::info!(
                        resource = %descriptor.name(),
                        kind = %descriptor.kind(),
                        locator = %locator,
                        "external resource loaded"
                    );
                    return;
                }
                core::mem::take(&mut entry.callbacks)
            };

            for pending in callbacks {
                if !pending.scope.is_closed() {
                    (pending.callback)();
                }
            }
        }
    }
}

#[derive(Default)]
struct ScopeInner {
    acquired: Vec<ResourceDescriptor>,
    tasks: Vec<JoinHandle<()>>,
}

/// An owning scope for injected resources.
///
/// Everything injected through the scope is detached from the environment
/// when the scope is closed or dropped, whether or not it finished loading.
/// Completions that arrive after that are discarded.
pub struct LoaderScope {
    id: u64,
    loader: ResourceLoader,
    closed: Arc<AtomicBool>,
    inner: Arc<Mutex<ScopeInner>>,
}

impl Resource for LoaderScope {}
impl GlobalResource for LoaderScope {}

impl core::fmt::Debug for LoaderScope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoaderScope")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("acquired", &self.inner.lock().acquired.len())
            .finish()
    }
}

impl LoaderScope {
    /// Requests a resource.
    ///
    /// See [`load_with`](Self::load_with).
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ScopeClosed`] after the scope was closed, or
    /// [`ResourceError::NoRuntime`] when called outside a Tokio runtime.
    pub fn load(&self, descriptor: ResourceDescriptor) -> Result<ReadinessSignal, ResourceError> {
        self.load_with(descriptor, || {})
    }

    /// Requests a resource and registers a completion callback.
    ///
    /// - Already loaded: nothing is injected and `on_loaded` runs immediately.
    /// - Load in flight: the request joins it and `on_loaded` runs when it completes.
    /// - Never requested, or the last attempt failed: the resource is injected
    ///   (again, under a fresh identity) and `on_loaded` runs on success.
    ///
    /// `on_loaded` runs at most once, before the signal reports `Loaded`, and
    /// never after this scope has been closed. Failed loads are not retried
    /// automatically; callbacks stay registered for a manual retry.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::ScopeClosed`] after the scope was closed, or
    /// [`ResourceError::NoRuntime`] when called outside a Tokio runtime.
    pub fn load_with<F>(
        &self,
        descriptor: ResourceDescriptor,
        on_loaded: F,
    ) -> Result<ReadinessSignal, ResourceError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if self.is_closed() {
            return Err(ResourceError::ScopeClosed);
        }
        let runtime = Handle::try_current().map_err(|_| ResourceError::NoRuntime)?;

        let pending = PendingCallback {
            scope: ScopeHandle {
                id: self.id,
                closed: self.closed.clone(),
                inner: Arc::downgrade(&self.inner),
                runtime: runtime.clone(),
            },
            callback: Box::new(on_loaded),
        };

        let mut state = self.loader.state.lock();
        let attempt = match state.entries.get_mut(descriptor.locator()) {
            Some(entry) => match entry.status() {
                LoadStatus::Loaded => {
                    let signal = entry.signal();
                    drop(state);
                    drop(inner);
                    tracing::debug!(
                        resource = %descriptor.name(),
                        "resource already loaded; skipping injection"
                    );
                    (pending.callback)();
                    return Ok(signal);
                }
                LoadStatus::Pending => {
                    tracing::debug!(
                        resource = %descriptor.name(),
                        "joining in-flight load"
                    );
                    entry.callbacks.push(pending);
                    return Ok(entry.signal());
                }
                LoadStatus::Failed(reason) => {
                    tracing::info!(
                        resource = %descriptor.name(),
                        previous_error = %reason,
                        "retrying failed resource"
                    );
                    let attempt = entry.descriptor.reissued();
                    entry.descriptor = attempt.clone();
                    entry.owner = Some(self.id);
                    entry.callbacks.push(pending);
                    entry.status.send_replace(LoadStatus::Pending);
                    attempt
                }
            },
            None => {
                let (status, _) = watch::channel(LoadStatus::Pending);
                state.entries.insert(
                    descriptor.locator().clone(),
                    Entry {
                        descriptor: descriptor.clone(),
                        status,
                        owner: Some(self.id),
                        callbacks: vec![pending],
                    },
                );
                descriptor
            }
        };

        let signal = state
            .entries
            .get(attempt.locator())
            .map(Entry::signal)
            .ok_or(ResourceError::ScopeClosed)?;
        drop(state);

        tracing::debug!(
            resource = %attempt.name(),
            kind = %attempt.kind(),
            locator = %attempt.locator(),
            "injecting external resource"
        );

        inner.acquired.push(attempt.clone());
        inner.tasks.retain(|task| !task.is_finished());

        inner
            .tasks
            .push(self.loader.spawn_injection(&runtime, attempt, self.closed.clone()));

        Ok(signal)
    }

    /// Returns true once the scope has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns the descriptors injected through this scope that are still attached.
    #[must_use]
    pub fn acquired(&self) -> Vec<ResourceDescriptor> {
        self.inner.lock().acquired.clone()
    }

    /// Releases everything this scope injected.
    ///
    /// An in-flight load owned by this scope passes to another open scope
    /// that joined it, which injects it again under its own name. The signal
    /// stays the same. A load nobody else waits for is abandoned: its signal
    /// reports [`LoadError::Abandoned`](crate::LoadError::Abandoned) and the
    /// locator can be injected again by a later scope. Loaded resources stay
    /// loaded. Closing twice does nothing.
    pub fn close(&self) {
        let (acquired, tasks) = {
            let mut inner = self.inner.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            (
                core::mem::take(&mut inner.acquired),
                core::mem::take(&mut inner.tasks),
            )
        };

        for task in &tasks {
            task.abort();
        }

        let (handoffs, abandoned) = {
            let mut state = self.loader.state.lock();
            let mut handoffs = Vec::new();
            let mut abandoned = 0usize;
            state.entries.retain(|_, entry| {
                entry.callbacks.retain(|pending| pending.scope.id != self.id);
                if entry.owner != Some(self.id) || !entry.status().is_pending() {
                    return true;
                }
                entry.callbacks.retain(|pending| !pending.scope.is_closed());
                let Some(heir) = entry.callbacks.first().map(|pending| pending.scope.clone())
                else {
                    abandoned += 1;
                    return false;
                };
                let attempt = entry.descriptor.reissued();
                entry.descriptor = attempt.clone();
                entry.owner = Some(heir.id);
                handoffs.push((heir, attempt));
                true
            });
            (handoffs, abandoned)
        };

        for descriptor in &acquired {
            self.loader.environment.detach(descriptor);
        }
        let handed_over = handoffs.len();
        for (heir, attempt) in handoffs {
            heir.adopt(&self.loader, attempt);
        }

        tracing::debug!(
            scope = self.id,
            released = acquired.len(),
            handed_over,
            abandoned,
            "loader scope closed"
        );
    }
}

impl Drop for LoaderScope {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, LoadBehavior};
    use crate::error::LoadError;
    use core::sync::atomic::AtomicUsize;

    fn script(name: &str, locator: &str) -> ResourceDescriptor {
        ResourceDescriptor::script(name, locator).unwrap()
    }

    #[tokio::test]
    async fn loaded_resource_is_not_injected_twice() {
        let document = Arc::new(Document::new());
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let katex = script("katex", "https://cdn.example/katex.js");

        scope.load(katex.clone()).unwrap().wait().await.unwrap();
        let again = scope.load(katex.clone()).unwrap();

        assert!(again.is_ready());
        assert_eq!(document.injections(katex.locator()), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_injection() {
        let document = Arc::new(Document::new().with_default_behavior(LoadBehavior::Hold));
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let mermaid = script("mermaid", "https://cdn.example/mermaid.js");

        let first = scope.load(mermaid.clone()).unwrap();
        let second = scope.load(mermaid.clone()).unwrap();
        tokio::task::yield_now().await;

        assert_eq!(document.injections(mermaid.locator()), 1);
        document.release(mermaid.locator());

        first.wait().await.unwrap();
        assert!(second.is_ready());
    }

    #[tokio::test]
    async fn callback_runs_once_before_signal_publishes() {
        let document = Arc::new(Document::new());
        let loader = ResourceLoader::new(document);
        let scope = loader.scope();
        let katex = script("katex", "https://cdn.example/katex.js");
        let calls = Arc::new(AtomicUsize::new(0));

        let signal = scope
            .load_with(katex.clone(), {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();
        assert!(!signal.is_ready());

        signal.wait().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Joining after completion invokes the new callback, not the old one.
        scope
            .load_with(katex, {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(10, Ordering::SeqCst);
                }
            })
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn failure_keeps_resource_pending_and_observable() {
        let document = Arc::new(Document::new());
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let mermaid = script("mermaid", "https://cdn.example/mermaid.js");
        document.set_behavior(mermaid.locator(), LoadBehavior::Fail("404".into()));

        let signal = scope.load(mermaid).unwrap();
        let err = signal.wait_settled().await.unwrap_err();

        assert!(matches!(err, LoadError::Failed { .. }));
        assert!(!signal.is_ready());
        assert_eq!(loader.readiness().get("mermaid"), Some(false));
    }

    #[tokio::test]
    async fn manual_retry_reinjects_and_reuses_signal() {
        let document = Arc::new(Document::new());
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let mermaid = script("mermaid", "https://cdn.example/mermaid.js");
        document.set_behavior(mermaid.locator(), LoadBehavior::Fail("offline".into()));

        let signal = scope.load(mermaid.clone()).unwrap();
        assert!(signal.wait_settled().await.is_err());

        document.set_behavior(mermaid.locator(), LoadBehavior::Succeed);
        scope.load(mermaid.clone()).unwrap();

        signal.wait().await.unwrap();
        assert_eq!(document.injections(mermaid.locator()), 2);
    }

    #[tokio::test]
    async fn close_detaches_everything_and_abandons_in_flight() {
        let document = Arc::new(Document::new());
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let css = ResourceDescriptor::style("katex-css", "https://cdn.example/katex.css").unwrap();
        let slow = script("mermaid", "https://cdn.example/mermaid.js");
        document.set_behavior(slow.locator(), LoadBehavior::Hold);

        scope.load(css.clone()).unwrap().wait().await.unwrap();
        let pending = scope.load(slow.clone()).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(document.attached().len(), 2);

        scope.close();

        assert!(document.attached().is_empty());
        assert!(matches!(
            pending.wait().await,
            Err(LoadError::Abandoned { .. })
        ));
        assert!(matches!(
            scope.load(css.clone()),
            Err(ResourceError::ScopeClosed)
        ));

        // Loaded stays loaded; the abandoned locator is requested afresh.
        let next = loader.scope();
        assert!(next.load(css.clone()).unwrap().is_ready());
        assert_eq!(document.injections(css.locator()), 1);
        next.load(slow.clone()).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(document.injections(slow.locator()), 2);
    }

    #[tokio::test]
    async fn late_completion_after_close_changes_nothing() {
        let document = Arc::new(Document::new().with_default_behavior(LoadBehavior::Hold));
        let loader = ResourceLoader::new(document.clone());
        let scope = loader.scope();
        let katex = script("katex", "https://cdn.example/katex.js");
        let fired = Arc::new(AtomicBool::new(false));

        scope
            .load_with(katex.clone(), {
                let fired = fired.clone();
                move || fired.store(true, Ordering::SeqCst)
            })
            .unwrap();
        tokio::task::yield_now().await;

        drop(scope);
        assert!(!document.release(katex.locator()));
        tokio::task::yield_now().await;

        assert!(!fired.load(Ordering::SeqCst));
        assert!(loader.readiness().is_empty());
    }

    #[test]
    fn loading_outside_runtime_is_an_error() {
        let loader = ResourceLoader::new(Arc::new(Document::new()));
        let scope = loader.scope();
        let err = scope
            .load(script("katex", "https://cdn.example/katex.js"))
            .unwrap_err();
        assert_eq!(err, ResourceError::NoRuntime);
    }
}
