//! Error types for resource loading and readiness gating.

/// Errors raised when requesting a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// The locator is not a valid absolute URL.
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator {
        /// The rejected locator text.
        locator: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The owning scope was already closed.
    #[error("loader scope is closed")]
    ScopeClosed,

    /// Loading was requested outside a Tokio runtime.
    #[error("resource loading requires a Tokio runtime")]
    NoRuntime,
}

/// Errors reported by a [`ResourceEnvironment`](crate::ResourceEnvironment).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    /// The resource could not be fetched.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} for {locator}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested locator.
        locator: String,
    },

    /// The environment refused or could not evaluate the resource.
    #[error("resource rejected: {0}")]
    Rejected(String),

    /// The resource was detached before it finished loading.
    #[error("resource detached before load completed")]
    Detached,
}

/// Errors observed while waiting on a [`ReadinessSignal`](crate::ReadinessSignal).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The most recent load attempt failed.
    #[error("resource '{name}' failed to load: {reason}")]
    Failed {
        /// Resource name.
        name: String,
        /// Failure reported by the environment.
        reason: String,
    },

    /// The scope that owned the in-flight load was closed.
    #[error("load of resource '{name}' was abandoned")]
    Abandoned {
        /// Resource name.
        name: String,
    },
}

/// Errors observed while waiting on a [`ReadinessGate`](crate::ReadinessGate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// A tracked signal can no longer become ready.
    #[error("readiness gate cannot open: {0}")]
    Load(#[from] LoadError),
}
