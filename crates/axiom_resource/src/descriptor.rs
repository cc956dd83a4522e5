//! Descriptors for external style and script resources.

use crate::error::ResourceError;
use core::fmt;
use std::sync::Arc;
use url::Url;

/// The kind of external resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A stylesheet (e.g. the math engine's fonts and layout rules).
    Style,
    /// An executable script (e.g. an engine bundle).
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Style => f.write_str("style"),
            ResourceKind::Script => f.write_str("script"),
        }
    }
}

/// Opaque identity of one injection attempt.
///
/// Generated with nanoid, so handles never collide between attempts even when
/// the same locator is injected again after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Arc<str>);

impl ResourceHandle {
    /// Creates a new unique handle.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res_{}", self.0)
    }
}

/// An external resource to inject into the environment.
///
/// # Example
///
/// ```
/// use axiom_resource::{ResourceDescriptor, ResourceKind};
///
/// let katex = ResourceDescriptor::script(
///     "katex",
///     "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js",
/// )?;
/// assert_eq!(katex.kind(), ResourceKind::Script);
/// assert_eq!(katex.name(), "katex");
/// # Ok::<(), axiom_resource::ResourceError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    name: Arc<str>,
    kind: ResourceKind,
    locator: Url,
    identity: ResourceHandle,
}

impl ResourceDescriptor {
    /// Creates a descriptor, validating the locator.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidLocator`] if `locator` is not an absolute URL.
    pub fn new(
        name: impl Into<Arc<str>>,
        kind: ResourceKind,
        locator: impl AsRef<str>,
    ) -> Result<Self, ResourceError> {
        let locator = locator.as_ref();
        let parsed = Url::parse(locator).map_err(|err| ResourceError::InvalidLocator {
            locator: locator.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self::from_url(name, kind, parsed))
    }

    /// Creates a descriptor from an already parsed URL.
    #[must_use]
    pub fn from_url(name: impl Into<Arc<str>>, kind: ResourceKind, locator: Url) -> Self {
        Self {
            name: name.into(),
            kind,
            locator,
            identity: ResourceHandle::new(),
        }
    }

    /// Creates a script descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidLocator`] if `locator` is not an absolute URL.
    pub fn script(
        name: impl Into<Arc<str>>,
        locator: impl AsRef<str>,
    ) -> Result<Self, ResourceError> {
        Self::new(name, ResourceKind::Script, locator)
    }

    /// Creates a stylesheet descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidLocator`] if `locator` is not an absolute URL.
    pub fn style(
        name: impl Into<Arc<str>>,
        locator: impl AsRef<str>,
    ) -> Result<Self, ResourceError> {
        Self::new(name, ResourceKind::Style, locator)
    }

    /// Returns the name used as the readiness key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the resource locator.
    #[must_use]
    pub fn locator(&self) -> &Url {
        &self.locator
    }

    /// Returns the identity of this injection attempt.
    #[must_use]
    pub fn identity(&self) -> &ResourceHandle {
        &self.identity
    }

    /// Returns a copy with a fresh identity, used when a failed load is retried.
    #[must_use]
    pub(crate) fn reissued(&self) -> Self {
        Self {
            identity: ResourceHandle::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_locator_is_rejected() {
        let err = ResourceDescriptor::script("katex", "/static/katex.js").unwrap_err();
        assert!(matches!(err, ResourceError::InvalidLocator { .. }));
    }

    #[test]
    fn descriptors_get_distinct_identities() {
        let a = ResourceDescriptor::style("katex-css", "https://cdn.example/katex.css").unwrap();
        let b = ResourceDescriptor::style("katex-css", "https://cdn.example/katex.css").unwrap();
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.locator(), b.locator());
    }

    #[test]
    fn reissue_keeps_locator_and_changes_identity() {
        let original = ResourceDescriptor::script("mermaid", "https://cdn.example/m.js").unwrap();
        let retry = original.reissued();
        assert_eq!(retry.name(), "mermaid");
        assert_eq!(retry.locator(), original.locator());
        assert_ne!(retry.identity(), original.identity());
    }
}
