//! # Axiom Internal Library
//!
//! Re-exports the core Axiom crates for convenience.

/// Layer 1: Plugin host and shared resources.
pub use axiom_system;

/// Layer 1: Tracing infrastructure.
pub use axiom_core;

/// Layer 2: External resource loading and readiness gating.
pub use axiom_resource;

/// Layer 2: Math and diagram engine adapters.
pub use axiom_render;

/// Layer 3: Page composition and site configuration.
pub use axiom_content;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use axiom_content::{ComposedPage, PageComposer, SiteConfig, SitePlugins, TechniquePage};
    pub use axiom_core::TracingPlugin;
    pub use axiom_render::{
        DiagramEngine, DiagramPlugin, DiagramRenderer, DiagramState, MathEngine, MathPlugin,
        MathRenderer, RenderRequest,
    };
    pub use axiom_resource::{
        Document, ReadinessGate, ResourceDescriptor, ResourceEnvironment, ResourcePlugin,
    };
    pub use axiom_system::prelude::*;
}
