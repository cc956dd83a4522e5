//! Asynchronous loading, readiness gating and rendering adapters for
//! third-party math and diagram engines.

pub use axiom_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use axiom_internal::prelude::*;
}
