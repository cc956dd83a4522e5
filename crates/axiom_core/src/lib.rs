//! Core infrastructure plugins for Axiom.
//!
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//!
//! # Example
//!
//! ```
//! use axiom_system::site::Site;
//! use axiom_core::TracingPlugin;
//! use tracing::Level;
//!
//! Site::new()
//!     .add_plugins(TracingPlugin::default().with_level(Level::DEBUG))
//!     .finish();
//! ```

mod tracing_plugin;

pub use tracing_plugin::{TracingConfig, TracingFormat, TracingPlugin};
