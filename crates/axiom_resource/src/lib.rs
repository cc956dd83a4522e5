//! External resource loading and readiness gating for Axiom.
//!
//! Rendering engines live outside the process image: a math typesetter and a
//! diagram renderer are fetched from a CDN when a site starts. This crate
//! acquires them and tells the rest of the site when they can be used.
//!
//! # Overview
//!
//! - [`ResourceLoader`] injects style and script resources into a
//!   [`ResourceEnvironment`], at most once per locator, and hands out a
//!   [`ReadinessSignal`] per resource.
//! - [`LoaderScope`] owns what it injected and detaches all of it on close.
//! - [`ReadinessGate`] folds the signals into a single monotonic flag.
//! - [`ResourcePlugin`] wires all three into a [`Site`](axiom_system::site::Site).
//!
//! Two environments ship with the crate: the in-memory [`Document`] and, with
//! the `http` feature, [`HttpEnvironment`].

mod descriptor;
mod document;
mod environment;
mod error;
mod gate;
#[cfg(feature = "http")]
mod http;
mod loader;
mod plugin;
mod signal;

pub use descriptor::{ResourceDescriptor, ResourceHandle, ResourceKind};
pub use document::{Document, LoadBehavior};
pub use environment::ResourceEnvironment;
pub use error::{EnvironmentError, GateError, LoadError, ResourceError};
pub use gate::{GateState, ReadinessGate, ReadinessRegistry};
#[cfg(feature = "http")]
pub use http::{FetchedAsset, HttpEnvironment};
pub use loader::{LoaderScope, ResourceLoader};
pub use plugin::ResourcePlugin;
pub use signal::{LoadStatus, ReadinessSignal, ReadinessState};
