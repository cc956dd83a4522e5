//! Technique pages built on Axiom's rendering adapters (Layer 3).
//!
//! A page is static content: title, description, steps, worked examples, an
//! optional flow diagram and an optional image. [`PageComposer`] turns it
//! into markup once the [`ReadinessGate`](axiom_resource::ReadinessGate) is
//! open, mounting one math renderer per worked example and one diagram
//! renderer. Until then it yields a loading view and constructs nothing.
//!
//! [`SitePlugins`] wires a whole site from a [`SiteConfig`].

mod composer;
mod config;
mod error;
mod page;
mod plugins;

pub use composer::{ComposedPage, PageComposer, RenderedPage};
pub use config::SiteConfig;
pub use error::{ComposeError, ConfigError};
pub use page::{PageImage, TechniquePage, WorkedExample};
pub use plugins::SitePlugins;
