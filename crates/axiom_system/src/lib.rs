//! The plugin host for Axiom (Layer 1).
//!
//! `axiom_system` provides the primitives every other Axiom crate builds on:
//!
//! - [`plugin`] - Plugin trait, plugin identity and plugin groups
//! - [`resource`] - Type-keyed storage for shared state
//! - [`site`] - The [`Site`](site::Site) runtime that orchestrates plugins
//!
//! # Architecture
//!
//! - **Layer 1** (`axiom_system`, `axiom_core`): host runtime and infrastructure
//! - **Layer 2** (`axiom_resource`, `axiom_render`): resource loading and engine adapters
//! - **Layer 3** (`axiom_content`): page composition on top of the adapters
//!
//! # Example
//!
//! ```
//! use axiom_system::plugin::Plugin;
//! use axiom_system::resource::{GlobalResource, Resource};
//! use axiom_system::site::Site;
//!
//! #[derive(Default)]
//! struct Theme { name: &'static str }
//! impl Resource for Theme {}
//! impl GlobalResource for Theme {}
//!
//! struct ThemePlugin;
//!
//! impl Plugin for ThemePlugin {
//!     fn build(&self, site: &mut Site) {
//!         site.insert_global(Theme { name: "default" });
//!     }
//! }
//!
//! let mut site = Site::new();
//! site.add_plugins(ThemePlugin);
//! site.finish();
//!
//! assert_eq!(site.get_global::<Theme>().unwrap().name, "default");
//! ```

pub mod plugin;
pub mod resource;
pub mod site;

/// Everything needed to write a plugin.
pub mod prelude {
    pub use crate::plugin::*;
    pub use crate::resource::*;
    pub use crate::site::*;
}
