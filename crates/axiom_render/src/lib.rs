//! Math and diagram engine adapters for Axiom.
//!
//! Engines are shared, process-wide capabilities held in an [`EngineSlot`].
//! [`MathPlugin`] and [`DiagramPlugin`] fill the slots once their resources
//! have loaded, and the adapters read from them:
//!
//! - [`MathRenderer`] typesets one expression synchronously into a target it
//!   owns, and contains every engine failure.
//! - [`DiagramRenderer`] renders one diagram source asynchronously, tracking
//!   `Idle`, `Pending`, `Succeeded` and `Failed`, and lets the latest input win.
//!
//! Engine output is trusted markup and is never sanitized. Revisit that if
//! expressions or diagram sources ever come from users.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use axiom_render::{DiagramConfig, DiagramEngineSlot, DiagramRenderer, DiagramState};
//! use axiom_render::dev::MockDiagramEngine;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let slot = Arc::new(DiagramEngineSlot::new("diagram"));
//! slot.install(Arc::new(MockDiagramEngine::new()), DiagramConfig::default()).unwrap();
//!
//! let mut renderer = DiagramRenderer::new(slot);
//! renderer.set_inputs("graph TD; A-->B", true).unwrap();
//! let state = renderer.wait_settled().await;
//! assert!(matches!(state, DiagramState::Succeeded { .. }));
//! # });
//! ```

mod diagram;
mod element;
mod engine;
mod error;
mod math;
mod plugin;

#[cfg(any(test, feature = "test-utils"))]
pub mod dev;

pub use diagram::{
    DIAGRAM_FAILURE_MESSAGE, DiagramConfig, DiagramEngine, DiagramEngineSlot, DiagramRenderer,
    DiagramState, JobId, RenderedDiagram,
};
pub use element::{Element, escape_html};
pub use engine::EngineSlot;
pub use error::{DiagramError, EngineError, MathError};
pub use math::{
    MATH_ERROR_CLASS, MathConfig, MathEngine, MathEngineSlot, MathOptions, MathRenderer,
    RenderRequest,
};
pub use plugin::{DiagramAssets, DiagramPlugin, MathAssets, MathPlugin};
