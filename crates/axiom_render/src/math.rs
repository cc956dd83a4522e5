//! Math expression rendering.

use crate::element::{Element, write_text_element};
use crate::engine::EngineSlot;
use crate::error::MathError;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Options passed to the math engine on every render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathOptions {
    /// `true` renders a standalone block, `false` renders inline.
    pub display_mode: bool,
    /// Whether malformed input may fail the call instead of producing an
    /// in-band error placeholder.
    pub throw_on_error: bool,
}

/// A typesetting engine for math expressions.
///
/// The engine writes presentation markup into `target`. Installed with
/// `throw_on_error: false`, it is expected to report malformed input by
/// writing a visible placeholder rather than by returning an error.
pub trait MathEngine: Send + Sync + 'static {
    /// Typesets `expression` into `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`MathError`] if the expression cannot be rendered and the
    /// options allow failing.
    fn render(
        &self,
        expression: &str,
        target: &mut Element,
        options: &MathOptions,
    ) -> Result<(), MathError>;
}

/// Configuration a math engine is installed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathConfig {
    /// Forwarded to every render call. Sites install with `false`.
    pub throw_on_error: bool,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            throw_on_error: false,
        }
    }
}

/// The process-wide math engine slot.
pub type MathEngineSlot = EngineSlot<dyn MathEngine, MathConfig>;

/// One render request for a math target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Expression in the engine's grammar.
    pub expression: String,
    /// `true` for block rendering, `false` for inline.
    pub display_mode: bool,
}

impl RenderRequest {
    /// Creates an inline request.
    #[must_use]
    pub fn inline(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            display_mode: false,
        }
    }

    /// Creates a display-mode request.
    #[must_use]
    pub fn display(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            display_mode: true,
        }
    }
}

/// CSS class of the element written when the engine fails outright.
pub const MATH_ERROR_CLASS: &str = "math-error";

/// Renders one math expression into a target it owns.
///
/// The renderer re-invokes the engine whenever the request changes and does
/// nothing when it is repeated. Engine failures, returned or panicked, are
/// contained: they are logged and shown in place of the expression.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use axiom_render::{MathConfig, MathEngineSlot, MathRenderer, RenderRequest};
/// use axiom_render::dev::MockMathEngine;
///
/// let slot = Arc::new(MathEngineSlot::new("math"));
/// slot.install(Arc::new(MockMathEngine::new()), MathConfig::default()).unwrap();
///
/// let mut renderer = MathRenderer::new(slot);
/// renderer.render(RenderRequest::inline("x^2"));
/// assert!(renderer.html().contains("x^2"));
/// ```
#[derive(Debug)]
pub struct MathRenderer {
    slot: Arc<MathEngineSlot>,
    target: Element,
    rendered: Option<RenderRequest>,
}

impl MathRenderer {
    /// Creates a renderer with an empty target.
    #[must_use]
    pub fn new(slot: Arc<MathEngineSlot>) -> Self {
        Self {
            slot,
            target: Element::new(),
            rendered: None,
        }
    }

    /// Renders `request` into the target, replacing prior output.
    ///
    /// A request equal to the last rendered one is skipped. Without an
    /// installed engine the target is left empty and nothing is recorded, so
    /// the next call renders once the engine is there.
    pub fn render(&mut self, request: RenderRequest) {
        if self.rendered.as_ref() == Some(&request) {
            return;
        }

        let Some((engine, config)) = self.slot.get() else {
            tracing::debug!("math engine not installed; leaving target empty");
            self.target.clear();
            self.rendered = None;
            return;
        };

        let options = MathOptions {
            display_mode: request.display_mode,
            throw_on_error: config.throw_on_error,
        };

        self.target.clear();
        let target = &mut self.target;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            engine.render(&request.expression, target, &options)
        }));

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        if let Some(message) = failure {
            tracing::error!(
                expression = %request.expression,
                display_mode = request.display_mode,
                error = %message,
                "math rendering failed"
            );
            let mut markup = String::new();
            write_text_element(&mut markup, "span", MATH_ERROR_CLASS, &message);
            self.target.set_markup(markup);
        }

        self.rendered = Some(request);
    }

    /// Convenience for [`render`](Self::render).
    pub fn update(&mut self, expression: &str, display_mode: bool) {
        self.render(RenderRequest {
            expression: expression.to_string(),
            display_mode,
        });
    }

    /// Returns the last rendered request.
    #[must_use]
    pub fn request(&self) -> Option<&RenderRequest> {
        self.rendered.as_ref()
    }

    /// Returns the target element.
    #[must_use]
    pub fn target(&self) -> &Element {
        &self.target
    }

    /// Returns the target markup.
    #[must_use]
    pub fn html(&self) -> &str {
        self.target.markup()
    }
}

fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "math engine panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::MockMathEngine;
    use proptest::prelude::*;

    struct PanickingEngine;

    impl MathEngine for PanickingEngine {
        fn render(&self, _: &str, _: &mut Element, _: &MathOptions) -> Result<(), MathError> {
            panic!("undefined is not a function");
        }
    }

    struct ThrowingEngine;

    impl MathEngine for ThrowingEngine {
        fn render(&self, _: &str, _: &mut Element, _: &MathOptions) -> Result<(), MathError> {
            Err(MathError::Engine("font <missing>".into()))
        }
    }

    fn installed(engine: impl MathEngine) -> Arc<MathEngineSlot> {
        let slot = Arc::new(MathEngineSlot::new("math"));
        slot.install(Arc::new(engine), MathConfig::default()).unwrap();
        slot
    }

    #[test]
    fn absent_engine_leaves_target_empty() {
        let slot = Arc::new(MathEngineSlot::new("math"));
        let mut renderer = MathRenderer::new(slot.clone());

        renderer.update("a+b", false);
        assert!(renderer.target().is_empty());
        assert!(renderer.request().is_none());

        slot.install(Arc::new(MockMathEngine::new()), MathConfig::default())
            .unwrap();
        renderer.update("a+b", false);
        assert!(!renderer.target().is_empty());
    }

    #[test]
    fn changing_display_mode_rerenders() {
        let engine = Arc::new(MockMathEngine::new());
        let slot = Arc::new(MathEngineSlot::new("math"));
        slot.install(engine.clone(), MathConfig::default()).unwrap();
        let mut renderer = MathRenderer::new(slot);

        renderer.update("a+b", false);
        renderer.update("a+b", false);
        renderer.update("a+b", true);

        assert_eq!(engine.calls().len(), 2);
        assert!(engine.calls()[1].1.display_mode);
        assert!(!engine.calls()[1].1.throw_on_error);
    }

    #[test]
    fn panic_is_caught_and_shown() {
        let mut renderer = MathRenderer::new(installed(PanickingEngine));
        renderer.update("x", true);
        assert!(renderer.html().contains(MATH_ERROR_CLASS));
        assert!(renderer.html().contains("undefined is not a function"));
    }

    #[test]
    fn returned_error_is_escaped() {
        let mut renderer = MathRenderer::new(installed(ThrowingEngine));
        renderer.update("x", false);
        assert_eq!(
            renderer.html(),
            "<span class=\"math-error\">math engine error: font &lt;missing&gt;</span>"
        );
    }

    proptest! {
        #[test]
        fn rendering_is_idempotent(expression in "[a-z0-9+^{}\\\\ ]{0,24}", display in any::<bool>(), repeats in 1usize..5) {
            let slot = installed(MockMathEngine::new());

            let mut once = MathRenderer::new(slot.clone());
            once.update(&expression, display);

            let mut many = MathRenderer::new(slot);
            for _ in 0..repeats {
                many.update(&expression, display);
            }
            prop_assert_eq!(once.html(), many.html());
        }
    }
}
