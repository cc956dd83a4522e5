//! Substitute engines for tests and demos.
//!
//! Neither engine typesets anything real. They produce small, deterministic
//! markup derived from their input and record every call, which is enough to
//! drive the adapters through all of their states.

use crate::diagram::{DiagramConfig, DiagramEngine, JobId, RenderedDiagram};
use crate::element::{Element, escape_html};
use crate::error::{DiagramError, MathError};
use crate::math::{MathEngine, MathOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;

// ─────────────────────────────────────────────────────────────────────────────
// MockMathEngine
// ─────────────────────────────────────────────────────────────────────────────

/// A math engine that wraps the escaped expression in a span.
///
/// Unbalanced braces count as malformed input. Under `throw_on_error: false`
/// they are rendered as an in-band error placeholder, otherwise they fail the
/// call with [`MathError::Parse`].
#[derive(Debug, Default)]
pub struct MockMathEngine {
    calls: Mutex<Vec<(String, MathOptions)>>,
}

impl MockMathEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `(expression, options)` pair rendered so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, MathOptions)> {
        self.calls.lock().clone()
    }
}

fn brace_error(expression: &str) -> Option<String> {
    let mut depth = 0i32;
    for (position, ch) in expression.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Some(format!("Extra }} at position {position}"));
                }
            }
            _ => {}
        }
    }
    (depth > 0).then(|| "Expected '}', got 'EOF' at end of input".to_string())
}

impl MathEngine for MockMathEngine {
    fn render(
        &self,
        expression: &str,
        target: &mut Element,
        options: &MathOptions,
    ) -> Result<(), MathError> {
        self.calls.lock().push((expression.to_string(), *options));

        if let Some(message) = brace_error(expression) {
            if options.throw_on_error {
                return Err(MathError::Parse(message));
            }
            target.set_markup(format!(
                "<span class=\"katex-error\" title=\"ParseError: {}\">{}</span>",
                escape_html(&message),
                escape_html(expression)
            ));
            return Ok(());
        }

        let class = if options.display_mode {
            "katex-display"
        } else {
            "katex"
        };
        target.set_markup(format!(
            "<span class=\"{class}\">{}</span>",
            escape_html(expression)
        ));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MockDiagramEngine
// ─────────────────────────────────────────────────────────────────────────────

type Completion = oneshot::Sender<Result<RenderedDiagram, DiagramError>>;

#[derive(Default)]
struct DiagramInner {
    config: Option<DiagramConfig>,
    jobs: Vec<(JobId, String)>,
    held: HashMap<JobId, (String, Completion)>,
}

/// A diagram engine that answers with a tiny SVG embedding the source.
///
/// By default every render resolves immediately. In [`manual`](Self::manual)
/// mode renders stay pending until [`resolve`](Self::resolve) or
/// [`reject`](Self::reject) is called, in any order.
#[derive(Default)]
pub struct MockDiagramEngine {
    manual: bool,
    fail_on: Option<String>,
    inner: Mutex<DiagramInner>,
}

impl core::fmt::Debug for MockDiagramEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MockDiagramEngine")
            .field("manual", &self.manual)
            .field("jobs", &inner.jobs.len())
            .field("held", &inner.held.len())
            .finish()
    }
}

impl MockDiagramEngine {
    /// Creates an engine that resolves every render immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds every render until it is resolved or rejected by hand.
    #[must_use]
    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    /// Rejects sources that contain `needle`.
    #[must_use]
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    /// Returns the configuration passed to [`DiagramEngine::initialize`].
    #[must_use]
    pub fn config(&self) -> Option<DiagramConfig> {
        self.inner.lock().config.clone()
    }

    /// Returns every `(job, source)` pair rendered so far.
    #[must_use]
    pub fn jobs(&self) -> Vec<(JobId, String)> {
        self.inner.lock().jobs.clone()
    }

    /// Returns the number of render calls.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    /// Completes a held job with its normal outcome.
    ///
    /// Returns false if the job is not held.
    pub fn resolve(&self, job: &JobId) -> bool {
        let Some((source, completion)) = self.inner.lock().held.remove(job) else {
            return false;
        };
        completion.send(self.outcome(job, &source)).is_ok()
    }

    /// Fails a held job.
    ///
    /// Returns false if the job is not held.
    pub fn reject(&self, job: &JobId, reason: impl Into<String>) -> bool {
        let Some((_, completion)) = self.inner.lock().held.remove(job) else {
            return false;
        };
        completion
            .send(Err(DiagramError::Engine(reason.into())))
            .is_ok()
    }

    fn outcome(&self, job: &JobId, source: &str) -> Result<RenderedDiagram, DiagramError> {
        if let Some(needle) = &self.fail_on
            && source.contains(needle.as_str())
        {
            return Err(DiagramError::Syntax(format!("unexpected token near '{needle}'")));
        }
        Ok(RenderedDiagram {
            svg: format!(
                "<svg id=\"{job}\" xmlns=\"http://www.w3.org/2000/svg\"><desc>{}</desc></svg>",
                escape_html(source)
            ),
        })
    }
}

#[async_trait]
impl DiagramEngine for MockDiagramEngine {
    fn initialize(&self, config: &DiagramConfig) {
        self.inner.lock().config = Some(config.clone());
    }

    async fn render(&self, job: &JobId, source: &str) -> Result<RenderedDiagram, DiagramError> {
        let pending = {
            let mut inner = self.inner.lock();
            inner.jobs.push((job.clone(), source.to_string()));
            if !self.manual {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                inner.held.insert(job.clone(), (source.to_string(), tx));
                Some(rx)
            }
        };

        match pending {
            None => self.outcome(job, source),
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DiagramError::Engine("render dropped".into()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_braces_render_placeholder() {
        let engine = MockMathEngine::new();
        let mut target = Element::new();
        let options = MathOptions {
            display_mode: false,
            throw_on_error: false,
        };

        engine.render("\\frac{1", &mut target, &options).unwrap();
        assert!(target.markup().contains("katex-error"));

        let strict = MathOptions {
            throw_on_error: true,
            ..options
        };
        assert!(matches!(
            engine.render("\\frac{1", &mut target, &strict),
            Err(MathError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn manual_jobs_resolve_in_any_order() {
        let engine = std::sync::Arc::new(MockDiagramEngine::new().manual());
        let first = JobId::next();
        let second = JobId::next();

        let a = tokio::spawn({
            let engine = engine.clone();
            let job = first.clone();
            async move { engine.render(&job, "graph TD; A").await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            let job = second.clone();
            async move { engine.render(&job, "graph TD; B").await }
        });
        while engine.render_count() < 2 {
            tokio::task::yield_now().await;
        }

        assert!(engine.resolve(&second));
        assert!(engine.reject(&first, "timeout"));
        assert!(b.await.unwrap().unwrap().svg.contains("graph TD; B"));
        assert!(a.await.unwrap().is_err());
    }
}
