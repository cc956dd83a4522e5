//! Asynchronous diagram rendering.

use crate::element::write_text_element;
use crate::engine::EngineSlot;
use crate::error::DiagramError;
use async_trait::async_trait;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

static NEXT_JOB: AtomicU64 = AtomicU64::new(1);

/// Identifier of one diagram render attempt.
///
/// Formatted as `diagram-<sequence>-<nanoid>` and never reused within a
/// process, since diagram engines key their scratch render targets by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(Arc<str>);

impl JobId {
    /// Generates a fresh id.
    #[must_use]
    pub fn next() -> Self {
        let sequence = NEXT_JOB.fetch_add(1, Ordering::Relaxed);
        let suffix = nanoid::nanoid!(8, &nanoid::alphabet::SAFE);
        Self(format!("diagram-{sequence}-{suffix}").into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of a successful diagram render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    /// SVG markup produced by the engine.
    pub svg: String,
}

/// A diagram engine that turns diagram source into SVG.
#[async_trait]
pub trait DiagramEngine: Send + Sync + 'static {
    /// Applies the initial configuration. Called once, on installation.
    fn initialize(&self, _config: &DiagramConfig) {}

    /// Renders `source` under the scratch id `job`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiagramError`] if the source is invalid or the engine fails.
    async fn render(&self, job: &JobId, source: &str) -> Result<RenderedDiagram, DiagramError>;
}

/// Configuration a diagram engine is installed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Whether the engine scans the page for diagrams on its own. Sites install with `false`.
    pub start_on_load: bool,
    /// Engine theme name.
    pub theme: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            start_on_load: false,
            theme: "default".to_string(),
        }
    }
}

/// The process-wide diagram engine slot.
pub type DiagramEngineSlot = EngineSlot<dyn DiagramEngine, DiagramConfig>;

/// Message shown in place of a diagram that failed to render.
pub const DIAGRAM_FAILURE_MESSAGE: &str = "Failed to render diagram.";

/// Observable state of a [`DiagramRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramState {
    /// No chart, or the engine is not ready.
    Idle,
    /// A render is in flight.
    Pending {
        /// The in-flight job.
        job: JobId,
    },
    /// The latest job produced SVG.
    Succeeded {
        /// The job that produced it.
        job: JobId,
        /// SVG markup.
        svg: String,
    },
    /// The latest job failed.
    Failed {
        /// The job that failed.
        job: JobId,
        /// User-facing message. The underlying cause is only logged.
        message: String,
    },
}

impl DiagramState {
    /// Returns true while a render is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, DiagramState::Pending { .. })
    }

    /// Returns the job this state belongs to, if any.
    #[must_use]
    pub fn job(&self) -> Option<&JobId> {
        match self {
            DiagramState::Idle => None,
            DiagramState::Pending { job }
            | DiagramState::Succeeded { job, .. }
            | DiagramState::Failed { job, .. } => Some(job),
        }
    }

    /// Returns the SVG of a successful render.
    #[must_use]
    pub fn svg(&self) -> Option<&str> {
        match self {
            DiagramState::Succeeded { svg, .. } => Some(svg),
            _ => None,
        }
    }

    /// Returns the markup displayed for this state.
    ///
    /// SVG from the engine is inserted as is.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        match self {
            DiagramState::Idle => {
                write_text_element(&mut out, "div", "diagram diagram-waiting", "Waiting for diagram engine...");
            }
            DiagramState::Pending { .. } => {
                write_text_element(&mut out, "div", "diagram diagram-loading", "Rendering diagram...");
            }
            DiagramState::Succeeded { svg, .. } => {
                out.push_str("<div class=\"diagram\">");
                out.push_str(svg);
                out.push_str("</div>");
            }
            DiagramState::Failed { message, .. } => {
                write_text_element(&mut out, "div", "diagram diagram-error", message);
            }
        }
        out
    }
}

struct Shared {
    active: Option<JobId>,
    torn_down: bool,
    state: watch::Sender<DiagramState>,
}

impl Shared {
    /// Applies a job outcome unless the job was superseded or the renderer torn down.
    fn settle(&mut self, job: &JobId, outcome: Result<RenderedDiagram, DiagramError>) {
        if self.torn_down || self.active.as_ref() != Some(job) {
            tracing::debug!(job = %job, "discarding superseded diagram result");
            return;
        }
        self.active = None;

        let next = match outcome {
            Ok(rendered) => {
                tracing::debug!(job = %job, bytes = rendered.svg.len(), "diagram rendered");
                DiagramState::Succeeded {
                    job: job.clone(),
                    svg: rendered.svg,
                }
            }
            Err(err) => {
                tracing::error!(job = %job, error = %err, "diagram rendering failed");
                DiagramState::Failed {
                    job: job.clone(),
                    message: DIAGRAM_FAILURE_MESSAGE.to_string(),
                }
            }
        };
        self.state.send_replace(next);
    }
}

/// Renders one diagram source asynchronously.
///
/// The renderer recomputes its output whenever its inputs (`chart`,
/// `engine_ready`) change. Every change starts a new job and supersedes the
/// one in flight, whose result is then discarded whenever it arrives. After
/// [`unmount`](Self::unmount) or drop no state changes anymore.
///
/// Must be used from within a Tokio runtime.
pub struct DiagramRenderer {
    slot: Arc<DiagramEngineSlot>,
    shared: Arc<Mutex<Shared>>,
    inputs: Option<(String, bool)>,
    tasks: Vec<JoinHandle<()>>,
}

impl fmt::Debug for DiagramRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramRenderer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl DiagramRenderer {
    /// Creates an idle renderer.
    #[must_use]
    pub fn new(slot: Arc<DiagramEngineSlot>) -> Self {
        let (state, _) = watch::channel(DiagramState::Idle);
        Self {
            slot,
            shared: Arc::new(Mutex::new(Shared {
                active: None,
                torn_down: false,
                state,
            })),
            inputs: None,
            tasks: Vec::new(),
        }
    }

    /// Updates the inputs and starts a render if they changed.
    ///
    /// Returns the id of the job that was started, if any. A blank chart, a
    /// not-ready engine or an empty engine slot put the renderer back to
    /// [`DiagramState::Idle`].
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::NoRuntime`] when a render has to start outside
    /// a Tokio runtime. The renderer is left idle.
    pub fn set_inputs(
        &mut self,
        chart: &str,
        engine_ready: bool,
    ) -> Result<Option<JobId>, DiagramError> {
        if self
            .inputs
            .as_ref()
            .is_some_and(|(current, ready)| current == chart && *ready == engine_ready)
        {
            return Ok(None);
        }
        self.inputs = Some((chart.to_string(), engine_ready));
        self.tasks.retain(|task| !task.is_finished());

        let mut shared = self.shared.lock();
        if shared.torn_down {
            return Ok(None);
        }

        let engine = match self.slot.engine() {
            Some(engine) if engine_ready && !chart.trim().is_empty() => engine,
            slot_engine => {
                shared.active = None;
                shared.state.send_replace(DiagramState::Idle);
                if slot_engine.is_none() {
                    // Retry the same inputs once the engine is installed.
                    self.inputs = None;
                }
                return Ok(None);
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            shared.active = None;
            shared.state.send_replace(DiagramState::Idle);
            self.inputs = None;
            return Err(DiagramError::NoRuntime);
        };

        let job = JobId::next();
        if let Some(superseded) = shared.active.replace(job.clone()) {
            tracing::debug!(job = %superseded, by = %job, "diagram job superseded");
        }
        shared.state.send_replace(DiagramState::Pending { job: job.clone() });
        drop(shared);

        let source = chart.to_string();
        let shared = self.shared.clone();
        let task_job = job.clone();
        self.tasks.push(runtime.spawn(async move {
            let outcome = engine.render(&task_job, &source).await;
            shared.lock().settle(&task_job, outcome);
        }));

        Ok(Some(job))
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> DiagramState {
        self.shared.lock().state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DiagramState> {
        self.shared.lock().state.subscribe()
    }

    /// Waits until no job is in flight and returns the resulting state.
    ///
    /// Resolves immediately when idle. A renderer that is unmounted while a
    /// job is pending resolves with that pending state.
    pub async fn wait_settled(&self) -> DiagramState {
        let mut receiver = {
            let shared = self.shared.lock();
            if shared.torn_down {
                return shared.state.borrow().clone();
            }
            shared.state.subscribe()
        };
        let settled = receiver
            .wait_for(|state| !state.is_pending())
            .await
            .map(|state| (*state).clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Returns the markup for the current state.
    #[must_use]
    pub fn html(&self) -> String {
        self.state().to_html()
    }

    /// Tears the renderer down.
    ///
    /// In-flight jobs are aborted and any result that still arrives is ignored.
    pub fn unmount(&mut self) {
        {
            let mut shared = self.shared.lock();
            if shared.torn_down {
                return;
            }
            shared.torn_down = true;
            shared.active = None;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for DiagramRenderer {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dev::MockDiagramEngine;
    use std::time::Duration;

    fn installed(engine: Arc<MockDiagramEngine>) -> Arc<DiagramEngineSlot> {
        let slot = Arc::new(DiagramEngineSlot::new("diagram"));
        slot.install(engine, DiagramConfig::default()).unwrap();
        slot
    }

    #[test]
    fn job_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..256).map(|_| JobId::next()).collect();
        assert_eq!(ids.len(), 256);
        assert!(ids.iter().all(|id| id.as_str().starts_with("diagram-")));
    }

    #[tokio::test]
    async fn not_ready_issues_no_render() {
        let engine = Arc::new(MockDiagramEngine::new());
        let mut renderer = DiagramRenderer::new(installed(engine.clone()));

        assert_eq!(renderer.set_inputs("graph TD; A-->B", false), Ok(None));
        tokio::task::yield_now().await;

        assert_eq!(renderer.state(), DiagramState::Idle);
        assert!(renderer.html().contains("diagram-waiting"));
        assert_eq!(engine.render_count(), 0);
    }

    #[tokio::test]
    async fn blank_chart_returns_to_idle() {
        let engine = Arc::new(MockDiagramEngine::new());
        let mut renderer = DiagramRenderer::new(installed(engine));

        renderer.set_inputs("graph TD; A-->B", true).unwrap();
        assert!(matches!(
            renderer.wait_settled().await,
            DiagramState::Succeeded { .. }
        ));

        renderer.set_inputs("   ", true).unwrap();
        assert_eq!(renderer.state(), DiagramState::Idle);
    }

    #[tokio::test]
    async fn same_inputs_do_not_start_another_job() {
        let engine = Arc::new(MockDiagramEngine::new());
        let mut renderer = DiagramRenderer::new(installed(engine.clone()));

        assert!(renderer.set_inputs("graph LR; X-->Y", true).unwrap().is_some());
        assert!(renderer.set_inputs("graph LR; X-->Y", true).unwrap().is_none());
        renderer.wait_settled().await;
        assert_eq!(engine.render_count(), 1);
    }

    #[tokio::test]
    async fn failure_shows_generic_message() {
        let engine = Arc::new(MockDiagramEngine::new().fail_on("broken"));
        let mut renderer = DiagramRenderer::new(installed(engine));

        renderer.set_inputs("graph TD; broken", true).unwrap();
        let state = renderer.wait_settled().await;

        assert!(matches!(
            &state,
            DiagramState::Failed { message, .. } if message == DIAGRAM_FAILURE_MESSAGE
        ));
        assert!(state.svg().is_none());
        assert!(state.to_html().contains("diagram-error"));
    }

    #[tokio::test]
    async fn unmount_freezes_state() {
        let engine = Arc::new(MockDiagramEngine::new().manual());
        let mut renderer = DiagramRenderer::new(installed(engine.clone()));

        let job = renderer.set_inputs("graph TD; A-->B", true).unwrap().unwrap();
        tokio::task::yield_now().await;
        renderer.unmount();
        engine.resolve(&job);
        tokio::task::yield_now().await;

        assert!(renderer.state().is_pending());
        assert_eq!(renderer.set_inputs("graph TD; C-->D", true), Ok(None));
    }

    #[tokio::test]
    async fn wait_settled_returns_after_unmount() {
        let engine = Arc::new(MockDiagramEngine::new().manual());
        let mut renderer = DiagramRenderer::new(installed(engine));

        renderer.set_inputs("graph TD; A-->B", true).unwrap();
        renderer.unmount();

        let state = tokio::time::timeout(Duration::from_secs(2), renderer.wait_settled())
            .await
            .expect("unmounted renderer settles immediately");
        assert!(state.is_pending());
    }

    #[tokio::test]
    async fn empty_slot_retries_same_inputs_after_install() {
        let engine = Arc::new(MockDiagramEngine::new());
        let slot = Arc::new(DiagramEngineSlot::new("diagram"));
        let mut renderer = DiagramRenderer::new(slot.clone());

        assert_eq!(renderer.set_inputs("graph TD; A-->B", true), Ok(None));
        assert_eq!(renderer.state(), DiagramState::Idle);

        slot.install(engine.clone(), DiagramConfig::default()).unwrap();
        assert!(renderer.set_inputs("graph TD; A-->B", true).unwrap().is_some());
        assert!(matches!(
            renderer.wait_settled().await,
            DiagramState::Succeeded { .. }
        ));
        assert_eq!(engine.render_count(), 1);
    }

    #[test]
    fn starting_outside_runtime_is_an_error() {
        let engine = Arc::new(MockDiagramEngine::new());
        let mut renderer = DiagramRenderer::new(installed(engine));
        assert_eq!(
            renderer.set_inputs("graph TD; A-->B", true),
            Err(DiagramError::NoRuntime)
        );
        assert_eq!(renderer.state(), DiagramState::Idle);
    }
}
