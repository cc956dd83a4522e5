//! Composition of technique pages from the rendering adapters.

use crate::error::ComposeError;
use crate::page::TechniquePage;
use axiom_render::{
    DiagramEngineSlot, DiagramRenderer, DiagramState, MathEngineSlot, MathRenderer,
    RenderRequest, escape_html,
};
use axiom_resource::ReadinessGate;
use axiom_system::site::Site;
use core::fmt::Write as _;
use std::sync::Arc;

/// Builds page views once the engines are ready.
#[derive(Debug, Clone)]
pub struct PageComposer {
    gate: Arc<ReadinessGate>,
    math: Arc<MathEngineSlot>,
    diagram: Arc<DiagramEngineSlot>,
}

impl PageComposer {
    /// Creates a composer from its parts.
    #[must_use]
    pub fn new(
        gate: Arc<ReadinessGate>,
        math: Arc<MathEngineSlot>,
        diagram: Arc<DiagramEngineSlot>,
    ) -> Self {
        Self {
            gate,
            math,
            diagram,
        }
    }

    /// Creates a composer from a finished site.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingGlobal`] if the site lacks the readiness
    /// gate or one of the engine slots.
    pub fn from_site(site: &Site) -> Result<Self, ComposeError> {
        Ok(Self::new(
            site.get_global::<ReadinessGate>()
                .ok_or(ComposeError::MissingGlobal("ReadinessGate"))?,
            site.get_global::<MathEngineSlot>()
                .ok_or(ComposeError::MissingGlobal("MathEngineSlot"))?,
            site.get_global::<DiagramEngineSlot>()
                .ok_or(ComposeError::MissingGlobal("DiagramEngineSlot"))?,
        ))
    }

    /// Returns the gate the composer consults.
    #[must_use]
    pub fn gate(&self) -> &Arc<ReadinessGate> {
        &self.gate
    }

    /// Composes `page`.
    ///
    /// While the gate is loading no adapter is constructed and
    /// [`ComposedPage::Loading`] is returned. Once ready, every worked example
    /// gets a display-mode [`MathRenderer`] and the diagram source, if any, a
    /// [`DiagramRenderer`] whose render has been started.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Diagram`] if the diagram render cannot start.
    pub fn compose(&self, page: &TechniquePage) -> Result<ComposedPage, ComposeError> {
        let Some(rendered) = self.gate.mount(|| self.mount(page)) else {
            tracing::debug!(
                page = %page.title,
                pending = ?self.gate.pending(),
                "engines not ready; page stays loading"
            );
            return Ok(ComposedPage::Loading {
                title: page.title.clone(),
                pending: self.gate.pending().into_iter().map(str::to_string).collect(),
            });
        };
        rendered.map(ComposedPage::Ready)
    }

    fn mount(&self, page: &TechniquePage) -> Result<RenderedPage, ComposeError> {
        let examples = page
            .examples
            .iter()
            .map(|example| {
                let mut renderer = MathRenderer::new(self.math.clone());
                renderer.render(RenderRequest::display(example.proof.as_str()));
                renderer
            })
            .collect();

        let diagram = match page.diagram_source() {
            Some(source) => {
                let mut renderer = DiagramRenderer::new(self.diagram.clone());
                renderer.set_inputs(source, self.gate.is_ready())?;
                Some(renderer)
            }
            None => None,
        };

        tracing::debug!(page = %page.title, examples = page.examples.len(), "page mounted");
        Ok(RenderedPage {
            page: page.clone(),
            examples,
            diagram,
        })
    }
}

/// A page whose adapters are mounted.
#[derive(Debug)]
pub struct RenderedPage {
    page: TechniquePage,
    examples: Vec<MathRenderer>,
    diagram: Option<DiagramRenderer>,
}

impl RenderedPage {
    /// Returns the page content.
    #[must_use]
    pub fn page(&self) -> &TechniquePage {
        &self.page
    }

    /// Returns one math renderer per worked example, in order.
    #[must_use]
    pub fn examples(&self) -> &[MathRenderer] {
        &self.examples
    }

    /// Returns the diagram renderer, if the page has a diagram.
    #[must_use]
    pub fn diagram(&self) -> Option<&DiagramRenderer> {
        self.diagram.as_ref()
    }

    /// Waits until the diagram, if any, has settled.
    pub async fn settle(&self) -> Option<DiagramState> {
        match &self.diagram {
            Some(diagram) => Some(diagram.wait_settled().await),
            None => None,
        }
    }

    /// Renders the page markup.
    ///
    /// Static text is escaped; engine output is inserted as is.
    #[must_use]
    pub fn to_html(&self) -> String {
        let page = &self.page;
        let mut out = String::new();
        let _ = write!(
            out,
            "<article class=\"technique\"><h1>{}</h1><p class=\"description\">{}</p>",
            escape_html(&page.title),
            escape_html(&page.description)
        );

        if !page.steps.is_empty() {
            out.push_str("<section class=\"steps\"><h2>Steps</h2><ol>");
            for step in &page.steps {
                let _ = write!(out, "<li>{}</li>", escape_html(step));
            }
            out.push_str("</ol></section>");
        }

        if !page.examples.is_empty() {
            out.push_str("<section class=\"examples\"><h2>Examples</h2>");
            for (example, renderer) in page.examples.iter().zip(&self.examples) {
                let _ = write!(
                    out,
                    "<div class=\"example\"><h3>{}</h3><p>{}</p><div class=\"proof\">{}</div></div>",
                    escape_html(&example.title),
                    escape_html(&example.description),
                    renderer.html()
                );
            }
            out.push_str("</section>");
        }

        if let Some(diagram) = &self.diagram {
            out.push_str("<section class=\"flow\"><h2>Flow</h2>");
            out.push_str(&diagram.html());
            out.push_str("</section>");
        }

        if let Some(image) = &page.image {
            let _ = write!(
                out,
                "<figure><img src=\"{}\" alt=\"{}\"></figure>",
                escape_html(&image.src),
                escape_html(&image.alt)
            );
        }

        out.push_str("</article>");
        out
    }
}

/// Result of [`PageComposer::compose`].
#[derive(Debug)]
pub enum ComposedPage {
    /// Engines are still loading. Nothing was constructed.
    Loading {
        /// Page heading, shown above the loading indicator.
        title: String,
        /// Resources that have not loaded yet.
        pending: Vec<String>,
    },
    /// Adapters are mounted.
    Ready(RenderedPage),
}

impl ComposedPage {
    /// Returns true while loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, ComposedPage::Loading { .. })
    }

    /// Returns the rendered page once ready.
    #[must_use]
    pub fn rendered(&self) -> Option<&RenderedPage> {
        match self {
            ComposedPage::Ready(rendered) => Some(rendered),
            ComposedPage::Loading { .. } => None,
        }
    }

    /// Renders the page markup, or a loading indicator.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            ComposedPage::Loading { title, .. } => format!(
                "<article class=\"technique\"><h1>{}</h1><div class=\"loading\">Loading rendering engines...</div></article>",
                escape_html(title)
            ),
            ComposedPage::Ready(rendered) => rendered.to_html(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageImage, WorkedExample};
    use axiom_render::dev::{MockDiagramEngine, MockMathEngine};
    use axiom_render::{DiagramConfig, MathConfig};
    use axiom_resource::{LoadStatus, ReadinessSignal};

    fn page() -> TechniquePage {
        TechniquePage {
            title: "Proof by <Contradiction>".into(),
            description: "Assume the negation & derive absurdity.".into(),
            steps: vec!["Assume not P".into(), "Derive a contradiction".into()],
            examples: vec![WorkedExample {
                title: "Irrationality".into(),
                description: "The square root of two.".into(),
                proof: "\\sqrt{2} = \\frac{p}{q}".into(),
            }],
            diagram: Some("graph TD; NotP-->Absurd".into()),
            image: Some(PageImage {
                src: "/img/contradiction.png".into(),
                alt: "A \"contradiction\"".into(),
            }),
        }
    }

    fn slots() -> (Arc<MathEngineSlot>, Arc<DiagramEngineSlot>) {
        let math = Arc::new(MathEngineSlot::new("math"));
        math.install(Arc::new(MockMathEngine::new()), MathConfig::default())
            .unwrap();
        let diagram = Arc::new(DiagramEngineSlot::new("diagram"));
        diagram
            .install(Arc::new(MockDiagramEngine::new()), DiagramConfig::default())
            .unwrap();
        (math, diagram)
    }

    #[tokio::test]
    async fn loading_gate_constructs_nothing() {
        let (_tx, rx) = tokio::sync::watch::channel(LoadStatus::Pending);
        let gate = Arc::new(ReadinessGate::new(vec![ReadinessSignal::from_receiver(
            "katex", rx,
        )]));
        let (math, diagram) = slots();
        let composer = PageComposer::new(gate, math, diagram);

        let composed = composer.compose(&page()).unwrap();
        assert!(composed.is_loading());
        assert!(composed.to_html().contains("Loading rendering engines"));
        assert!(composed.to_html().contains("&lt;Contradiction&gt;"));
    }

    #[tokio::test]
    async fn ready_gate_mounts_adapters() {
        let gate = Arc::new(ReadinessGate::new(Vec::new()));
        let (math, diagram) = slots();
        let composer = PageComposer::new(gate, math, diagram);

        let composed = composer.compose(&page()).unwrap();
        let rendered = composed.rendered().unwrap();
        assert_eq!(rendered.examples().len(), 1);
        assert!(rendered.examples()[0].request().unwrap().display_mode);

        assert!(matches!(
            rendered.settle().await,
            Some(DiagramState::Succeeded { .. })
        ));

        let html = composed.to_html();
        assert!(html.contains("<li>Assume not P</li>"));
        assert!(html.contains("katex-display"));
        assert!(html.contains("<svg"));
        assert!(html.contains("alt=\"A &quot;contradiction&quot;\""));
        assert!(html.contains("negation &amp; derive"));
    }

    #[tokio::test]
    async fn page_without_diagram_has_no_renderer() {
        let gate = Arc::new(ReadinessGate::new(Vec::new()));
        let (math, diagram) = slots();
        let composer = PageComposer::new(gate, math, diagram);

        let mut page = page();
        page.diagram = None;
        let composed = composer.compose(&page).unwrap();

        let rendered = composed.rendered().unwrap();
        assert!(rendered.diagram().is_none());
        assert!(rendered.settle().await.is_none());
        assert!(!composed.to_html().contains("class=\"flow\""));
    }
}
