//! The bundled pages render end to end in the in-memory environment.

use axiom_content::{PageComposer, SiteConfig, SitePlugins, TechniquePage};
use axiom_core::TracingPlugin;
use axiom_render::DiagramState;
use axiom_resource::Document;
use axiom_system::plugin::PluginGroup;
use axiom_system::site::Site;
use proofsite::{FlowchartEngine, PlainMathEngine, slug};
use std::collections::HashSet;
use std::sync::Arc;

const PAGES: &str = include_str!("../pages/techniques.json");

#[tokio::test]
async fn every_bundled_page_renders() {
    let pages = TechniquePage::list_from_json_str(PAGES).unwrap();
    assert_eq!(pages.len(), 5);

    let mut site = Site::new();
    site.add_plugins(
        SitePlugins::new(
            SiteConfig::default(),
            Arc::new(Document::new()),
            Arc::new(PlainMathEngine),
            Arc::new(FlowchartEngine::new()),
        )
        .build()
        .disable::<TracingPlugin>(),
    );
    site.finish();

    let composer = PageComposer::from_site(&site).unwrap();
    composer.gate().wait_ready().await.unwrap();

    let mut slugs = HashSet::new();
    for page in &pages {
        let composed = composer.compose(page).unwrap();
        let rendered = composed.rendered().unwrap();
        assert!(matches!(
            rendered.settle().await,
            Some(DiagramState::Succeeded { .. })
        ));

        let html = composed.to_html();
        assert!(html.contains("math-display"), "{}", page.title);
        assert!(!html.contains("math-parse-error"), "{}", page.title);
        assert!(slugs.insert(slug(&page.title)));
    }
}
