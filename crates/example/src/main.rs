//! Proof technique site generator.
//!
//! Loads the engine bundles, waits for the readiness gate, then writes one
//! HTML file per technique page.
//!
//! # Usage
//!
//! ```bash
//! proofsite <pages.json> <out_dir>
//! ```
//!
//! `AXIOM_CONFIG` names a site configuration file. With `AXIOM_OFFLINE=1`
//! the bundles are not fetched and the in-memory environment is used.

use axiom_content::{PageComposer, SiteConfig, SitePlugins, TechniquePage};
use axiom_resource::{Document, ResourceEnvironment};
use axiom_system::plugin::PluginGroup;
use axiom_system::site::Site;
use proofsite::{CONFIG_VAR, FlowchartEngine, OFFLINE_VAR, PlainMathEngine, SiteError, slug};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: <pages.json> <out_dir>");
        eprintln!("Example: pages/techniques.json ./site");
        std::process::exit(1);
    }

    let pages = PathBuf::from(&args[1]);
    let out_dir = PathBuf::from(&args[2]);

    if let Err(e) = run(&pages, &out_dir).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn environment() -> Arc<dyn ResourceEnvironment> {
    let offline = std::env::var(OFFLINE_VAR).is_ok_and(|value| value == "1");
    if offline {
        return Arc::new(Document::new());
    }
    network_environment()
}

#[cfg(feature = "http")]
fn network_environment() -> Arc<dyn ResourceEnvironment> {
    Arc::new(axiom_resource::HttpEnvironment::new())
}

#[cfg(not(feature = "http"))]
fn network_environment() -> Arc<dyn ResourceEnvironment> {
    tracing::warn!("built without the http feature; engine bundles are not fetched");
    Arc::new(Document::new())
}

async fn run(pages: &Path, out_dir: &Path) -> Result<(), SiteError> {
    let config = match std::env::var(CONFIG_VAR) {
        Ok(path) => SiteConfig::from_path(path)?,
        Err(_) => SiteConfig::default(),
    };
    let pages = TechniquePage::list_from_path(pages)?;

    let mut site = Site::new();
    site.add_plugins(
        SitePlugins::new(
            config,
            environment(),
            Arc::new(PlainMathEngine),
            Arc::new(FlowchartEngine::new()),
        )
        .build(),
    );
    site.finish();

    let composer = PageComposer::from_site(&site)?;
    let gate = composer.gate().clone();
    for signal in gate.signals() {
        if let Err(err) = signal.wait_settled().await {
            return Err(SiteError::EngineUnavailable(err.to_string()));
        }
    }
    gate.wait_ready().await?;

    std::fs::create_dir_all(out_dir).map_err(|source| SiteError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;

    for page in &pages {
        let composed = composer.compose(page)?;
        if let Some(rendered) = composed.rendered() {
            rendered.settle().await;
        }

        let path = out_dir.join(format!("{}.html", slug(&page.title)));
        std::fs::write(&path, composed.to_html()).map_err(|source| SiteError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(page = %page.title, path = %path.display(), "page written");
    }

    site.cleanup();
    Ok(())
}
