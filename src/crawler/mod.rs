//! Crawler module for hierarchical documentation capture
//!
//! This module contains the core crawling logic, including:
//! - Expansion of deferred navigation sections
//! - Active-descendant scraping for lazy folders
//! - Depth-first orchestration with per-sibling numbering and deduplication
//! - Post-crawl integrity verification with bounded retry

mod active;
mod context;
mod expand;
mod orchestrator;
mod verify;

pub use active::ActiveScopeScraper;
pub use context::CrawlSession;
pub use expand::ExpansionResolver;
pub use orchestrator::Crawler;
pub use verify::{ArtifactProblem, FailedArtifact, IntegrityVerifier, RetryPolicy};

use crate::browser::{BrowserSession, Navigation};
use crate::config::{Config, MarkupConfig, OutputConfig};
use crate::output::{write_debug_tree, CrawlReport, HierarchyLog};
use crate::render::PageRenderer;
use crate::tree::dom::select_first;
use crate::tree::{build_tree, build_tree_from_html, render_preview, Node};
use crate::{NavpressError, Result};
use scraper::Html;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Everything a finished crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// The navigation tree as walked, including expanded and adopted children
    pub tree: Vec<Node>,
    /// Expected artifact paths and the URLs they were rendered from
    pub expected: BTreeMap<PathBuf, String>,
    pub report: CrawlReport,
}

/// Runs a complete crawl operation
///
/// This is the main entry point for a crawl. It will:
/// 1. Prepare the output directory and the hierarchy log
/// 2. Open the start page and build the navigation tree
/// 3. Walk the tree, rendering every page once
/// 4. Verify the artifacts and retry failures
///
/// # Arguments
///
/// * `session` - The browser session to drive
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl finished; individual page failures are in the report
/// * `Err(NavpressError)` - The output directory or session could not be used at all
pub async fn run_crawl<S: BrowserSession>(session: &mut S, config: &Config) -> Result<CrawlOutcome> {
    let renderer = PageRenderer::from_config(config)?;
    prepare_output_dir(&config.output)?;

    let hierarchy = HierarchyLog::create(&config.output.hierarchy_log);
    let mut context = CrawlSession::new(hierarchy);

    let mut tree = discover_tree(session, config).await?;
    if let Err(e) = write_debug_tree(&config.output.debug_tree, &tree) {
        tracing::warn!("Could not write debug tree: {}", e);
    }
    context.report.nodes_detected = tree.iter().map(Node::subtree_len).sum();

    if tree.is_empty() {
        tracing::info!("Navigation tree is empty; nothing to print");
    } else {
        tracing::info!("Detected hierarchy:\n{}", render_preview(&tree));
    }

    let mut crawler = Crawler::new(session, config, renderer, context);
    crawler.walk(&mut tree, &config.output.directory, 0).await;
    crawler.verify().await;

    let (expected, mut report) = crawler.into_context().into_parts();
    report.finish();
    tracing::info!(
        "Crawl completed: {} pages rendered, {} duplicates skipped, {} unrecovered",
        report.pages_rendered,
        report.duplicates_skipped,
        report.unrecovered.len()
    );

    Ok(CrawlOutcome {
        tree,
        expected,
        report,
    })
}

/// Opens the start page and classifies its navigation
///
/// A navigation timeout or failure is logged and the tree is built from
/// whatever the page holds; an absent navigation root yields an empty tree.
pub async fn discover_tree<S: BrowserSession>(session: &mut S, config: &Config) -> Result<Vec<Node>> {
    open_start_page(session, config).await;
    let snapshot = session.snapshot().await?;
    Ok(build_tree(&snapshot, &config.markup))
}

/// Writes the navigation root's markup, with every section opened, to `path`
///
/// # Returns
///
/// * `Ok(usize)` - Bytes written
/// * `Err(NavpressError)` - No navigation root, or the file could not be written
pub async fn dump_sidebar<S: BrowserSession>(
    session: &mut S,
    config: &Config,
    path: &Path,
) -> Result<usize> {
    open_start_page(session, config).await;
    session.reveal_all_sections(&config.markup).await?;
    session.annotate_geometry(&config.markup).await?;
    let snapshot = session.snapshot().await?;

    let document = Html::parse_document(&snapshot.html);
    let root = select_first(&document, &config.markup.root).ok_or_else(|| {
        NavpressError::Output {
            path: path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("navigation root '{}' not found", config.markup.root),
            ),
        }
    })?;

    let html = root.html();
    std::fs::write(path, &html).map_err(|source| NavpressError::Output {
        path: path.display().to_string(),
        source,
    })?;
    Ok(html.len())
}

/// Classifies a saved navigation dump without a browser
///
/// Relative links resolve against `base`, normally the site's start URL.
pub fn analyze_sidebar(html: &str, base: &Url, markup: &MarkupConfig) -> Vec<Node> {
    build_tree_from_html(html, base, markup)
}

async fn open_start_page<S: BrowserSession>(session: &mut S, config: &Config) {
    let start = &config.site.start_url;
    let timeout = Duration::from_millis(config.browser.navigation_timeout_ms);

    tracing::info!("Opening start page {}", start);
    match session.navigate(start, timeout).await {
        Ok(Navigation::Loaded) => {}
        Ok(Navigation::TimedOut) => {
            tracing::warn!("Start page load timed out; continuing with the partial page");
        }
        Err(e) => tracing::warn!("Start page failed to load: {}; continuing anyway", e),
    }
}

/// Empties (when configured) and creates the output directory
fn prepare_output_dir(output: &OutputConfig) -> Result<()> {
    let dir = &output.directory;
    let to_output_error = |source: std::io::Error| NavpressError::Output {
        path: dir.display().to_string(),
        source,
    };

    if output.clean && dir.exists() {
        tracing::info!("Removing previous output in {}", dir.display());
        std::fs::remove_dir_all(dir).map_err(to_output_error)?;
    }
    std::fs::create_dir_all(dir).map_err(to_output_error)?;
    Ok(())
}
