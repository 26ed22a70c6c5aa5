//! Depth-first crawl orchestration
//!
//! The walk visits the navigation tree in document order. Groups and lazy
//! folders become numbered directories; links become numbered artifacts.
//! Each sibling list numbers from 1, and a link whose canonical URL was
//! already rendered is skipped without consuming a number, so ordinals stay
//! contiguous and a lexicographic sort of the output equals crawl order.
//! A lazy folder is opened at most once per canonical URL; navigation that
//! keeps pointing back at folders already opened cannot recurse.

use crate::browser::{BrowserSession, Navigation};
use crate::config::Config;
use crate::crawler::active::ActiveScopeScraper;
use crate::crawler::context::CrawlSession;
use crate::crawler::expand::ExpansionResolver;
use crate::crawler::verify::{IntegrityVerifier, RetryPolicy};
use crate::output::{
    artifact_dir_name, artifact_file_name, introduction_file_name, ordinal_width,
    title_from_artifact, Unrecovered,
};
use crate::render::PageRenderer;
use crate::tree::Node;
use crate::url::canonical_url;
use std::path::Path;
use std::time::Duration;

/// Walks a navigation tree, rendering every page once
pub struct Crawler<'a, S> {
    session: &'a mut S,
    config: &'a Config,
    renderer: PageRenderer,
    expander: ExpansionResolver<'a>,
    scraper: ActiveScopeScraper<'a>,
    context: CrawlSession,
}

impl<'a, S: BrowserSession> Crawler<'a, S> {
    pub fn new(
        session: &'a mut S,
        config: &'a Config,
        renderer: PageRenderer,
        context: CrawlSession,
    ) -> Self {
        Self {
            session,
            config,
            renderer,
            expander: ExpansionResolver::new(&config.markup, &config.browser),
            scraper: ActiveScopeScraper::new(&config.markup, &config.crawl),
            context,
        }
    }

    pub fn into_context(self) -> CrawlSession {
        self.context
    }

    /// Walks `nodes` into `dir`
    ///
    /// Nodes are mutated in place: expansion and active-descendant scraping
    /// attach the children they discover, so the tree afterwards reflects
    /// everything that was walked.
    pub async fn walk(&mut self, nodes: &mut [Node], dir: &Path, depth: usize) {
        let width = ordinal_width(nodes.len());
        let mut ordinal = 0;
        let mut first_group_seen = false;

        for node in nodes.iter_mut() {
            if node.is_lazy_folder() && self.folder_opened(node) {
                tracing::debug!("Skipping lazy folder '{}' opened earlier", node.title);
                self.context.report.duplicates_skipped += 1;
                continue;
            }

            if node.is_group() || node.is_lazy_folder() {
                ordinal += 1;
                let name = artifact_dir_name(ordinal, width, &node.title);
                let child_dir = dir.join(&name);

                if let Err(e) = tokio::fs::create_dir_all(&child_dir).await {
                    tracing::error!("Failed to create directory {}: {}", child_dir.display(), e);
                }
                tracing::info!("Entering {}", child_dir.display());
                self.context.report.directories_created += 1;
                self.context.hierarchy().directory(depth, &name);

                if node.awaiting_expansion() {
                    self.expand(node).await;
                }

                if depth == 0 && node.is_group() && !first_group_seen {
                    first_group_seen = true;
                    if self.config.crawl.start_page_intro {
                        let intro = introduction_file_name(ordinal_width(node.children.len()));
                        self.start_page_intro(&node.title, &child_dir, &intro, depth + 1)
                            .await;
                    }
                }

                if node.is_lazy_folder() {
                    self.open_lazy_folder(node, &child_dir, depth + 1).await;
                }

                if !node.children.is_empty() {
                    Box::pin(self.walk(&mut node.children, &child_dir, depth + 1)).await;
                }
            } else {
                let Some(url) = node.url.clone() else {
                    continue;
                };
                if !self.context.mark_visited(canonical_url(&url)) {
                    tracing::debug!("Skipping duplicate '{}' ({})", node.title, url);
                    self.context.report.duplicates_skipped += 1;
                    continue;
                }

                ordinal += 1;
                let name = artifact_file_name(ordinal, width, &node.title);
                self.context.hierarchy().artifact(depth, &name);
                self.render(&url, &dir.join(&name), &node.title).await;
            }
        }
    }

    async fn expand(&mut self, node: &mut Node) {
        tracing::info!("Expanding deferred group '{}'", node.title);
        let children = self.expander.expand(&mut *self.session, &node.title).await;

        if children.is_empty() {
            tracing::warn!("No children found after expanding '{}'", node.title);
            return;
        }

        tracing::info!("Found {} children in '{}'", children.len(), node.title);
        self.context.report.groups_expanded += 1;
        self.context.report.expansion_children += children.len();
        node.adopt_children(children);
    }

    fn folder_opened(&self, node: &Node) -> bool {
        node.url
            .as_deref()
            .is_some_and(|url| self.context.is_folder_opened(&canonical_url(url)))
    }

    /// Renders the start page as the first root group's introduction
    async fn start_page_intro(&mut self, title: &str, dir: &Path, name: &str, depth: usize) {
        let start = self.config.site.start_url.clone();
        if !self.context.mark_visited(canonical_url(&start)) {
            return;
        }

        self.context.hierarchy().artifact(depth, name);
        self.render(&start, &dir.join(name), title).await;
    }

    /// Adopts a lazy folder's active descendants and renders its landing page
    ///
    /// Children pointing back at the folder itself are dropped. The landing
    /// page is only rendered when no other entry rendered it first.
    async fn open_lazy_folder(&mut self, node: &mut Node, dir: &Path, depth: usize) {
        let Some(url) = node.url.clone() else {
            return;
        };
        let canonical = canonical_url(&url);
        self.context.mark_folder_opened(canonical.clone());
        let render_intro = self.context.mark_visited(canonical.clone());

        let children: Vec<Node> = self
            .active_children(&url)
            .await
            .into_iter()
            .filter(|child| {
                child
                    .url
                    .as_deref()
                    .map_or(true, |child_url| canonical_url(child_url) != canonical)
            })
            .collect();
        if !children.is_empty() {
            tracing::info!("Found {} children under '{}'", children.len(), node.title);
            self.context.report.active_children += children.len();
            node.children.extend(children);
        }

        if render_intro {
            let intro = introduction_file_name(ordinal_width(node.children.len()));
            self.context.hierarchy().artifact(depth, &intro);
            self.render(&url, &dir.join(&intro), &node.title).await;
        } else {
            tracing::debug!("Landing page of '{}' already rendered", node.title);
        }
    }

    /// Reads the active scope of `url`, navigating there unless already open
    async fn active_children(&mut self, url: &str) -> Vec<Node> {
        let wanted = canonical_url(url);
        let on_page = match self.session.snapshot().await {
            Ok(snapshot) => canonical_url(&snapshot.url) == wanted,
            Err(_) => false,
        };

        if !on_page {
            let timeout = Duration::from_millis(self.config.browser.navigation_timeout_ms);
            match self.session.navigate(url, timeout).await {
                Ok(Navigation::Loaded) => {}
                Ok(Navigation::TimedOut) => {
                    tracing::warn!("Navigation to {} timed out; reading the partial page", url);
                }
                Err(e) => {
                    tracing::warn!("Cannot open {} to look for children: {}", url, e);
                    return Vec::new();
                }
            }
        }

        if let Err(e) = self.session.annotate_geometry(&self.config.markup).await {
            tracing::warn!("Geometry annotation failed on {}: {}", url, e);
        }
        match self.session.snapshot().await {
            Ok(snapshot) => self.scraper.scrape(&snapshot),
            Err(e) => {
                tracing::warn!("Cannot read {} to look for children: {}", url, e);
                Vec::new()
            }
        }
    }

    /// Records the artifact as expected, then renders it
    ///
    /// A failure is logged and counted; the expectation stays so the
    /// verifier retries it.
    async fn render(&mut self, url: &str, path: &Path, title: &str) {
        self.context.expect(path.to_path_buf(), url);
        tracing::info!("Printing '{}' -> {}", title, path.display());

        match self.renderer.render(&mut *self.session, url, path, title).await {
            Ok(_) => self.context.report.pages_rendered += 1,
            Err(e) => {
                tracing::error!("Failed to render {} to {}: {}", url, path.display(), e);
                self.context.report.render_failures += 1;
            }
        }
    }

    /// Verifies every expected artifact and retries the failures
    pub async fn verify(&mut self) {
        let verifier = IntegrityVerifier::from_config(&self.config.verify);
        let policy = RetryPolicy::from_config(&self.config.verify);

        tracing::info!(
            "Starting integrity check of {} artifacts",
            self.context.expected().len()
        );
        let failures = verifier.verify(self.context.expected());
        self.context.report.verification_failures = failures.len();

        if failures.is_empty() {
            tracing::info!("Integrity check passed: all files present");
            return;
        }
        tracing::warn!(
            "Found {} missing or corrupted artifacts; retrying",
            failures.len()
        );

        for failure in failures {
            let title = title_from_artifact(&failure.path);
            let mut reason = failure.problem.to_string();
            let mut recovered = false;

            for attempt in 1..=policy.attempts() {
                let delay = policy.delay_before(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                tracing::warn!(
                    "Retrying {} ({}, attempt {}/{})",
                    failure.path.display(),
                    reason,
                    attempt,
                    policy.attempts()
                );

                match self
                    .renderer
                    .render(&mut *self.session, &failure.url, &failure.path, &title)
                    .await
                {
                    Ok(_) => match verifier.check(&failure.path) {
                        None => {
                            recovered = true;
                            break;
                        }
                        Some(problem) => reason = problem.to_string(),
                    },
                    Err(e) => reason = e.to_string(),
                }
            }

            if recovered {
                tracing::info!("Recovered {}", failure.path.display());
                self.context.report.recovered += 1;
            } else {
                tracing::error!(
                    "Giving up on {} from {}: {}",
                    failure.path.display(),
                    failure.url,
                    reason
                );
                self.context.report.unrecovered.push(Unrecovered {
                    path: failure.path,
                    url: failure.url,
                    reason,
                });
            }
        }
    }
}
