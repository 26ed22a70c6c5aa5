use crate::browser::{BrowserSession, PageSnapshot, SessionError};
use crate::config::{BrowserConfig, MarkupConfig};
use crate::tree::dom::{closest, descendants, has_class, tag, text_of};
use crate::tree::{Classifier, Node};
use scraper::{ElementRef, Html};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Reveals deferred navigation sections and reads their links
///
/// Lazily loaded sections are one level deep, so the scoped pass only
/// collects anchors; it never rediscovers nested groups.
pub struct ExpansionResolver<'c> {
    markup: &'c MarkupConfig,
    timeout: Duration,
    poll_interval: Duration,
}

impl<'c> ExpansionResolver<'c> {
    pub fn new(markup: &'c MarkupConfig, browser: &BrowserConfig) -> Self {
        Self {
            markup,
            timeout: Duration::from_millis(browser.expansion_timeout_ms),
            poll_interval: Duration::from_millis(browser.poll_interval_ms),
        }
    }

    /// Expands the section titled `title` on the current page
    ///
    /// Never fails: any session error is logged and reported as no children.
    pub async fn expand<S: BrowserSession>(&self, session: &mut S, title: &str) -> Vec<Node> {
        match self.try_expand(session, title).await {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!("Expansion of '{}' failed: {}", title, e);
                Vec::new()
            }
        }
    }

    async fn try_expand<S: BrowserSession>(
        &self,
        session: &mut S,
        title: &str,
    ) -> Result<Vec<Node>, SessionError> {
        if !session.reveal_section(title, self.markup).await? {
            tracing::warn!("No section header titled '{}' on the current page", title);
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            let snapshot = session.snapshot().await?;
            let links = self.scrape(&snapshot, title);
            if !links.is_empty() {
                return Ok(links);
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Section '{}' showed no links within {:?}; continuing without children",
                    title,
                    self.timeout
                );
                return Ok(links);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Reads the links of the section titled `title` from a snapshot
    pub fn scrape(&self, snapshot: &PageSnapshot, title: &str) -> Vec<Node> {
        let Ok(base) = Url::parse(&snapshot.url) else {
            return Vec::new();
        };
        let document = Html::parse_document(&snapshot.html);
        let Some(region) = self.section_region(&document, title) else {
            return Vec::new();
        };

        let classifier = Classifier::flat(self.markup, &base);
        descendants(region)
            .filter(|el| tag(*el) == "a")
            .filter_map(|link| classifier.link_node(link))
            .collect()
    }

    fn section_region<'a>(&self, document: &'a Html, title: &str) -> Option<ElementRef<'a>> {
        let header = descendants(document.root_element())
            .find(|el| has_class(*el, &self.markup.title_class) && text_of(*el) == title)?;
        let section = closest(header, |el| has_class(el, &self.markup.section_class))?;

        descendants(section)
            .find(|el| has_class(*el, &self.markup.content_class))
            .or_else(|| descendants(section).find(|el| tag(*el) == "nav"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ScriptedSession;

    const START: &str = "https://docs.example.com/en/start.htm";

    const COLLAPSED: &str = r#"<html><body><aside class="js-accordion">
        <div class="accordion-section">
            <h4 class="accordion-title">Tools</h4>
            <nav class="accordion-content" style="display: none"></nav>
        </div>
    </aside></body></html>"#;

    const EXPANDED: &str = r#"<html><body><aside class="js-accordion">
        <div class="accordion-section is-active">
            <h4 class="accordion-title">Tools</h4>
            <nav class="accordion-content">
                <a href="/tools/buffer.htm">Buffer</a>
                <a href="/tools/clip.htm" data-collapsed="true">Clip</a>
                <a href="javascript:void(0)">Ignored</a>
            </nav>
        </div>
    </aside></body></html>"#;

    fn browser_config() -> BrowserConfig {
        BrowserConfig {
            expansion_timeout_ms: 40,
            poll_interval_ms: 10,
            ..BrowserConfig::default()
        }
    }

    async fn session_at(session: ScriptedSession) -> ScriptedSession {
        let mut session = session;
        session
            .navigate(START, Duration::from_secs(1))
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_expand_reads_revealed_links() {
        let markup = MarkupConfig::default();
        let resolver = ExpansionResolver::new(&markup, &browser_config());
        let mut session = session_at(
            ScriptedSession::new()
                .with_page(START, COLLAPSED)
                .with_revealed_section(START, "Tools", EXPANDED),
        )
        .await;

        let children = resolver.expand(&mut session, "Tools").await;

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].title, "Buffer");
        assert_eq!(
            children[0].url.as_deref(),
            Some("https://docs.example.com/tools/buffer.htm")
        );
        assert!(children[1].is_collapsed);
    }

    #[tokio::test]
    async fn test_expand_times_out_to_empty() {
        let markup = MarkupConfig::default();
        let resolver = ExpansionResolver::new(&markup, &browser_config());
        let mut session = session_at(
            ScriptedSession::new()
                .with_page(START, COLLAPSED)
                .with_revealed_section(START, "Tools", COLLAPSED),
        )
        .await;

        assert!(resolver.expand(&mut session, "Tools").await.is_empty());
    }

    #[tokio::test]
    async fn test_expand_unknown_header() {
        let markup = MarkupConfig::default();
        let resolver = ExpansionResolver::new(&markup, &browser_config());
        let mut session = session_at(ScriptedSession::new().with_page(START, COLLAPSED)).await;

        assert!(resolver.expand(&mut session, "Missing").await.is_empty());
    }

    #[test]
    fn test_scrape_falls_back_to_nav() {
        let markup = MarkupConfig::default();
        let resolver = ExpansionResolver::new(&markup, &browser_config());
        let snapshot = PageSnapshot {
            url: START.to_string(),
            html: r#"<div class="accordion-section">
                <h4 class="accordion-title"> Data
                    Management </h4>
                <nav><a href="data.htm">Data</a></nav>
            </div>"#
                .to_string(),
        };

        let links = resolver.scrape(&snapshot, "Data Management");
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].url.as_deref(),
            Some("https://docs.example.com/en/data.htm")
        );
    }
}
