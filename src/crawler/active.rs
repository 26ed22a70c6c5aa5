use crate::browser::{PageSnapshot, HIDDEN_ATTRIBUTE, LEFT_OFFSET_ATTRIBUTE};
use crate::config::{ActiveScopeStrategy, CrawlConfig, MarkupConfig};
use crate::tree::dom::{closest, descendants, has_class, select_first, tag};
use crate::tree::{Classifier, Node};
use scraper::{ElementRef, Html};
use url::Url;

/// Recovers the children of a lazy folder from its own page
///
/// Once a lazy folder's landing page is open, the navigation marks the
/// entry as active and shows what lives beneath it. The scraper locates
/// that active entry and reads the links in scope around it. The snapshot
/// must carry geometry annotations for the indentation heuristic to apply.
pub struct ActiveScopeScraper<'c> {
    markup: &'c MarkupConfig,
    strategy: ActiveScopeStrategy,
    tolerance: f64,
}

impl<'c> ActiveScopeScraper<'c> {
    pub fn new(markup: &'c MarkupConfig, crawl: &CrawlConfig) -> Self {
        Self {
            markup,
            strategy: crawl.active_scope,
            tolerance: crawl.indent_tolerance_px,
        }
    }

    pub fn scrape(&self, snapshot: &PageSnapshot) -> Vec<Node> {
        let Ok(base) = Url::parse(&snapshot.url) else {
            tracing::warn!("Cannot scrape active scope of '{}'", snapshot.url);
            return Vec::new();
        };
        let document = Html::parse_document(&snapshot.html);
        let Some(root) = select_first(&document, &self.markup.root) else {
            tracing::debug!("No navigation root on {}", snapshot.url);
            return Vec::new();
        };

        match self.strategy {
            ActiveScopeStrategy::EnclosingSection => self.enclosing_section(root, &base),
            ActiveScopeStrategy::Indentation => self.indentation(root, &base),
        }
    }

    /// Whole enclosing section, then indented siblings, then the next sibling container, then the parent
    fn enclosing_section(&self, root: ElementRef<'_>, base: &Url) -> Vec<Node> {
        let Some(active) = self.active_element(root) else {
            tracing::debug!("No active navigation entry");
            return Vec::new();
        };
        let classifier = Classifier::flat(self.markup, base);

        let scope = closest(active, |el| has_class(el, &self.markup.content_class))
            .or_else(|| closest(active, |el| has_class(el, &self.markup.section_class)));
        if let Some(scope) = scope {
            let nodes = classifier.classify(scope);
            if !nodes.is_empty() {
                return nodes;
            }
        }

        if tag(active) == "a" {
            let nodes = self.indented_after(root, active, &classifier);
            if !nodes.is_empty() {
                return nodes;
            }
            let nodes = self.sibling_container(active, &classifier);
            if !nodes.is_empty() {
                return nodes;
            }
        }

        active
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| classifier.classify(parent))
            .unwrap_or_default()
    }

    /// Promoted section header, then indented siblings, then the next sibling container
    fn indentation(&self, root: ElementRef<'_>, base: &Url) -> Vec<Node> {
        let classifier = Classifier::flat(self.markup, base);

        if let Some(content) = self
            .promoted_header(root)
            .and_then(|header| closest(header, |el| has_class(el, &self.markup.section_class)))
            .and_then(|section| {
                descendants(section).find(|el| has_class(*el, &self.markup.content_class))
            })
        {
            return self.anchors(content, &classifier);
        }

        let Some(active) = self.active_link(root) else {
            tracing::debug!("No active navigation link");
            return Vec::new();
        };

        let nodes = self.indented_after(root, active, &classifier);
        if !nodes.is_empty() {
            return nodes;
        }
        self.sibling_container(active, &classifier)
    }

    /// The deepest active link: the last active anchor in document order
    fn active_link<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(root)
            .filter(|el| tag(*el) == "a" && has_class(*el, &self.markup.active_class))
            .last()
    }

    fn active_element<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.active_link(root)
            .or_else(|| descendants(root).find(|el| has_class(*el, &self.markup.active_class)))
    }

    /// A section title that is itself active, or the title of an active section
    fn promoted_header<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(root).find(|el| {
            has_class(*el, &self.markup.title_class)
                && (has_class(*el, &self.markup.active_class)
                    || el.parent().and_then(ElementRef::wrap).is_some_and(|parent| {
                        has_class(parent, &self.markup.section_class)
                            && has_class(parent, &self.markup.active_class)
                    }))
        })
    }

    /// Links after `active` that sit further right than it, within its section
    ///
    /// Hidden links are skipped. The scan stops at the first visible link at
    /// the same or a shallower indentation, at a section boundary, or at a
    /// link without geometry.
    fn indented_after<'a>(
        &self,
        root: ElementRef<'a>,
        active: ElementRef<'a>,
        classifier: &Classifier<'_>,
    ) -> Vec<Node> {
        let Some(active_left) = left_offset(active) else {
            return Vec::new();
        };
        let section_of = |el: ElementRef<'a>| {
            closest(el, |e| has_class(e, &self.markup.section_class)).map(|s| s.id())
        };
        let active_section = section_of(active);

        let mut nodes = Vec::new();
        let following = descendants(root)
            .filter(|el| tag(*el) == "a")
            .skip_while(|el| el.id() != active.id())
            .skip(1);

        for link in following {
            if link.value().attr(HIDDEN_ATTRIBUTE).is_some() {
                continue;
            }
            if section_of(link) != active_section {
                break;
            }
            match left_offset(link) {
                Some(left) if left > active_left + self.tolerance => {
                    nodes.extend(classifier.link_node(link));
                }
                _ => break,
            }
        }
        nodes
    }

    /// Links inside the container immediately following `active`
    fn sibling_container(&self, active: ElementRef<'_>, classifier: &Classifier<'_>) -> Vec<Node> {
        match active.next_siblings().find_map(ElementRef::wrap) {
            Some(sibling) if matches!(tag(sibling), "nav" | "ul" | "div") => {
                self.anchors(sibling, classifier)
            }
            _ => Vec::new(),
        }
    }

    fn anchors(&self, scope: ElementRef<'_>, classifier: &Classifier<'_>) -> Vec<Node> {
        descendants(scope)
            .filter(|el| tag(*el) == "a")
            .filter_map(|link| classifier.link_node(link))
            .collect()
    }
}

fn left_offset(el: ElementRef<'_>) -> Option<f64> {
    el.value()
        .attr(LEFT_OFFSET_ATTRIBUTE)
        .and_then(|value| value.trim().parse().ok())
}
