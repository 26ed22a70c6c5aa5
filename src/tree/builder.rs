use crate::browser::PageSnapshot;
use crate::config::MarkupConfig;
use crate::tree::dom::select_first;
use crate::tree::{Classifier, Node};
use scraper::Html;
use url::Url;

/// Builds the initial navigation tree from a page snapshot
///
/// A missing navigation root is not an error: the tree is simply empty and
/// the crawl that follows is a no-op.
///
/// # Arguments
///
/// * `snapshot` - The rendered page, as captured from the browser session
/// * `markup` - Navigation vocabulary (root selector, section classes, ...)
///
/// # Returns
///
/// The root-level nodes in document order
pub fn build_tree(snapshot: &PageSnapshot, markup: &MarkupConfig) -> Vec<Node> {
    match Url::parse(&snapshot.url) {
        Ok(base) => build_tree_from_html(&snapshot.html, &base, markup),
        Err(e) => {
            tracing::warn!(
                "Cannot resolve navigation links against '{}': {}",
                snapshot.url,
                e
            );
            Vec::new()
        }
    }
}

/// Builds a navigation tree from raw HTML, resolving hrefs against `base`
pub fn build_tree_from_html(html: &str, base: &Url, markup: &MarkupConfig) -> Vec<Node> {
    let document = Html::parse_document(html);

    let Some(root) = select_first(&document, &markup.root) else {
        tracing::info!(
            "Navigation root '{}' not found at {}; nothing to crawl",
            markup.root,
            base
        );
        return Vec::new();
    };

    let tree = Classifier::new(markup, base).classify(root);
    tracing::debug!(
        "Parsed {} root entries ({} nodes) from {}",
        tree.len(),
        tree.iter().map(Node::subtree_len).sum::<usize>(),
        base
    );
    tree
}
