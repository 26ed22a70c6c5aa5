//! Navigation tree model
//!
//! This module turns the side navigation's irregular markup into one shape:
//! an ordered tree of [`Node`]s. Child order is document order and is the
//! ordering contract for output numbering.
//!
//! - `classify`: the closed markup-shape recognizer and the recursive classifier
//! - `builder`: builds the initial tree from a page snapshot
//! - `dom`: traversal helpers shared with the crawler's scoped passes

mod builder;
mod classify;
pub(crate) mod dom;

pub use builder::{build_tree, build_tree_from_html};
pub use classify::{Classifier, Mode, Shape};

use serde::Serialize;
use std::fmt::Write;

/// Kind of navigation node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Has children, printed as a directory
    Group,
    /// Points at one page, printed as one artifact
    Link,
}

/// One entry of the navigation tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub title: String,

    /// Destination of a link; landing page of a group when it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    pub children: Vec<Node>,

    /// Group children are not in the DOM yet and must be revealed first
    pub needs_expansion: bool,

    /// Link whose children only appear once its own page is open
    pub is_collapsed: bool,
}

impl Node {
    /// Creates a link node
    pub fn link(title: impl Into<String>, url: impl Into<String>, is_collapsed: bool) -> Self {
        Self {
            kind: NodeKind::Link,
            title: title.into(),
            url: Some(url.into()),
            children: Vec::new(),
            needs_expansion: false,
            is_collapsed,
        }
    }

    /// Creates a group node
    pub fn group(title: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind: NodeKind::Group,
            title: title.into(),
            url: None,
            children,
            needs_expansion: false,
            is_collapsed: false,
        }
    }

    /// Marks the node as needing on-demand expansion
    pub fn deferred(mut self) -> Self {
        self.needs_expansion = true;
        self
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    /// A link that opens into a directory of its own
    pub fn is_lazy_folder(&self) -> bool {
        self.kind == NodeKind::Link && self.is_collapsed
    }

    /// Whether traversal must call the expansion resolver before descending
    ///
    /// Once expansion has produced children this is false for good, so a
    /// group is never expanded twice into duplicate children.
    pub fn awaiting_expansion(&self) -> bool {
        self.is_group() && self.needs_expansion && self.children.is_empty()
    }

    /// Adopts children produced by expansion; ignored once children exist
    pub fn adopt_children(&mut self, children: Vec<Node>) -> bool {
        if !self.children.is_empty() {
            return false;
        }
        self.children = children;
        true
    }

    /// Total number of nodes in this subtree, self included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Node::subtree_len).sum::<usize>()
    }
}

/// Renders an indented, numbered preview of a tree
///
/// Root entries are shown with `---`; nested entries with their 1-based
/// position among their siblings.
pub fn render_preview(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_preview(&mut out, nodes, 0);
    out
}

fn write_preview(out: &mut String, nodes: &[Node], indent: usize) {
    for (index, node) in nodes.iter().enumerate() {
        let prefix = if indent > 0 {
            format!("{:03}", index + 1)
        } else {
            "---".to_string()
        };
        let marker = match (node.kind, node.is_collapsed) {
            (NodeKind::Group, _) => "+",
            (NodeKind::Link, true) => ">",
            (NodeKind::Link, false) => "-",
        };
        let suffix = if node.awaiting_expansion() {
            " (deferred)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{}{} [{}] {}{}",
            "  ".repeat(indent),
            marker,
            prefix,
            node.title,
            suffix
        );
        if node.is_group() {
            write_preview(out, &node.children, indent + 1);
        }
    }
}
