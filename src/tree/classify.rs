//! Markup classification
//!
//! Every element child of a container is recognized as exactly one [`Shape`]
//! and then emitted as zero or more [`Node`]s. The same precedence applies at
//! every depth:
//!
//! 1. `Label`: a section title or bare heading, absorbed by its group
//! 2. `Group`: an accordion section, or an element holding both a header and
//!    a content region
//! 3. `Item`: a list item, with or without a direct link
//! 4. `Wrapper`: a generic container that adds no tree level
//! 5. `LooseLink`: any other anchor
//!
//! Anything else is `Unknown` and silently dropped.

use crate::config::MarkupConfig;
use crate::tree::dom::{descendants, element_children, has_class, tag, text_of};
use crate::tree::Node;
use crate::url::resolve_href;
use scraper::ElementRef;
use url::Url;

/// What the classifier emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Full navigation tree with nested groups
    Tree,
    /// Links only; sections and nested lists are flattened in document order
    Flat,
}

/// A recognized markup idiom
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Label,
    Group {
        header: Option<ElementRef<'a>>,
        content: Option<ElementRef<'a>>,
        section: bool,
    },
    Item {
        link: Option<ElementRef<'a>>,
    },
    Wrapper,
    LooseLink(ElementRef<'a>),
    Unknown,
}

/// Turns a navigation subtree into nodes
pub struct Classifier<'c> {
    markup: &'c MarkupConfig,
    base: &'c Url,
    mode: Mode,
}

impl<'c> Classifier<'c> {
    /// Creates a tree-mode classifier resolving hrefs against `base`
    pub fn new(markup: &'c MarkupConfig, base: &'c Url) -> Self {
        Self {
            markup,
            base,
            mode: Mode::Tree,
        }
    }

    /// Creates a flat-mode classifier, used on scopes that only hold links
    pub fn flat(markup: &'c MarkupConfig, base: &'c Url) -> Self {
        Self {
            markup,
            base,
            mode: Mode::Flat,
        }
    }

    /// Classifies the element children of `container`
    pub fn classify(&self, container: ElementRef<'_>) -> Vec<Node> {
        let mut out = Vec::new();
        self.classify_into(container, &mut out);
        out
    }

    fn classify_into(&self, container: ElementRef<'_>, out: &mut Vec<Node>) {
        for child in element_children(container) {
            let shape = self.recognize(child);
            self.emit(child, shape, out);
        }
    }

    /// Recognizes the shape of a single element
    pub fn recognize<'a>(&self, el: ElementRef<'a>) -> Shape<'a> {
        if self.is_label(el) {
            return Shape::Label;
        }

        let section = has_class(el, &self.markup.section_class);
        match self.mode {
            Mode::Tree => {
                let header = self.find_header(el);
                let content = self.find_content(el);
                if section || (header.is_some() && content.is_some()) {
                    return Shape::Group {
                        header,
                        content,
                        section,
                    };
                }
            }
            Mode::Flat => {
                if section {
                    return Shape::Group {
                        header: None,
                        content: self.find_content(el),
                        section,
                    };
                }
            }
        }

        self.recognize_structural(el)
    }

    /// Shapes that do not depend on accordion vocabulary
    fn recognize_structural<'a>(&self, el: ElementRef<'a>) -> Shape<'a> {
        match tag(el) {
            "li" => Shape::Item {
                link: element_children(el).find(|c| tag(*c) == "a"),
            },
            "nav" | "div" | "ul" | "ol" => Shape::Wrapper,
            "a" => Shape::LooseLink(el),
            _ => Shape::Unknown,
        }
    }

    fn emit(&self, el: ElementRef<'_>, shape: Shape<'_>, out: &mut Vec<Node>) {
        match shape {
            Shape::Label | Shape::Unknown => {}

            Shape::Group {
                header,
                content,
                section,
            } => match self.mode {
                Mode::Tree => match self.group(el, header, content, section) {
                    Some(node) => out.push(node),
                    // An empty, non-deferred group candidate is read as plain structure
                    None => self.emit(el, self.recognize_structural(el), out),
                },
                Mode::Flat => self.classify_into(content.unwrap_or(el), out),
            },

            Shape::Item { link: None } => self.classify_into(el, out),

            Shape::Item { link: Some(link) } => match self.mode {
                Mode::Tree => {
                    let mut nested = Vec::new();
                    for sibling in element_children(el).filter(|c| c.id() != link.id()) {
                        self.classify_into(sibling, &mut nested);
                    }

                    if nested.is_empty() {
                        out.extend(self.link_node(link));
                    } else {
                        let mut group = Node::group(text_of(link), nested);
                        group.url = self.href_of(link);
                        out.push(group);
                    }
                }
                Mode::Flat => {
                    out.extend(self.link_node(link));
                    for nested in element_children(el).filter(|c| matches!(tag(*c), "ul" | "div")) {
                        self.classify_into(nested, out);
                    }
                }
            },

            Shape::Wrapper => self.classify_into(el, out),

            Shape::LooseLink(link) => out.extend(self.link_node(link)),
        }
    }

    /// Builds a group node, or None when it has nothing to offer
    fn group(
        &self,
        el: ElementRef<'_>,
        header: Option<ElementRef<'_>>,
        content: Option<ElementRef<'_>>,
        section: bool,
    ) -> Option<Node> {
        let title = text_of(header.unwrap_or(el));

        let mut children = Vec::new();
        self.classify_into(content.unwrap_or(el), &mut children);
        children.retain(|child| child.title != title);

        let needs_expansion = el.value().attr(&self.markup.deferred_attribute).is_some()
            || (children.is_empty() && section);

        if children.is_empty() && !needs_expansion {
            return None;
        }

        let mut node = Node::group(title, children);
        node.needs_expansion = needs_expansion;
        Some(node)
    }

    /// Builds a link node from an anchor; anchors without a usable href yield None
    pub fn link_node(&self, link: ElementRef<'_>) -> Option<Node> {
        let url = self.href_of(link)?;
        Some(Node::link(text_of(link), url, self.is_collapsed_hint(link)))
    }

    fn href_of(&self, link: ElementRef<'_>) -> Option<String> {
        link.value()
            .attr("href")
            .and_then(|href| resolve_href(href, self.base))
    }

    fn is_collapsed_hint(&self, link: ElementRef<'_>) -> bool {
        link.value().attr(&self.markup.collapsed_attribute).is_some()
            || has_class(link, &self.markup.collapsed_icon_class)
    }

    fn is_label(&self, el: ElementRef<'_>) -> bool {
        if has_class(el, &self.markup.title_class) {
            return true;
        }
        match self.mode {
            Mode::Tree => matches!(tag(el), "h3" | "h4"),
            Mode::Flat => matches!(tag(el), "h1" | "h2" | "h3" | "h4" | "h5"),
        }
    }

    /// Title-class header first, then the first h3, then the first h4
    fn find_header<'a>(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(el)
            .find(|d| has_class(*d, &self.markup.title_class))
            .or_else(|| descendants(el).find(|d| tag(*d) == "h3"))
            .or_else(|| descendants(el).find(|d| tag(*d) == "h4"))
    }

    fn find_content<'a>(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        descendants(el).find(|d| has_class(*d, &self.markup.content_class))
    }
}
