//! In-page scripts evaluated by the Chrome session
//!
//! Every script is a self-invoking expression. Values from configuration are
//! embedded as JSON literals, never spliced in as raw text.

use crate::browser::{HIDDEN_ATTRIBUTE, LEFT_OFFSET_ATTRIBUTE};
use crate::config::MarkupConfig;
use crate::render::PrintPreparation;
use serde_json::json;

/// Id of the injected print style element
pub(crate) const PRINT_STYLE_ID: &str = "navpress-print-style";

const HEADING_STYLE: &str = "display: block !important; font-size: 24pt !important; \
    font-weight: bold !important; margin-bottom: 20px !important; color: #000 !important; \
    page-break-after: avoid !important; visibility: visible !important; opacity: 1 !important;";

const BREADCRUMB_STYLE: &str = "display: block !important; font-size: 10pt !important; \
    color: #666 !important; margin-bottom: 10px !important; visibility: visible !important; \
    opacity: 1 !important;";

/// Clicks a section header open unless its content is already showing
pub(crate) fn reveal_section(title: &str, markup: &MarkupConfig) -> String {
    let args = json!({
        "title": title,
        "titleClass": markup.title_class,
        "sectionClass": markup.section_class,
        "contentClass": markup.content_class,
        "collapsedAttribute": markup.collapsed_attribute,
    });

    format!(
        r#"((args) => {{
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
    const headers = Array.from(document.querySelectorAll('.' + CSS.escape(args.titleClass)));
    const target = headers.find((h) => norm(h.innerText) === args.title);
    if (!target) return false;
    const section = target.closest('.' + CSS.escape(args.sectionClass));
    if (!section) return false;
    const content = section.querySelector('.' + CSS.escape(args.contentClass));
    if (!content || content.style.display === 'none'
        || section.getAttribute(args.collapsedAttribute) === 'true') {{
        target.click();
    }}
    return true;
}})({args})"#
    )
}

/// Adds the active class to every section so all content renders
pub(crate) fn reveal_all_sections(markup: &MarkupConfig) -> String {
    let args = json!({
        "sectionClass": markup.section_class,
        "activeClass": markup.active_class,
    });

    format!(
        r#"((args) => {{
    const sections = document.querySelectorAll('.' + CSS.escape(args.sectionClass));
    sections.forEach((s) => s.classList.add(args.activeClass));
    return sections.length;
}})({args})"#
    )
}

/// Records left offset and visibility of each navigation anchor
///
/// The print style hides the navigation, so it is disabled while measuring.
pub(crate) fn annotate_geometry(markup: &MarkupConfig) -> String {
    let args = json!({
        "root": markup.root,
        "styleId": PRINT_STYLE_ID,
        "leftAttribute": LEFT_OFFSET_ATTRIBUTE,
        "hiddenAttribute": HIDDEN_ATTRIBUTE,
    });

    format!(
        r#"((args) => {{
    const style = document.getElementById(args.styleId);
    if (style) style.disabled = true;
    let count = 0;
    const root = document.querySelector(args.root);
    if (root) {{
        root.querySelectorAll('a').forEach((a) => {{
            a.setAttribute(args.leftAttribute, String(a.getBoundingClientRect().left));
            if (a.offsetParent === null) a.setAttribute(args.hiddenAttribute, '');
            else a.removeAttribute(args.hiddenAttribute);
            count += 1;
        }});
    }}
    if (style) style.disabled = false;
    return count;
}})({args})"#
    )
}

/// Readies the page for printing
///
/// Breadcrumbs are prepended after the heading so they end up above it.
pub(crate) fn prepare_for_print(preparation: &PrintPreparation<'_>) -> String {
    let args = json!({
        "title": preparation.title,
        "contentSelectors": preparation.content_selectors,
        "headingSelectors": preparation.heading_selectors,
        "breadcrumbSelector": preparation.breadcrumb_selector,
        "css": preparation.style,
        "styleId": PRINT_STYLE_ID,
        "headingStyle": HEADING_STYLE,
        "breadcrumbStyle": BREADCRUMB_STYLE,
    });

    format!(
        r#"((args) => {{
    const pick = (selectors) => {{
        for (const s of selectors) {{
            try {{
                const el = document.querySelector(s);
                if (el) return el;
            }} catch (e) {{}}
        }}
        return null;
    }};
    document.querySelectorAll('details').forEach((d) => {{ d.open = true; }});
    const content = pick(args.contentSelectors) || document.body;
    const heading = pick(args.headingSelectors);
    if (heading) {{
        const h = heading.cloneNode(true);
        h.style.cssText = args.headingStyle;
        content.prepend(h);
    }} else {{
        const h = document.createElement('h1');
        h.innerText = args.title;
        h.style.cssText = args.headingStyle;
        content.prepend(h);
    }}
    const crumbs = pick([args.breadcrumbSelector]);
    if (crumbs) {{
        const c = crumbs.cloneNode(true);
        c.classList.add('injected-breadcrumb');
        c.style.cssText = args.breadcrumbStyle;
        content.prepend(c);
    }}
    let style = document.getElementById(args.styleId);
    if (!style) {{
        style = document.createElement('style');
        style.id = args.styleId;
        document.head.appendChild(style);
    }}
    style.textContent = args.css;
    return true;
}})({args})"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_embedded_as_json() {
        let script = reveal_section(r#"Tools "quoted" </script>"#, &MarkupConfig::default());
        assert!(script.contains(r#""title":"Tools \"quoted\" </script>""#));
        assert!(script.contains(r#""titleClass":"accordion-title""#));
        assert!(script.trim_end().ends_with(')'));
    }

    #[test]
    fn test_geometry_script_names_attributes() {
        let script = annotate_geometry(&MarkupConfig::default());
        assert!(script.contains(LEFT_OFFSET_ATTRIBUTE));
        assert!(script.contains(HIDDEN_ATTRIBUTE));
        assert!(script.contains(PRINT_STYLE_ID));
        assert!(script.contains("aside.js-accordion"));
    }

    #[test]
    fn test_print_script_carries_selectors() {
        let selectors = vec!["main".to_string()];
        let headings = vec!["h1".to_string()];
        let preparation = PrintPreparation {
            title: "Buffer",
            style: "header { display: none !important; }",
            content_selectors: &selectors,
            heading_selectors: &headings,
            breadcrumb_selector: "nav.breadcrumbs",
        };

        let script = prepare_for_print(&preparation);
        assert!(script.contains(r#""contentSelectors":["main"]"#));
        assert!(script.contains(r#""breadcrumbSelector":"nav.breadcrumbs""#));
        assert!(script.contains("details"));
    }
}
