use scraper::{ElementRef, Html};

/// Read-only traversal capability over a rendered page's element tree.
///
/// Extraction strategies depend only on this trait, so a test fixture or a
/// different markup source can stand in for a live page without touching any
/// extraction logic. Implementations never write to the document.
pub trait NodeView: Clone {
    /// Lowercase tag name.
    fn tag(&self) -> &str;
    /// Concatenated text of all descendant text nodes, whitespace untouched.
    fn raw_text(&self) -> String;
    fn attr(&self, name: &str) -> Option<&str>;
    /// Current value of an input-like element: `value`, else `placeholder`,
    /// empty strings treated as absent.
    fn input_value(&self) -> Option<String>;
    /// Element children only.
    fn children(&self) -> Vec<Self>;
    /// Element descendants in document order, excluding self.
    fn descendants(&self) -> Vec<Self>;
    fn parent(&self) -> Option<Self>;
    /// Nearest first, excluding self.
    fn ancestors(&self) -> Vec<Self>;
    /// Next sibling element, skipping text nodes.
    fn next_sibling(&self) -> Option<Self>;
    /// Strict: true when `other` is a proper descendant of self.
    fn contains(&self, other: &Self) -> bool;
    fn same_node(&self, other: &Self) -> bool;

    /// Text content with whitespace runs collapsed and ends trimmed.
    fn text(&self) -> String {
        collapse_ws(&self.raw_text())
    }

    /// Whole-token class match (the `.row` kind of selector).
    fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|t| t == token))
            .unwrap_or(false)
    }

    /// Substring class match (the `[class*="item"]` kind of selector).
    fn class_contains(&self, fragment: &str) -> bool {
        self.attr("class")
            .map(|c| c.contains(fragment))
            .unwrap_or(false)
    }

    /// Self, then ancestors nearest-first — the `closest()` search order.
    fn self_and_ancestors(&self) -> Vec<Self> {
        let mut chain = vec![self.clone()];
        chain.extend(self.ancestors());
        chain
    }
}

pub fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A parsed page snapshot backing the production `NodeView`.
pub struct HtmlPage {
    html: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> HtmlPage {
        HtmlPage {
            html: Html::parse_document(html),
        }
    }

    pub fn root(&self) -> DomNode<'_> {
        DomNode {
            el: self.html.root_element(),
        }
    }
}

#[derive(Clone, Copy)]
pub struct DomNode<'a> {
    el: ElementRef<'a>,
}

impl<'a> NodeView for DomNode<'a> {
    fn tag(&self) -> &str {
        self.el.value().name()
    }

    fn raw_text(&self) -> String {
        self.el.text().collect()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.el.value().attr(name)
    }

    fn input_value(&self) -> Option<String> {
        self.attr("value")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.attr("placeholder").filter(|v| !v.trim().is_empty()))
            .map(|v| v.to_string())
    }

    fn children(&self) -> Vec<Self> {
        self.el
            .children()
            .filter_map(ElementRef::wrap)
            .map(|el| DomNode { el })
            .collect()
    }

    fn descendants(&self) -> Vec<Self> {
        self.el
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .map(|el| DomNode { el })
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        self.el
            .parent()
            .and_then(ElementRef::wrap)
            .map(|el| DomNode { el })
    }

    fn ancestors(&self) -> Vec<Self> {
        self.el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(|el| DomNode { el })
            .collect()
    }

    fn next_sibling(&self) -> Option<Self> {
        self.el
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .map(|el| DomNode { el })
            .next()
    }

    fn contains(&self, other: &Self) -> bool {
        other.el.ancestors().any(|a| a.id() == self.el.id())
    }

    fn same_node(&self, other: &Self) -> bool {
        self.el.id() == other.el.id()
    }
}
