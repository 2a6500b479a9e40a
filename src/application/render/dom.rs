//! Owned HTML tree the export pipeline works on.
//!
//! Fragments are parsed once with html5ever (through `scraper`) and then
//! rewritten in place by the annotator, inliner, transforms and sanitizer.
//! Nothing in here is shared between runs.

use scraper::{ElementRef, Html, Selector, node::Node as HtmlNode};

use super::types::RenderError;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    /// True for text nodes that only carry inter-element whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if is_blank(text))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.iter().any(|void| self.is(void))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attrs
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index).1)
    }

    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attrs.retain(|(key, _)| keep(key));
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|existing| existing == class)
    }

    /// Appends `class` unless it is already present. Returns whether the list changed.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let joined = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
        true
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// True when the subtree carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.children.iter().any(|child| match child {
            Node::Text(text) => !is_blank(text),
            Node::Element(element) => element.has_text(),
        })
    }

    pub fn any_descendant(&self, predicate: &impl Fn(&Element) -> bool) -> bool {
        self.children.iter().any(|child| match child {
            Node::Element(element) => predicate(element) || element.any_descendant(predicate),
            Node::Text(_) => false,
        })
    }

    pub fn first_child_element(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find(|element| element.is(name))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

/// Whitespace test that treats U+00A0 as content, matching how the target keeps `&nbsp;`.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

/// Parse an HTML fragment into owned nodes. Comments and doctypes are discarded.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

/// Parse a complete document and return the children of its `<body>`.
pub fn parse_document_body(html: &str) -> Result<Vec<Node>, RenderError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").map_err(|err| RenderError::html(err.to_string()))?;
    Ok(document
        .select(&selector)
        .next()
        .map(convert_children)
        .unwrap_or_default())
}

fn convert_children(element: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in element.children() {
        match child.value() {
            HtmlNode::Text(text) => nodes.push(Node::text(&**text)),
            HtmlNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    nodes.push(Node::Element(convert_element(child_element)));
                }
            }
            _ => {}
        }
    }
    nodes
}

fn convert_element(element: ElementRef<'_>) -> Element {
    let value = element.value();
    Element {
        name: value.name().to_string(),
        attrs: value
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        children: convert_children(element),
    }
}

pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_text(text, out),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');

    if element.is_void() {
        return;
    }

    // Raw text elements must not be entity-escaped.
    let raw = element.is("style") || element.is("script");
    for child in &element.children {
        match child {
            Node::Text(text) if raw => out.push_str(text),
            other => write_node(other, out),
        }
    }

    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Depth-first walk over every element, parents before children.
pub fn walk_elements_mut(nodes: &mut [Node], visit: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(element) = node {
            visit(element);
            walk_elements_mut(&mut element.children, visit);
        }
    }
}
