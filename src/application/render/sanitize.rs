//! Whitelist rebuild of a converted article.
//!
//! Every element is re-created from an allow-list of tags and attributes.
//! Nothing with visible text is dropped: unknown tags, content nested past
//! [`MAX_DEPTH`], and stray children of strict containers are all rewritten
//! into a paragraph (or list item, or cell) that keeps their text and images.

use super::{
    dom::{Element, Node, is_blank},
    transform::is_separator,
};

/// Deepest element level kept as-is, counted from each top-level block.
pub const MAX_DEPTH: usize = 3;

const ALLOWED_TAGS: &[&str] = &[
    "section", "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote",
    "img", "hr", "strong", "em", "a", "br", "span", "pre", "code", "table", "tr", "th", "td",
];
/// Containers whose children are phrasing content; unknown tags inside them are unwrapped
/// instead of becoming nested paragraphs.
const PHRASING: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "strong", "em", "a", "code",
];
/// Allowed tags that survive without children.
const VOID_SAFE: &[&str] = &["br", "hr", "img"];
/// Dropped with their content.
const DISCARDED: &[&str] = &[
    "script", "style", "link", "meta", "title", "template", "noscript", "head",
];

const GLOBAL_ATTRS: &[&str] = &["style", "class", "id", "title"];

fn tag_attrs(name: &str) -> &'static [&'static str] {
    match name {
        "a" => &["href"],
        "table" => &["border", "cellpadding", "cellspacing", "width"],
        "tr" => &["bgcolor", "align"],
        "th" | "td" => &["colspan", "rowspan", "align", "bgcolor", "width"],
        _ => &[],
    }
}

/// Rebuild `nodes` (the children of the article root) against the whitelist.
pub fn sanitize(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .flat_map(|node| sanitize_node(node, 0, false))
        .collect()
}

fn sanitize_node(node: Node, depth: usize, inline: bool) -> Vec<Node> {
    match node {
        Node::Text(text) => vec![Node::Text(text)],
        Node::Element(element) => sanitize_element(element, depth, inline),
    }
}

fn sanitize_element(element: Element, depth: usize, inline: bool) -> Vec<Node> {
    if is_one_of(&element, DISCARDED) {
        return Vec::new();
    }
    if element.is("img") {
        return vec![image(&element).into()];
    }
    if element.is("br") {
        return vec![Element::new("br").into()];
    }
    if depth > MAX_DEPTH || !is_one_of(&element, ALLOWED_TAGS) {
        return hoist(element, inline);
    }

    let name = element.name.to_ascii_lowercase();
    let rebuilt = match name.as_str() {
        "ul" | "ol" => list(element, depth),
        "blockquote" => blockquote(element, depth),
        "pre" => preformatted(element),
        "table" => table(element, depth),
        "tr" => row(element, depth),
        "th" | "td" => Some(cell(element, depth)),
        "p" if is_separator(&element) => Some(element),
        _ => generic(element, depth),
    };
    rebuilt.map(Node::from).into_iter().collect()
}

fn generic(element: Element, depth: usize) -> Option<Element> {
    let inline = is_one_of(&element, PHRASING);
    let void_safe = is_one_of(&element, VOID_SAFE);
    let Element {
        name,
        attrs,
        children,
    } = element;

    let children: Vec<Node> = children
        .into_iter()
        .flat_map(|child| sanitize_node(child, depth + 1, inline))
        .collect();
    let has_children = children.iter().any(|child| !child.is_blank_text());
    if !has_children && !void_safe {
        return None;
    }

    Some(Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children,
    })
}

fn list(element: Element, depth: usize) -> Option<Element> {
    let Element {
        name,
        attrs,
        children,
    } = element;

    let mut items = Vec::new();
    for child in children {
        match child {
            Node::Element(child) if child.is("li") => {
                items.extend(sanitize_element(child, depth + 1, false));
            }
            Node::Text(text) if is_blank(&text) => {}
            other => {
                let content = sanitize_node(other, depth + 2, false);
                if has_content(&content) {
                    items.push(Element::new("li").with_children(content).into());
                }
            }
        }
    }

    if items.is_empty() {
        return None;
    }
    Some(Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children: items,
    })
}

fn blockquote(element: Element, depth: usize) -> Option<Element> {
    let Element {
        name,
        attrs,
        children,
    } = element;

    let mut paragraphs = Vec::new();
    for child in children {
        match child {
            Node::Element(child) if child.is("p") => {
                paragraphs.extend(sanitize_element(child, depth + 1, false));
            }
            other => {
                let mut content = Vec::new();
                flatten_into(vec![other], &mut content);
                if has_content(&content) {
                    paragraphs.push(Element::new("p").with_children(content).into());
                }
            }
        }
    }

    if paragraphs.is_empty() {
        return None;
    }
    Some(Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children: paragraphs,
    })
}

fn preformatted(element: Element) -> Option<Element> {
    let code = element.first_child_element("code");
    let text = match code {
        Some(code) => code.text_content(),
        None => element.text_content(),
    };
    if code.is_none() && is_blank(&text) {
        return None;
    }

    let code_attrs = code
        .map(|code| filter_attrs("code", code.attrs.clone()))
        .unwrap_or_default();
    let code = Element {
        name: "code".to_string(),
        attrs: code_attrs,
        children: vec![Node::text(text)],
    };
    Some(Element {
        attrs: filter_attrs("pre", element.attrs),
        name: "pre".to_string(),
        children: vec![code.into()],
    })
}

fn table(element: Element, depth: usize) -> Option<Element> {
    let Element {
        name,
        attrs,
        children,
    } = element;

    let mut rows = Vec::new();
    for child in children {
        match child {
            Node::Element(child) if child.is("tr") => rows.extend(row(child, depth + 1)),
            Node::Element(group)
                if group.is("thead") || group.is("tbody") || group.is("tfoot") =>
            {
                for grandchild in group.children {
                    if let Node::Element(candidate) = grandchild {
                        if candidate.is("tr") {
                            rows.extend(row(candidate, depth + 1));
                        }
                    }
                }
            }
            Node::Text(text) if is_blank(&text) => {}
            other => {
                let content = sanitize_node(other, depth + 3, false);
                if has_content(&content) {
                    let cell = Element::new("td").with_children(content);
                    rows.push(Element::new("tr").with_children(vec![cell.into()]));
                }
            }
        }
    }

    // A table that lost every row is still emitted; the table step has
    // already reported it.
    Some(Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children: rows.into_iter().map(Node::from).collect(),
    })
}

fn row(element: Element, depth: usize) -> Option<Element> {
    let Element {
        name,
        attrs,
        children,
    } = element;

    let mut cells = Vec::new();
    for child in children {
        match child {
            Node::Element(child) if child.is("td") || child.is("th") => {
                cells.push(cell(child, depth + 1).into());
            }
            Node::Text(text) if is_blank(&text) => {}
            other => {
                let content = sanitize_node(other, depth + 2, false);
                if has_content(&content) {
                    cells.push(Element::new("td").with_children(content).into());
                }
            }
        }
    }

    if cells.is_empty() {
        return None;
    }
    Some(Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children: cells,
    })
}

/// Cells are never dropped; an empty one keeps a single space so rows stay aligned.
fn cell(element: Element, depth: usize) -> Element {
    let Element {
        name,
        attrs,
        children,
    } = element;

    let mut children: Vec<Node> = children
        .into_iter()
        .flat_map(|child| sanitize_node(child, depth + 1, false))
        .collect();
    if !has_content(&children) {
        children = vec![Node::text(" ")];
    }

    Element {
        attrs: filter_attrs(&name, attrs),
        name,
        children,
    }
}

fn image(element: &Element) -> Element {
    Element {
        name: "img".to_string(),
        attrs: element
            .attrs
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("src") || key.eq_ignore_ascii_case("alt"))
            .cloned()
            .collect(),
        children: Vec::new(),
    }
}

/// Replace an element that cannot be kept by its text and images. A block
/// wrapper keeps the element's inline style, so hoisted code lines stay
/// preformatted.
fn hoist(element: Element, inline: bool) -> Vec<Node> {
    let keep_name = element.is("li") || element.is("td") || element.is("th");
    let style = element.attr("style").map(str::to_string);
    let Element { name, children, .. } = element;

    let mut content = Vec::new();
    flatten_into(children, &mut content);
    if !has_content(&content) {
        return Vec::new();
    }
    if inline {
        return content;
    }

    let mut wrapper = Element::new(if keep_name { name } else { "p".to_string() })
        .with_children(content);
    if let Some(style) = style {
        wrapper.set_attr("style", style);
    }
    vec![wrapper.into()]
}

fn flatten_into(nodes: Vec<Node>, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(Node::Text(text)),
            Node::Element(element) if is_one_of(&element, DISCARDED) => {}
            Node::Element(element) if element.is("img") => out.push(image(&element).into()),
            Node::Element(element) if element.is("br") => out.push(Element::new("br").into()),
            Node::Element(element) => flatten_into(element.children, out),
        }
    }
}

/// Visible text or an image somewhere in `nodes`.
fn has_content(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Text(text) => !is_blank(text),
        Node::Element(element) => {
            element.is("img") || element.has_text() || element.any_descendant(&|e: &Element| e.is("img"))
        }
    })
}

fn filter_attrs(name: &str, attrs: Vec<(String, String)>) -> Vec<(String, String)> {
    let name = name.to_ascii_lowercase();
    let specific = tag_attrs(&name);
    attrs
        .into_iter()
        .filter(|(key, _)| {
            let key = key.to_ascii_lowercase();
            GLOBAL_ATTRS.contains(&key.as_str()) || specific.contains(&key.as_str())
        })
        .collect()
}

fn is_one_of(element: &Element, names: &[&str]) -> bool {
    names.iter().any(|name| element.is(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::{
        dom::{parse_fragment, serialize},
        transform::SEPARATOR_STYLE,
    };

    fn sanitized(html: &str) -> String {
        serialize(&sanitize(parse_fragment(html)))
    }

    #[test]
    fn unknown_tags_keep_their_text_as_paragraphs() {
        assert_eq!(sanitized("<figure><figcaption>Cap</figcaption></figure>"), "<p>Cap</p>");
        assert_eq!(sanitized("<figure></figure>"), "");
    }

    #[test]
    fn unknown_inline_tags_are_unwrapped() {
        assert_eq!(sanitized("<p>a <del>b</del> c</p>"), "<p>a b c</p>");
    }

    #[test]
    fn scripts_are_dropped_with_their_content() {
        assert_eq!(sanitized("<div><script>alert(1)</script>x</div>"), "<div>x</div>");
    }

    #[test]
    fn images_keep_only_source_and_alt() {
        assert_eq!(
            sanitized(r#"<p><img src="a.png" alt="A" style="width:1px" data-id="1" onerror="x"></p>"#),
            r#"<p><img src="a.png" alt="A"></p>"#
        );
    }

    #[test]
    fn lists_keep_items_and_wrap_stray_content() {
        assert_eq!(
            sanitized("<ul><li>a</li>stray<p>b</p></ul>"),
            "<ul><li>a</li><li>stray</li><li><p>b</p></li></ul>"
        );
        assert_eq!(sanitized("<ul> </ul>"), "");
    }

    #[test]
    fn blockquotes_keep_only_paragraphs() {
        assert_eq!(
            sanitized("<blockquote><p>a</p><div>b</div><span></span></blockquote>"),
            "<blockquote><p>a</p><p>b</p></blockquote>"
        );
        assert_eq!(sanitized("<blockquote> </blockquote>"), "");
    }

    #[test]
    fn pre_always_wraps_code() {
        assert_eq!(sanitized("<pre>bare</pre>"), "<pre><code>bare</code></pre>");
        assert_eq!(sanitized("<pre></pre>"), "");
    }

    #[test]
    fn tables_collect_rows_and_keep_empty_cells() {
        assert_eq!(
            sanitized(concat!(
                r#"<table border="1" onclick="x"><thead><tr><th>h</th></tr></thead>"#,
                "<tbody><tr><td> </td></tr><tr></tr></tbody></table>"
            )),
            r#"<table border="1"><tr><th>h</th></tr><tr><td> </td></tr></table>"#
        );
    }

    #[test]
    fn tables_without_rows_are_kept() {
        assert_eq!(
            sanitized(r#"<table border="1" style="width:100%;"><tbody><tr></tr></tbody></table>"#),
            r#"<table border="1" style="width:100%;"></table>"#
        );
    }

    #[test]
    fn empty_separator_paragraph_survives() {
        let source = format!(r#"<p style="{SEPARATOR_STYLE}"></p>"#);
        assert_eq!(sanitized(&source), source);
        assert_eq!(sanitized("<p> </p>"), "");
    }

    #[test]
    fn content_past_the_depth_bound_is_hoisted() {
        assert_eq!(
            sanitized(
                r#"<section><div><div><div><div><strong>deep</strong><img src="x.png"></div></div></div></div></section>"#
            ),
            r#"<section><div><div><div><p>deep<img src="x.png"></p></div></div></div></section>"#
        );
    }

    #[test]
    fn hoisted_blocks_keep_their_inline_style() {
        assert_eq!(
            sanitized(concat!(
                "<section><div><div><div>",
                r#"<div style="margin:0;white-space:pre-wrap;">&nbsp;&nbsp;x</div>"#,
                "</div></div></div></section>"
            )),
            concat!(
                "<section><div><div><div>",
                r#"<p style="margin:0;white-space:pre-wrap;">&nbsp;&nbsp;x</p>"#,
                "</div></div></div></section>"
            )
        );
    }

    #[test]
    fn lists_nested_past_the_bound_keep_their_text() {
        assert_eq!(
            sanitized("<ul><li>1<ul><li>2<ul><li>3</li></ul></li></ul></li></ul>"),
            "<ul><li>1<ul><li>2<p>3</p></li></ul></li></ul>"
        );
    }
}
