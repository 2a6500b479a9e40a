use crate::application::render::{
    dom::{Element, Node, is_blank},
    style::merge_style,
};

const QUOTE_STYLE: &str = "border-left:4px solid #d0d7de;padding:8px 12px;background:#f8f9fa;margin:12px 0;font-size:14px;color:#555;";

/// Children kept as they are inside a converted quote.
const PARAGRAPH_LIKE: &[&str] = &["p", "section", "div", "ul", "ol", "table", "hr"];
/// Phrasing content that is grouped into a paragraph with its markup intact.
const INLINE: &[&str] = &[
    "a", "b", "br", "code", "del", "em", "i", "img", "kbd", "mark", "s", "span", "strong", "sub",
    "sup", "u",
];

pub(super) fn convert(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            convert(&mut element.children);
            if element.is("blockquote") {
                element.name = "section".to_string();
                merge_style(element, QUOTE_STYLE);
                let children = std::mem::take(&mut element.children);
                element.children = normalize_children(children);
            }
        }
    }
}

fn normalize_children(children: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut run = Vec::new();

    for child in children {
        match &child {
            Node::Text(text) if is_blank(text) && run.is_empty() => {}
            Node::Text(_) => run.push(child),
            Node::Element(element) if is_one_of(element, INLINE) => run.push(child),
            Node::Element(element) if is_one_of(element, PARAGRAPH_LIKE) => {
                flush(&mut run, &mut out);
                out.push(child);
            }
            Node::Element(element) => {
                flush(&mut run, &mut out);
                if element.any_descendant(&|e: &Element| e.is("img")) {
                    out.push(paragraph(element.children.clone()));
                } else if element.has_text() {
                    out.push(paragraph(vec![Node::text(element.text_content().trim())]));
                }
            }
        }
    }
    flush(&mut run, &mut out);
    out
}

fn flush(run: &mut Vec<Node>, out: &mut Vec<Node>) {
    let has_content = run.iter().any(|node| match node {
        Node::Text(text) => !is_blank(text),
        Node::Element(_) => true,
    });
    let nodes = std::mem::take(run);
    if has_content {
        out.push(paragraph(nodes));
    }
}

fn paragraph(children: Vec<Node>) -> Node {
    Element::new("p").with_children(children).into()
}

fn is_one_of(element: &Element, names: &[&str]) -> bool {
    names.iter().any(|name| element.is(name))
}
