use crate::application::render::{
    annotate::CODE_BLOCK_CLASS,
    dom::{Element, Node},
    style::{StyleMap, merge_style},
};

const SECTION_STYLE: &str = "background:#f6f8fa;padding:12px;border-radius:6px;margin:16px 0;";
const INNER_STYLE: &str = "font-family:Menlo,monospace;font-size:14px;line-height:1.4;";
const LINE_STYLE: &str = "margin:0;white-space:pre-wrap;word-break:break-all;";
/// Zero-height paragraph emitted after every converted block.
pub const SEPARATOR_STYLE: &str = "margin:0;height:0;overflow:hidden;";

pub(super) fn convert(nodes: &mut Vec<Node>) {
    let original = std::mem::take(nodes);
    for node in original {
        match node {
            Node::Element(element) if is_code_block(&element) => {
                nodes.push(Node::Element(convert_block(element)));
                nodes.push(Node::Element(separator()));
            }
            Node::Element(mut element) => {
                convert(&mut element.children);
                nodes.push(Node::Element(element));
            }
            text => nodes.push(text),
        }
    }
}

fn is_code_block(element: &Element) -> bool {
    element.is("pre") && element.has_class(CODE_BLOCK_CLASS)
}

fn convert_block(pre: Element) -> Element {
    let source = match pre.first_child_element("code") {
        Some(code) => code.text_content(),
        None => pre.text_content(),
    };

    let lines: Vec<Node> = split_lines(&source)
        .into_iter()
        .map(|line| {
            Element::new("div")
                .with_attr("style", LINE_STYLE)
                .with_children(vec![Node::text(display_line(line))])
                .into()
        })
        .collect();

    let inner = Element::new("div")
        .with_attr("style", INNER_STYLE)
        .with_children(lines);

    // The section keeps the pre's attributes so later steps still see the role class.
    let mut section = Element {
        name: "section".to_string(),
        attrs: pre.attrs,
        children: vec![inner.into()],
    };
    merge_style(&mut section, SECTION_STYLE);
    section
}

/// One entry per source line. The newline terminating the final line is not
/// a line of its own; any further trailing newlines are kept as blank lines.
fn split_lines(source: &str) -> Vec<&str> {
    let body = source
        .strip_suffix("\r\n")
        .or_else(|| source.strip_suffix('\n'))
        .unwrap_or(source);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Blank lines become a single no-break space; leading indentation is made
/// non-collapsible.
fn display_line(line: &str) -> String {
    if line.trim().is_empty() {
        return "\u{a0}".to_string();
    }
    let indent_end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    let mut out = String::with_capacity(line.len() + indent_end);
    for c in line[..indent_end].chars() {
        match c {
            '\t' => out.push_str("\u{a0}\u{a0}\u{a0}\u{a0}"),
            _ => out.push('\u{a0}'),
        }
    }
    out.push_str(&line[indent_end..]);
    out
}

fn separator() -> Element {
    Element::new("p")
        .with_attr("style", SEPARATOR_STYLE)
        .with_children(vec![Node::text("\u{a0}")])
}

/// Recognise a separator paragraph by its style signature.
pub fn is_separator(element: &Element) -> bool {
    if !element.is("p") {
        return false;
    }
    let style = StyleMap::of(element);
    style.get("height").is_some_and(|value| value.trim() == "0")
        && style
            .get("overflow")
            .is_some_and(|value| value.trim() == "hidden")
}
