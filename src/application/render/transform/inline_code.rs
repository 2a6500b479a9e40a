use crate::application::render::{
    annotate::CODE_BLOCK_CLASS,
    dom::{Element, Node},
    style::merge_style,
};

const INLINE_CODE_STYLE: &str = "background:#f6f8fa;padding:2px 6px;border-radius:3px;font-family:Menlo,monospace;font-size:14px;";

pub(super) fn convert(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            visit(element);
        }
    }
}

fn visit(element: &mut Element) {
    if element.is("code") {
        convert_code(element);
        return;
    }
    // Block code is handled by its own step; anything left inside it stays verbatim.
    if element.is("pre") || element.has_class(CODE_BLOCK_CLASS) {
        return;
    }
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            visit(child);
        }
    }
}

fn convert_code(code: &mut Element) {
    let text = code.text_content();
    code.name = "span".to_string();
    merge_style(code, INLINE_CODE_STYLE);
    code.children = vec![Node::text(text)];
}
