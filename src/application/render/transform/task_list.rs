use crate::application::render::dom::{Element, Node, walk_elements_mut};

const CHECKED: &str = "\u{2611}\u{fe0f}";
const UNCHECKED: &str = "\u{2b1c}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Checkbox { checked: bool },
    Text { checked: bool },
}

impl Marker {
    fn checked(self) -> bool {
        match self {
            Marker::Checkbox { checked } | Marker::Text { checked } => checked,
        }
    }
}

pub(super) fn convert(nodes: &mut Vec<Node>) {
    walk_elements_mut(nodes, &mut |element| {
        if element.is("li") {
            convert_item(element);
        }
    });
}

fn convert_item(item: &mut Element) {
    let mut label = String::new();
    collect_label(&item.children, &mut label);
    let label = label.trim();

    let Some(marker) = find_checkbox(&item.children).or_else(|| text_marker(label)) else {
        return;
    };

    let label = match marker {
        Marker::Text { .. } => label[3..].trim_start(),
        Marker::Checkbox { .. } => label,
    };
    let glyph = if marker.checked() { CHECKED } else { UNCHECKED };

    let mut children = vec![Node::text(format!("{glyph} {label}"))];
    children.extend(std::mem::take(&mut item.children).into_iter().filter(is_nested_list));
    item.children = children;
}

fn is_list(element: &Element) -> bool {
    element.is("ul") || element.is("ol")
}

fn is_nested_list(node: &Node) -> bool {
    node.as_element().is_some_and(is_list)
}

/// Item text, excluding nested lists and form controls.
fn collect_label(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if is_list(element) || element.is("input") => {}
            Node::Element(element) => collect_label(&element.children, out),
        }
    }
}

fn find_checkbox(nodes: &[Node]) -> Option<Marker> {
    nodes.iter().filter_map(Node::as_element).find_map(|element| {
        if is_list(element) {
            None
        } else if element.is("input")
            && element
                .attr("type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox"))
        {
            Some(Marker::Checkbox {
                checked: element.attr("checked").is_some(),
            })
        } else {
            find_checkbox(&element.children)
        }
    })
}

fn text_marker(label: &str) -> Option<Marker> {
    match label.get(..3)? {
        "[x]" | "[X]" => Some(Marker::Text { checked: true }),
        "[ ]" => Some(Marker::Text { checked: false }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::dom::{parse_fragment, serialize};

    fn converted(html: &str) -> String {
        let mut nodes = parse_fragment(html);
        convert(&mut nodes);
        serialize(&nodes)
    }

    #[test]
    fn checkboxes_become_glyphs() {
        let html = converted(concat!(
            r#"<ul><li><input type="checkbox" checked="" disabled=""> Ship it</li>"#,
            r#"<li><input type="checkbox" disabled=""> Write docs</li></ul>"#
        ));
        assert_eq!(html, "<ul><li>\u{2611}\u{fe0f} Ship it</li><li>\u{2b1c} Write docs</li></ul>");
        assert!(!html.contains("<input"));
    }

    #[test]
    fn literal_markers_are_stripped_once() {
        let html = converted("<ul><li>[x] done [x]</li><li>[ ] open</li><li>plain</li></ul>");
        assert_eq!(
            html,
            "<ul><li>\u{2611}\u{fe0f} done [x]</li><li>\u{2b1c} open</li><li>plain</li></ul>"
        );
    }

    #[test]
    fn loose_items_and_nested_lists_are_kept() {
        let html = converted(concat!(
            r#"<ul><li><p><input type="checkbox"> <em>Parent</em></p>"#,
            r#"<ul><li><input type="checkbox" checked=""> Child</li></ul></li></ul>"#
        ));
        assert_eq!(
            html,
            "<ul><li>\u{2b1c} Parent<ul><li>\u{2611}\u{fe0f} Child</li></ul></li></ul>"
        );
    }
}
