use crate::application::render::{
    dom::{Node, walk_elements_mut},
    style::merge_style,
};

const LIST_STYLE: &str = "padding-left:20px;margin:8px 0;";
const ITEM_STYLE: &str = "margin:4px 0;";

pub(super) fn convert(nodes: &mut Vec<Node>) {
    walk_elements_mut(nodes, &mut |element| {
        if element.is("ul") || element.is("ol") {
            merge_style(element, LIST_STYLE);
        } else if element.is("li") {
            merge_style(element, ITEM_STYLE);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::dom::{parse_fragment, serialize};

    #[test]
    fn lists_and_items_get_spacing() {
        let mut nodes = parse_fragment("<ol><li>a<ul><li>b</li></ul></li></ol>");
        convert(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            format!(
                r#"<ol style="{LIST_STYLE}"><li style="{ITEM_STYLE}">a<ul style="{LIST_STYLE}"><li style="{ITEM_STYLE}">b</li></ul></li></ol>"#
            )
        );
    }
}
