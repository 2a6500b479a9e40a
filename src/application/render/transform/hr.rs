use crate::application::render::{
    dom::{Node, walk_elements_mut},
    style::merge_style,
};

const RULE_STYLE: &str = "border:none;border-top:1px solid #ddd;margin:16px 0;";

pub(super) fn convert(nodes: &mut Vec<Node>) {
    walk_elements_mut(nodes, &mut |element| {
        if element.is("hr") {
            merge_style(element, RULE_STYLE);
            element.remove_attr("class");
            element.remove_attr("id");
        }
    });
}
