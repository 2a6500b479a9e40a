use tracing::warn;

use crate::application::render::{
    dom::{Element, Node},
    style::{StyleMap, merge_style},
};

const TABLE_STYLE: &str = "border-collapse:collapse;width:100%;font-size:14px;";
const HEADER_BACKGROUND: &str = "#f7f7f7";
const PRESENTATION_DEFAULTS: [(&str, &str); 3] =
    [("border", "1"), ("cellspacing", "0"), ("cellpadding", "6")];

pub(super) fn convert(nodes: &mut Vec<Node>) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            if element.is("table") {
                convert_table(element);
            } else {
                convert(&mut element.children);
            }
        }
    }
}

fn convert_table(table: &mut Element) {
    merge_style(table, TABLE_STYLE);
    for (name, value) in PRESENTATION_DEFAULTS {
        if table.attr(name).is_none() {
            table.set_attr(name, value);
        }
    }

    let mut rows = Vec::new();
    for child in std::mem::take(&mut table.children) {
        let Node::Element(element) = child else {
            continue;
        };
        if is_row_group(&element) {
            for grandchild in element.children {
                if let Node::Element(row) = grandchild {
                    if row.is("tr") {
                        rows.extend(convert_row(row));
                    }
                }
            }
        } else if element.is("tr") {
            rows.extend(convert_row(element));
        } else if element.has_text() {
            // Stray content such as a caption keeps its text as a full-width row.
            rows.push(
                Element::new("tr").with_children(vec![
                    Element::new("td")
                        .with_children(element.children)
                        .into(),
                ]),
            );
        }
    }

    if rows.is_empty() {
        warn!(
            target = "application::render::table",
            op = "table::convert",
            result = "empty",
            "table has no rows after conversion"
        );
    }
    table.children = rows.into_iter().map(Node::from).collect();
}

fn is_row_group(element: &Element) -> bool {
    element.is("thead") || element.is("tbody") || element.is("tfoot")
}

fn convert_row(row: Element) -> Option<Element> {
    let background = background_color(&StyleMap::of(&row));
    let cells: Vec<Node> = row
        .children
        .into_iter()
        .filter_map(|child| match child {
            Node::Element(cell) if cell.is("td") || cell.is("th") => {
                Some(Node::Element(convert_cell(cell)))
            }
            _ => None,
        })
        .collect();

    if cells.is_empty() {
        return None;
    }

    let mut converted = Element::new("tr").with_children(cells);
    if let Some(color) = background {
        converted.set_attr("bgcolor", color);
    }
    Some(converted)
}

fn convert_cell(mut cell: Element) -> Element {
    convert(&mut cell.children);

    let style = StyleMap::of(&cell);
    let header = cell.is("th");
    let background = background_color(&style)
        .or_else(|| header.then(|| HEADER_BACKGROUND.to_string()));
    let align = cell
        .attr("align")
        .map(str::to_string)
        .or_else(|| style.get("text-align").map(str::to_string));

    let mut td = Element::new("td");
    for span in ["colspan", "rowspan"] {
        if let Some(value) = cell.attr(span) {
            td.set_attr(span, value);
        }
    }
    if let Some(align) = align {
        td.set_attr("align", align);
    }
    if let Some(color) = background {
        td.set_attr("bgcolor", color);
    }

    td.children = if header && !cell.children.is_empty() {
        vec![Element::new("strong").with_children(cell.children).into()]
    } else {
        cell.children
    };
    td
}

/// A `background-color`, or a `background` shorthand that is just a colour.
fn background_color(style: &StyleMap) -> Option<String> {
    if let Some(color) = style.get("background-color") {
        return Some(color.to_string());
    }
    style
        .get("background")
        .filter(|value| is_plain_color(value))
        .map(str::to_string)
}

fn is_plain_color(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    if lower.contains("url(") || lower.contains("gradient") {
        return false;
    }
    lower.starts_with("rgb") || lower.starts_with("hsl") || lower.split_whitespace().count() == 1
}
