use crate::application::render::{
    dom::{Node, walk_elements_mut},
    style::merge_style,
};

fn level_style(level: u8) -> &'static str {
    match level {
        1 => "font-size:24px;font-weight:600;margin:16px 0 8px;",
        2 => "font-size:20px;font-weight:600;margin:16px 0 8px;",
        3 => "font-size:18px;font-weight:600;margin:16px 0 8px;",
        4 => "font-size:16px;font-weight:600;margin:14px 0 8px;",
        5 => "font-size:15px;font-weight:600;margin:12px 0 8px;",
        _ => "font-size:14px;font-weight:600;margin:10px 0 8px;",
    }
}

fn heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix(['h', 'H'])?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

pub(super) fn convert(nodes: &mut Vec<Node>) {
    walk_elements_mut(nodes, &mut |element| {
        if let Some(level) = heading_level(&element.name) {
            element.name = "p".to_string();
            merge_style(element, level_style(level));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::{
        annotate::annotate,
        dom::{parse_fragment, serialize},
        inline::inline_styles,
    };

    #[test]
    fn headings_become_styled_paragraphs() {
        let mut nodes = parse_fragment("<h2>Sub</h2><h6>Tiny</h6><header>x</header>");
        convert(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            concat!(
                r#"<p style="font-size:20px;font-weight:600;margin:16px 0 8px;">Sub</p>"#,
                r#"<p style="font-size:14px;font-weight:600;margin:10px 0 8px;">Tiny</p>"#,
                "<header>x</header>"
            )
        );
    }

    #[test]
    fn template_color_survives_and_defaults_fill_gaps() {
        let mut nodes = parse_fragment("<h1>Title</h1>");
        annotate(&mut nodes);
        inline_styles(&mut nodes, ".wechat-article-title { color: purple; font-size: 30px }")
            .expect("inline");
        convert(&mut nodes);
        let p = nodes[0].as_element().expect("paragraph");
        assert_eq!(p.name, "p");
        assert_eq!(
            p.attr("style"),
            Some("font-weight:600;margin:16px 0 8px;color:purple;font-size:30px;")
        );
    }
}
