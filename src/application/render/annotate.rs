//! Role-class annotation for rendered article markup.

use super::dom::{Element, Node};

/// Class carried by the article root.
pub const ARTICLE_CLASS: &str = "wechat-article";
/// Class the markdown renderer puts on its content root.
pub const CONTENT_ROOT_CLASS: &str = "markdown-body";
pub const CODE_BLOCK_CLASS: &str = "wechat-article-code-block";

/// Role class for a tag, if it has one. `pre` needs a content check first.
fn role_class(tag: &str) -> Option<&'static str> {
    let class = match tag {
        "h1" => "wechat-article-title",
        "h2" => "wechat-article-h2",
        "h3" => "wechat-article-h3",
        "p" => "wechat-article-paragraph",
        "blockquote" => "wechat-article-blockquote",
        "ul" | "ol" => "wechat-article-list",
        "li" => "wechat-article-list-item",
        "table" => "wechat-article-table",
        "th" => "wechat-article-th",
        "td" => "wechat-article-td",
        "code" => "wechat-article-code",
        "pre" => CODE_BLOCK_CLASS,
        "hr" => "wechat-article-hr",
        _ => return None,
    };
    Some(class)
}

/// Extend every element's class list with its role class. Running this twice
/// leaves the tree unchanged.
pub fn annotate(nodes: &mut [Node]) {
    for node in nodes {
        if let Node::Element(element) = node {
            annotate_element(element);
        }
    }
}

fn annotate_element(element: &mut Element) {
    let tag = element.name.to_ascii_lowercase();
    if let Some(class) = role_class(&tag) {
        if tag != "pre" || is_code_block(element) {
            element.add_class(class);
        }
    }

    if is_article_root(element) {
        element.add_class(ARTICLE_CLASS);
    }

    annotate(&mut element.children);
}

fn is_code_block(pre: &Element) -> bool {
    pre.any_descendant(&|child: &Element| child.is("code")) || pre.has_text()
}

/// The renderer's content wrapper, or an element already marked as the article.
pub fn is_article_root(element: &Element) -> bool {
    element.has_class(ARTICLE_CLASS) || (element.is("div") && element.has_class(CONTENT_ROOT_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::dom::{parse_fragment, serialize};

    #[test]
    fn tags_receive_role_classes() {
        let mut nodes = parse_fragment(
            r#"<div class="markdown-body"><h1>T</h1><p class="lead">x</p><ul><li>a</li></ul><pre><code>c</code></pre><hr></div>"#,
        );
        annotate(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            concat!(
                r#"<div class="markdown-body wechat-article">"#,
                r#"<h1 class="wechat-article-title">T</h1>"#,
                r#"<p class="lead wechat-article-paragraph">x</p>"#,
                r#"<ul class="wechat-article-list"><li class="wechat-article-list-item">a</li></ul>"#,
                r#"<pre class="wechat-article-code-block"><code class="wechat-article-code">c</code></pre>"#,
                r#"<hr class="wechat-article-hr">"#,
                "</div>"
            )
        );
    }

    #[test]
    fn annotation_is_idempotent() {
        let mut once = parse_fragment("<h2>a</h2><table><tr><th>h</th><td>d</td></tr></table>");
        annotate(&mut once);
        let mut twice = once.clone();
        annotate(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_pre_is_not_a_code_block() {
        let mut nodes = parse_fragment("<pre>  </pre><pre>text</pre>");
        annotate(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<pre>  </pre><pre class="wechat-article-code-block">text</pre>"#
        );
    }
}
