use syntect::{
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::application::render::types::RenderError;

/// Highlight a fenced block into `<pre><code>` with class-tagged spans.
///
/// The text content of the result equals `code` (plus a final newline when it
/// had none), so later steps can recover the source lines from the tree.
pub(crate) fn highlight_code(
    language: Option<&str>,
    code: &str,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<String, RenderError> {
    let lang_token = language.unwrap_or("text");
    let syntax =
        find_syntax(syntax_set, lang_token).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let mut code_with_newline = code.to_string();
    if !code_with_newline.ends_with('\n') {
        code_with_newline.push('\n');
    }

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, *class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| RenderError::Highlighting {
                language: lang_token.to_string(),
                message: err.to_string(),
            })?;
    }

    let highlighted = generator.finalize();
    let lang = ammonia::clean_text(&lang_token.to_ascii_lowercase());
    Ok(format!(
        "<pre data-language=\"{lang}\"><code class=\"hljs language-{lang}\">{highlighted}</code></pre>"
    ))
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(&lowercase))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::dom::parse_fragment;

    fn syntax_and_style() -> (SyntaxSet, ClassStyle) {
        (
            SyntaxSet::load_defaults_newlines(),
            ClassStyle::SpacedPrefixed { prefix: "hljs-" },
        )
    }

    #[test]
    fn highlighted_text_matches_source() {
        let (syntax_set, class_style) = syntax_and_style();
        let source = "fn main() {\n    println!(\"<hi>\");\n}\n";
        let html = highlight_code(Some("Rust"), source, &syntax_set, &class_style).expect("html");

        assert!(html.starts_with("<pre data-language=\"rust\"><code class=\"hljs language-rust\">"));
        assert!(html.contains("hljs-"));
        let nodes = parse_fragment(&html);
        assert_eq!(nodes[0].text_content(), source);
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let (syntax_set, class_style) = syntax_and_style();
        let html = highlight_code(Some("nope"), "a < b", &syntax_set, &class_style).expect("html");
        assert!(html.contains("a &lt; b"));
    }
}
