//! Built-in template catalogue.
//!
//! Every built-in shares one rule skeleton and differs only in its palette.
//! Selectors are relative to the article; the template service scopes them
//! under the configured preview prefix.

use super::entities::{BUILTIN_TEMPLATE_PREFIX, Template};

pub const DEFAULT_BUILTIN_ID: &str = "builtin-wechat-green";

struct Palette {
    slug: &'static str,
    name: &'static str,
    accent: &'static str,
    text: &'static str,
    soft_background: &'static str,
    code_color: &'static str,
    line_height: &'static str,
}

const PALETTES: [Palette; 6] = [
    Palette {
        slug: "wechat-green",
        name: "WeChat Green",
        accent: "#07c160",
        text: "#333",
        soft_background: "#f7f7f7",
        code_color: "#e83e8c",
        line_height: "1.8",
    },
    Palette {
        slug: "minimal-blue",
        name: "Minimal Blue",
        accent: "#1e6fd9",
        text: "#2c3e50",
        soft_background: "#f3f7fc",
        code_color: "#1e6fd9",
        line_height: "1.75",
    },
    Palette {
        slug: "lively-orange",
        name: "Lively Orange",
        accent: "#ff7a45",
        text: "#3d3d3d",
        soft_background: "#fff7f0",
        code_color: "#d4380d",
        line_height: "1.8",
    },
    Palette {
        slug: "elegant-purple",
        name: "Elegant Purple",
        accent: "#8e44ad",
        text: "#3b3b3b",
        soft_background: "#f8f3fb",
        code_color: "#8e44ad",
        line_height: "1.85",
    },
    Palette {
        slug: "science-purple",
        name: "Science Purple",
        accent: "#6c5ce7",
        text: "#2d3436",
        soft_background: "#f1f0fe",
        code_color: "#a29bfe",
        line_height: "1.75",
    },
    Palette {
        slug: "modern-purple",
        name: "Modern Purple",
        accent: "#7b61ff",
        text: "#1f1f1f",
        soft_background: "#f5f3ff",
        code_color: "#7b61ff",
        line_height: "1.8",
    },
];

fn palette_css(p: &Palette) -> String {
    let rules = [
        (
            ".wechat-article",
            format!("font-size: 16px; line-height: {}; color: {};", p.line_height, p.text),
        ),
        (
            ".wechat-article-title",
            format!(
                "font-size: 24px; font-weight: 600; color: {}; margin: 24px 0 16px; line-height: 1.4; text-align: center;",
                p.accent
            ),
        ),
        (
            ".wechat-article-h2",
            format!(
                "font-size: 20px; font-weight: 600; color: {0}; margin: 20px 0 12px; padding-bottom: 6px; border-bottom: 1px solid {0};",
                p.accent
            ),
        ),
        (
            ".wechat-article-h3",
            format!(
                "font-size: 18px; font-weight: 600; color: {}; margin: 16px 0 10px; padding-left: 8px; border-left: 3px solid {};",
                p.text, p.accent
            ),
        ),
        (
            ".wechat-article-paragraph",
            "margin: 12px 0; text-align: justify;".to_string(),
        ),
        (
            ".wechat-article-blockquote",
            format!(
                "border-left: 3px solid {}; padding: 10px 15px; margin: 16px 0; background: {}; color: #666;",
                p.accent, p.soft_background
            ),
        ),
        (
            ".wechat-article-list",
            "margin: 12px 0; padding-left: 24px;".to_string(),
        ),
        (".wechat-article-list-item", "margin: 8px 0;".to_string()),
        (
            ".wechat-article-code",
            format!(
                "background: {}; color: {}; padding: 2px 6px; border-radius: 3px; font-size: 14px;",
                p.soft_background, p.code_color
            ),
        ),
        (
            "pre.wechat-article-code-block",
            format!(
                "background: {}; padding: 14px 10px; border-radius: 4px; line-height: 1.6;",
                p.soft_background
            ),
        ),
        (
            ".wechat-article-table",
            "border-collapse: collapse; width: 100%;".to_string(),
        ),
        (
            ".wechat-article-th",
            format!(
                "background: {}; color: {}; font-weight: 600; border: 1px solid #e0e0e0; padding: 8px;",
                p.soft_background, p.accent
            ),
        ),
        (
            ".wechat-article-td",
            "border: 1px solid #e0e0e0; padding: 8px;".to_string(),
        ),
        (
            ".wechat-article-hr",
            format!("border: none; border-top: 1px solid {}; margin: 24px 0;", p.accent),
        ),
        ("a", format!("color: {}; text-decoration: none;", p.accent)),
        ("strong", format!("color: {};", p.accent)),
    ];

    rules
        .iter()
        .map(|(selector, body)| format!("{selector} {{ {body} }}\n"))
        .collect()
}

/// The immutable built-in templates, default first.
pub fn builtin_templates() -> Vec<Template> {
    PALETTES
        .iter()
        .map(|palette| {
            let id = format!("{BUILTIN_TEMPLATE_PREFIX}{}", palette.slug);
            Template {
                is_default: id == DEFAULT_BUILTIN_ID,
                id,
                name: palette.name.to_string(),
                css: palette_css(palette),
                created_at: 0,
                updated_at: 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_has_one_default_and_reserved_ids() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 6);
        assert_eq!(templates.iter().filter(|t| t.is_default).count(), 1);
        assert_eq!(templates[0].id, DEFAULT_BUILTIN_ID);
        assert!(templates.iter().all(Template::is_builtin));
    }

    #[test]
    fn rules_are_article_relative() {
        for template in builtin_templates() {
            for line in template.css.lines() {
                assert!(!line.starts_with(' '), "{line}");
                assert!(!line.contains("markdown-body"), "{line}");
            }
        }
    }

    #[test]
    fn palettes_differ() {
        let templates = builtin_templates();
        assert!(templates[0].css.contains("#07c160"));
        assert!(templates[5].css.contains("#7b61ff"));
        assert_ne!(templates[1].css, templates[2].css);
    }
}
