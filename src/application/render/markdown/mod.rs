//! Markdown collaborator: comrak with GFM extensions, syntect highlighting and
//! an ammonia pass over the produced HTML.
//!
//! Two hook kinds let the export pipeline plug into rendering. Tree hooks see
//! the parsed article before it is serialized (the class annotator is one);
//! finalize hooks rewrite the serialized HTML (the `local://` image resolver).

mod highlight;
mod images;
mod options;

use std::sync::Arc;

use comrak::{
    Arena, format_html,
    nodes::{AstNode, NodeHtmlBlock, NodeValue},
    parse_document,
};
use once_cell::sync::Lazy;
use syntect::{html::ClassStyle, parsing::SyntaxSet};

use super::{dom::Node, types::RenderError};

pub use images::{LOCAL_SCHEME, LocalImageResolver, local_image_id};

/// Runs on the parsed article tree, before serialization.
pub trait TreeHook: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, nodes: &mut Vec<Node>);
}

/// Runs on the final HTML string.
pub trait FinalizeHook: Send + Sync {
    fn name(&self) -> &'static str;
    fn finalize(&self, html: &str) -> Result<String, RenderError>;
}

/// HTML fragment produced from markdown, not yet wrapped in an article root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownHtml {
    pub html: String,
    pub contains_code: bool,
}

pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
    sanitizer: ammonia::Builder<'static>,
}

impl MarkdownRenderer {
    fn new() -> Self {
        Self {
            options: options::default_options(),
            syntax_set: SyntaxSet::load_defaults_newlines(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "hljs-" },
            sanitizer: options::build_sanitizer(),
        }
    }

    pub fn to_html(&self, markdown: &str) -> Result<MarkdownHtml, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let contains_code = highlight_stage(root, &self.syntax_set, &self.class_style)?;
        let rendered = render_html_stage(root, &self.options)?;
        let html = self.sanitizer.clean(&rendered).to_string();

        Ok(MarkdownHtml {
            html,
            contains_code,
        })
    }
}

static MARKDOWN_RENDERER: Lazy<Arc<MarkdownRenderer>> =
    Lazy::new(|| Arc::new(MarkdownRenderer::new()));

/// Shared renderer; loading the syntax set is the expensive part.
pub fn markdown_renderer() -> Arc<MarkdownRenderer> {
    Arc::clone(&MARKDOWN_RENDERER)
}

/// Replace fenced code blocks with highlighted HTML. Returns whether any were found.
fn highlight_stage<'a>(
    node: &'a AstNode<'a>,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> Result<bool, RenderError> {
    let mut contains_code = false;

    if let Some((info, literal)) = extract_code_block(node) {
        let language = info.split_whitespace().next();
        let html = highlight::highlight_code(language, &literal, syntax_set, class_style)?;
        let mut data = node.data.borrow_mut();
        data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal: html,
        });
        contains_code = true;
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        contains_code |= highlight_stage(next, syntax_set, class_style)?;
        child = next.next_sibling();
    }

    Ok(contains_code)
}

fn extract_code_block(node: &AstNode<'_>) -> Option<(String, String)> {
    let data = node.data.borrow();
    if let NodeValue::CodeBlock(block) = &data.value {
        Some((block.info.trim().to_string(), block.literal.clone()))
    } else {
        None
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}
