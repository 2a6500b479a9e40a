//! Export orchestration: markdown plus a template to the three output flavors.

use std::{fmt, str::FromStr, sync::Arc};

use thiserror::Error;
use tracing::{info, warn};

use crate::application::render::{
    RenderError, RenderRequest, RenderService, ScopePrefix,
    annotate::{ARTICLE_CLASS, annotate, is_article_root},
    dom::{Element, Node, parse_fragment, serialize, walk_elements_mut},
    inline::inline_styles,
    sanitize::sanitize,
    scope::unscope,
    style::merge_style,
    transform,
};
use crate::application::templates::{TemplateError, TemplateService};
use crate::domain::entities::Template;
use crate::infra::clipboard::{ClipboardError, ClipboardPayload, ClipboardWriter};

/// Baseline typography merged under whatever the template put on the root.
pub const BASELINE_STYLE: &str = "font-size:16px;color:#333;line-height:1.75;word-break:break-word;text-align:left;font-family:-apple-system,BlinkMacSystemFont,\"Helvetica Neue\",\"PingFang SC\",\"Microsoft YaHei\",sans-serif;";

const NO_TEMPLATE_CSS: &str = "/* no template selected */";
const DEFAULT_TITLE: &str = "Article";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no content to copy")]
    EmptyOutput,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("copy failed, retry: {0}")]
    Clipboard(#[from] ClipboardError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Annotated article markup with its role classes, no CSS applied.
    ContentOnly,
    /// A standalone HTML document embedding the template stylesheet.
    FullDocument,
    /// Inline-styled, whitelisted markup ready to paste into the target editor.
    #[default]
    TargetOptimized,
}

impl ExportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportMode::ContentOnly => "content",
            ExportMode::FullDocument => "full",
            ExportMode::TargetOptimized => "target",
        }
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown export mode `{0}` (expected content, full or target)")]
pub struct ParseExportModeError(String);

impl FromStr for ExportMode {
    type Err = ParseExportModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(ExportMode::ContentOnly),
            "full" => Ok(ExportMode::FullDocument),
            "target" => Ok(ExportMode::TargetOptimized),
            other => Err(ParseExportModeError(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct ExportService {
    templates: TemplateService,
    renderer: Arc<dyn RenderService>,
}

impl ExportService {
    pub fn new(templates: TemplateService, renderer: Arc<dyn RenderService>) -> Self {
        Self {
            templates,
            renderer,
        }
    }

    /// Render `markdown` and wrap it for `mode`, styled by `template_id` or
    /// the default template.
    pub fn export_as(
        &self,
        mode: ExportMode,
        markdown: &str,
        template_id: Option<&str>,
    ) -> Result<String, ExportError> {
        // Read once; later template edits cannot affect this run.
        let template = self.resolve_template(template_id)?;
        let rendered = self.renderer.render(&RenderRequest::new(markdown))?;
        let css = template.as_ref().map(|template| template.css.as_str());

        let html = match mode {
            ExportMode::ContentOnly => rendered.html,
            ExportMode::FullDocument => {
                full_document(&rendered.html, css, self.templates.prefix())
            }
            ExportMode::TargetOptimized => {
                optimize_for_target(&rendered.html, css.unwrap_or_default(), self.templates.prefix())?
            }
        };

        info!(
            target = "application::export",
            op = "export::export_as",
            result = "ok",
            mode = %mode,
            template_id = template.as_ref().map(|t| t.id.as_str()).unwrap_or("none"),
            bytes = html.len(),
            "export finished"
        );
        Ok(html)
    }

    /// Scoped CSS for the live preview, if any template applies.
    pub fn preview_css(&self, template_id: Option<&str>) -> Result<Option<String>, ExportError> {
        Ok(self.resolve_template(template_id)?.map(|template| template.css))
    }

    fn resolve_template(&self, template_id: Option<&str>) -> Result<Option<Template>, ExportError> {
        if let Some(id) = template_id {
            if let Some(template) = self.templates.get_by_id(id)? {
                return Ok(Some(template));
            }
            warn!(
                target = "application::export",
                op = "export::resolve_template",
                result = "fallback",
                template_id = %id,
                "template not found; using the default"
            );
        }
        Ok(self.templates.get_default()?)
    }
}

/// Put `html` on the clipboard, as both the rich and the plain flavor.
pub fn copy_to_target(html: &str, clipboard: &dyn ClipboardWriter) -> Result<(), ExportError> {
    if html.trim().is_empty() {
        return Err(ExportError::EmptyOutput);
    }
    let payload = ClipboardPayload {
        html: html.to_string(),
        plain: html.to_string(),
    };
    clipboard.write(&payload)?;
    Ok(())
}

/// Standalone document: the template CSS travels as-is in a `<style>` block
/// and the article sits inside the scope container so the selectors match.
pub fn full_document(html: &str, css: Option<&str>, prefix: &ScopePrefix) -> String {
    let css = css
        .map(str::trim)
        .filter(|css| !css.is_empty())
        .unwrap_or(NO_TEMPLATE_CSS);
    let title = document_title(html);
    let container = prefix.container();

    format!(
        "<!DOCTYPE html>\n\
<html lang=\"zh-CN\">\n\
<head>\n  \
<meta charset=\"UTF-8\">\n  \
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
<title>{title}</title>\n  \
<style>\n{css}\n  </style>\n\
</head>\n\
<body>\n\
<div class=\"{container}\">\n{html}\n</div>\n\
</body>\n\
</html>\n"
    )
}

fn document_title(html: &str) -> String {
    fn first_heading(nodes: &[Node]) -> Option<String> {
        nodes.iter().filter_map(Node::as_element).find_map(|element| {
            if element.is("h1") {
                let text = element.text_content();
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            } else {
                first_heading(&element.children)
            }
        })
    }

    let title = first_heading(&parse_fragment(html)).unwrap_or_else(|| DEFAULT_TITLE.to_string());
    serialize(&[Node::text(title)])
}

/// Turn article markup plus scoped template CSS into the inline-styled,
/// whitelisted dialect the target editor keeps intact.
///
/// Interior failures degrade to the best partial result; only an output with
/// neither text nor images is an error.
pub fn optimize_for_target(
    html: &str,
    scoped_css: &str,
    prefix: &ScopePrefix,
) -> Result<String, ExportError> {
    let root = take_article_root(parse_fragment(html), prefix);
    let mut nodes = vec![Node::Element(root)];
    annotate(&mut nodes);

    let css = unscope(scoped_css, prefix);
    if let Err(err) = inline_styles(&mut nodes, &css) {
        warn!(
            target = "application::export",
            op = "export::inline",
            result = "passthrough",
            error = %err,
            "stylesheet could not be inlined; exporting without template styles"
        );
    }

    transform::apply_all(&mut nodes);

    let Some(Node::Element(mut root)) = nodes.pop() else {
        return Err(ExportError::EmptyOutput);
    };
    root.children = sanitize(std::mem::take(&mut root.children));
    root.name = "section".to_string();
    merge_style(&mut root, BASELINE_STYLE);
    strip_selectors(&mut root);

    if !root.has_text() && !root.any_descendant(&|element: &Element| element.is("img")) {
        warn!(
            target = "application::export",
            op = "export::optimize_for_target",
            result = "empty",
            "export produced no visible content"
        );
        return Err(ExportError::EmptyOutput);
    }

    Ok(root.to_html())
}

/// The first article root in document order, or a fresh one wrapping `nodes`.
fn take_article_root(nodes: Vec<Node>, prefix: &ScopePrefix) -> Element {
    fn find(nodes: &[Node]) -> Option<&Element> {
        nodes.iter().filter_map(Node::as_element).find_map(|element| {
            if is_article_root(element) {
                Some(element)
            } else {
                find(&element.children)
            }
        })
    }

    match find(&nodes) {
        Some(root) => root.clone(),
        None => Element::new("div")
            .with_attr("class", format!("{} {ARTICLE_CLASS}", prefix.content_root()))
            .with_children(nodes),
    }
}

fn strip_selectors(root: &mut Element) {
    let mut strip = |element: &mut Element| {
        element.retain_attrs(|name| name != "class" && name != "id" && !name.starts_with("data-"));
    };
    strip(root);
    walk_elements_mut(&mut root.children, &mut strip);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::application::render::{ComrakRenderService, RenderPipelineConfig};
    use crate::application::templates::CreateTemplateCommand;
    use crate::infra::store::JsonFileStore;

    fn service() -> (TempDir, ExportService) {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(JsonFileStore::new(dir.path()));
        let templates = TemplateService::new(store, ScopePrefix::default());
        let renderer = Arc::new(ComrakRenderService::with_config(
            &RenderPipelineConfig::default(),
        ));
        (dir, ExportService::new(templates, renderer))
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ClipboardPayload>>);

    impl ClipboardWriter for Recorder {
        fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
            self.0.lock().expect("lock").push(payload.clone());
            Ok(())
        }
    }

    #[test]
    fn modes_parse_and_display() {
        assert_eq!("full".parse::<ExportMode>().expect("full"), ExportMode::FullDocument);
        assert_eq!(" Target ".parse::<ExportMode>().expect("target"), ExportMode::TargetOptimized);
        assert_eq!(ExportMode::ContentOnly.to_string(), "content");
        assert!("pdf".parse::<ExportMode>().is_err());
    }

    #[test]
    fn content_only_keeps_role_classes() {
        let (_dir, service) = service();
        let html = service
            .export_as(ExportMode::ContentOnly, "## Section", None)
            .expect("export");
        assert!(html.contains(r#"class="wechat-article-h2""#));
        assert!(!html.contains("style="));
    }

    #[test]
    fn full_document_embeds_template_css() {
        let (_dir, service) = service();
        let html = service
            .export_as(ExportMode::FullDocument, "# Hello & welcome\n\ntext", None)
            .expect("export");
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"zh-CN\">"));
        assert!(html.contains("<title>Hello &amp; welcome</title>"));
        assert!(html.contains(".preview-container .markdown-body"));
        assert!(html.contains("<div class=\"preview-container\">\n<div class=\"markdown-body wechat-article\">"));
    }

    #[test]
    fn full_document_without_css_says_so() {
        let html = full_document("<p>x</p>", None, &ScopePrefix::default());
        assert!(html.contains("/* no template selected */"));
        assert!(html.contains("<title>Article</title>"));
    }

    #[test]
    fn target_output_is_an_inline_styled_section() {
        let (_dir, service) = service();
        let html = service
            .export_as(ExportMode::TargetOptimized, "# Title\n\nSome *text*.", None)
            .expect("export");
        assert!(html.starts_with("<section style=\""));
        assert!(html.contains("word-break:break-word;"));
        assert!(html.contains("font-size:16px;"));
        assert!(!html.contains("class="));
        assert!(html.contains("Title"));
        assert!(html.contains("<em"));
    }

    #[test]
    fn template_values_beat_the_baseline() {
        let html = optimize_for_target(
            r#"<div class="markdown-body"><p>x</p></div>"#,
            ".preview-container .markdown-body.wechat-article { color: #111; }",
            &ScopePrefix::default(),
        )
        .expect("export");
        assert!(html.starts_with("<section style=\"font-size:16px;"));
        assert!(html.contains("color:#111;"));
        assert!(!html.contains("color:#333;"));
    }

    #[test]
    fn bare_fragments_are_wrapped() {
        let html = optimize_for_target("<p>loose</p>", "", &ScopePrefix::default())
            .expect("export");
        assert!(html.starts_with("<section style="));
        assert!(html.ends_with("</section>"));
        assert!(html.contains("loose"));
    }

    #[test]
    fn broken_css_degrades_to_unstyled_output() {
        let html = optimize_for_target(
            r#"<div class="markdown-body"><p>still here</p></div>"#,
            ".preview-container .markdown-body p { color: red;",
            &ScopePrefix::default(),
        )
        .expect("export");
        assert!(html.contains("still here"));
        assert!(!html.contains("color:red"));
    }

    #[test]
    fn empty_output_is_rejected() {
        let err = optimize_for_target(
            r#"<div class="markdown-body"><p>  </p><script>x()</script></div>"#,
            "",
            &ScopePrefix::default(),
        )
        .expect_err("empty");
        assert!(matches!(err, ExportError::EmptyOutput));
    }

    #[test]
    fn image_only_output_is_accepted() {
        let html = optimize_for_target(
            r#"<div class="markdown-body"><p><img src="data:image/png;base64,AA" alt=""></p></div>"#,
            "",
            &ScopePrefix::default(),
        )
        .expect("export");
        assert!(html.contains("<img src=\"data:image/png;base64,AA\""));
    }

    #[test]
    fn unknown_template_falls_back_to_default() {
        let (_dir, service) = service();
        let custom = service
            .templates
            .create(CreateTemplateCommand {
                name: "Mine".into(),
                css: "p { color: red; }".into(),
            })
            .expect("create");

        let chosen = service.preview_css(Some(&custom.id)).expect("css").expect("some");
        assert!(chosen.contains("color: red"));

        let fallback = service.preview_css(Some("template-gone")).expect("css").expect("some");
        assert!(!fallback.contains("color: red"));
    }

    #[test]
    fn copy_sends_html_as_both_flavors() {
        let recorder = Recorder::default();
        copy_to_target("<section>hi</section>", &recorder).expect("copy");
        let payloads = recorder.0.lock().expect("lock").clone();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].html, payloads[0].plain);

        assert!(matches!(
            copy_to_target("   ", &recorder),
            Err(ExportError::EmptyOutput)
        ));
    }
}
