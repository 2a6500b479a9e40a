use std::{fmt, sync::Arc};

use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::debug;

use super::{
    annotate::{ARTICLE_CLASS, CONTENT_ROOT_CLASS, annotate},
    dom::{Element, Node, parse_fragment, serialize, walk_elements_mut},
    markdown::{
        FinalizeHook, LocalImageResolver, MarkdownRenderer, TreeHook, local_image_id,
        markdown_renderer,
    },
    types::{ImageSource, RenderError, RenderOutput, RenderRequest, RenderService},
};

/// Tree hook that runs the class annotator during rendering.
pub struct ClassAnnotatorHook;

impl TreeHook for ClassAnnotatorHook {
    fn name(&self) -> &'static str {
        "class_annotator"
    }

    fn apply(&self, nodes: &mut Vec<Node>) {
        annotate(nodes);
    }
}

/// Markdown → annotated article HTML, with pluggable hooks.
pub struct ComrakRenderService {
    markdown: Arc<MarkdownRenderer>,
    content_root: String,
    tree_hooks: Vec<Arc<dyn TreeHook>>,
    finalize_hooks: Vec<Arc<dyn FinalizeHook>>,
}

impl ComrakRenderService {
    fn new() -> Self {
        Self::with_config(&active_render_config())
    }

    pub fn with_config(config: &RenderPipelineConfig) -> Self {
        let service = Self {
            markdown: markdown_renderer(),
            content_root: config.content_root.clone(),
            tree_hooks: vec![Arc::new(ClassAnnotatorHook)],
            finalize_hooks: Vec::new(),
        };
        match &config.image_source {
            Some(source) => service.with_image_source(Arc::clone(source)),
            None => service,
        }
    }

    pub fn with_tree_hook(mut self, hook: Arc<dyn TreeHook>) -> Self {
        self.tree_hooks.push(hook);
        self
    }

    pub fn with_finalize_hook(mut self, hook: Arc<dyn FinalizeHook>) -> Self {
        self.finalize_hooks.push(hook);
        self
    }

    /// Resolve `local://` images through `source` when requests ask for it.
    pub fn with_image_source(self, source: Arc<dyn ImageSource>) -> Self {
        self.with_finalize_hook(Arc::new(LocalImageResolver::new(source)))
    }
}

static RENDER_SERVICE: Lazy<Arc<ComrakRenderService>> =
    Lazy::new(|| Arc::new(ComrakRenderService::new()));

/// Access the shared render service instance, initialised on first use.
pub fn render_service() -> Arc<ComrakRenderService> {
    Arc::clone(&RENDER_SERVICE)
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError> {
        let rendered = self.markdown.to_html(&request.markdown)?;

        let mut nodes = vec![article_root(&self.content_root, parse_fragment(&rendered.html))];
        for hook in &self.tree_hooks {
            hook.apply(&mut nodes);
            debug!(target = "application::render::pipeline", hook = hook.name(), "tree hook applied");
        }

        let image_references = collect_image_references(&mut nodes);
        let mut html = serialize(&nodes);

        if request.resolve_images {
            for hook in &self.finalize_hooks {
                html = hook.finalize(&html)?;
                debug!(
                    target = "application::render::pipeline",
                    hook = hook.name(),
                    "finalize hook applied"
                );
            }
        }

        Ok(RenderOutput {
            html,
            contains_code: rendered.contains_code,
            image_references,
        })
    }
}

fn article_root(content_root: &str, children: Vec<Node>) -> Node {
    Element::new("div")
        .with_attr("class", format!("{content_root} {ARTICLE_CLASS}"))
        .with_children(children)
        .into()
}

fn collect_image_references(nodes: &mut [Node]) -> Vec<String> {
    let mut ids = Vec::new();
    walk_elements_mut(nodes, &mut |element| {
        if element.is("img") {
            if let Some(id) = element.attr("src").and_then(local_image_id) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    });
    ids
}

#[derive(Clone)]
pub struct RenderPipelineConfig {
    /// Class of the article wrapper the renderer emits.
    pub content_root: String,
    /// Store used to resolve `local://` images, if any.
    pub image_source: Option<Arc<dyn ImageSource>>,
}

impl RenderPipelineConfig {
    pub fn with_image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.image_source = Some(source);
        self
    }
}

impl fmt::Debug for RenderPipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPipelineConfig")
            .field("content_root", &self.content_root)
            .field("image_source", &self.image_source.is_some())
            .finish()
    }
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            content_root: CONTENT_ROOT_CLASS.to_string(),
            image_source: None,
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            content_root: settings.content_root.clone(),
            image_source: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Images;

    impl ImageSource for Images {
        fn get_stored_image_data_url(&self, id: &str) -> Option<String> {
            Some(format!("data:image/png;base64,{id}"))
        }
    }

    #[test]
    fn output_is_an_annotated_article() {
        let output = ComrakRenderService::with_config(&RenderPipelineConfig::default())
            .render(&RenderRequest::new("# Title\n\nBody"))
            .expect("render");
        assert!(output.html.starts_with(r#"<div class="markdown-body wechat-article">"#));
        assert!(output.html.contains(r#"<h1 class="wechat-article-title">Title</h1>"#));
        assert!(output.html.contains(r#"<p class="wechat-article-paragraph">Body</p>"#));
    }

    #[test]
    fn image_references_are_reported_and_resolved_on_request() {
        let service = ComrakRenderService::with_config(&RenderPipelineConfig::default())
            .with_image_source(Arc::new(Images));
        let markdown = "![a](local://img-1) ![b](local://img-1) ![c](local://img-2)";

        let resolved = service.render(&RenderRequest::new(markdown)).expect("render");
        assert_eq!(resolved.image_references, vec!["img-1", "img-2"]);
        assert!(resolved.html.contains("data:image/png;base64,img-2"));

        let kept = service
            .render(&RenderRequest::new(markdown).without_image_resolution())
            .expect("render");
        assert!(kept.html.contains(r#"src="local://img-1""#));
    }

    #[test]
    fn configured_image_source_is_wired_in() {
        let config = RenderPipelineConfig {
            content_root: "article-body".to_string(),
            ..RenderPipelineConfig::default()
        }
        .with_image_source(Arc::new(Images));
        let output = ComrakRenderService::with_config(&config)
            .render(&RenderRequest::new("![x](local://img-9)"))
            .expect("render");
        assert!(output.html.starts_with(r#"<div class="article-body wechat-article">"#));
        assert!(output.html.contains("data:image/png;base64,img-9"));
    }
}
