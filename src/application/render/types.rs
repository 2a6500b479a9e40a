use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering request passed into the markdown pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Source markdown captured from the editor or a file.
    pub markdown: String,
    /// Resolve `local://` image references into data URLs while rendering.
    #[serde(default = "default_resolve_images")]
    pub resolve_images: bool,
}

fn default_resolve_images() -> bool {
    true
}

impl RenderRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            resolve_images: true,
        }
    }

    /// Keep `local://` references untouched, e.g. when the output is persisted.
    pub fn without_image_resolution(mut self) -> Self {
        self.resolve_images = false;
        self
    }
}

/// Annotated article HTML produced by the markdown pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Article root (`div.markdown-body.wechat-article`) with role classes applied.
    pub html: String,
    pub contains_code: bool,
    pub image_references: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("markdown parsing failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("stylesheet rejected: {message}")]
    Stylesheet { message: String },
    #[error("html processing failed: {message}")]
    Html { message: String },
}

impl RenderError {
    pub fn stylesheet(message: impl Into<String>) -> Self {
        Self::Stylesheet {
            message: message.into(),
        }
    }

    pub fn html(message: impl Into<String>) -> Self {
        Self::Html {
            message: message.into(),
        }
    }
}

/// Trait exposed by the markdown pipeline. Implementations must be pure and
/// deterministic: given the same input, they return identical outputs or errors.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RenderError>;
}

/// Lookup used to turn `local://<id>` references into embeddable data URLs.
/// Missing ids yield `None`; implementations never fail.
pub trait ImageSource: Send + Sync {
    fn get_stored_image_data_url(&self, id: &str) -> Option<String>;
}
