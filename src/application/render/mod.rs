//! Rendering pipeline: markdown to annotated article HTML, and article HTML
//! plus template CSS to the inline-styled dialect the target editor accepts.
//!
//! Every stage works on an owned [`dom::Node`] tree built for the call; nothing
//! is shared between runs except the lazily initialised markdown renderer.

pub mod annotate;
pub mod css;
pub mod dom;
pub mod inline;
pub mod markdown;
mod pipeline;
pub mod sanitize;
pub mod scope;
pub mod style;
pub mod transform;
mod types;

pub use pipeline::{
    ClassAnnotatorHook, ComrakRenderService, RenderConfigError, RenderPipelineConfig,
    configure_render_service, render_service,
};
pub use scope::ScopePrefix;
pub use types::{ImageSource, RenderError, RenderOutput, RenderRequest, RenderService};
