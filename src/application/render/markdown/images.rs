use std::sync::Arc;

use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::warn;
use url::Url;

use crate::application::render::types::{ImageSource, RenderError};

use super::FinalizeHook;

pub const LOCAL_SCHEME: &str = "local";

/// Image id of a `local://<id>` reference.
pub fn local_image_id(src: &str) -> Option<String> {
    let url = Url::parse(src.trim()).ok()?;
    if url.scheme() != LOCAL_SCHEME {
        return None;
    }
    url.host_str()
        .map(str::to_string)
        .filter(|id| !id.is_empty())
}

/// Rewrites `img[src^="local://"]` to data URLs from an [`ImageSource`].
/// References that cannot be resolved are left in place.
pub struct LocalImageResolver {
    source: Arc<dyn ImageSource>,
}

impl LocalImageResolver {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        Self { source }
    }
}

impl FinalizeHook for LocalImageResolver {
    fn name(&self) -> &'static str {
        "local_images"
    }

    fn finalize(&self, html: &str) -> Result<String, RenderError> {
        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!(r#"img[src^="local://"]"#, |el| {
                    let Some(src) = el.get_attribute("src") else {
                        return Ok(());
                    };
                    let Some(id) = local_image_id(&src) else {
                        return Ok(());
                    };
                    match self.source.get_stored_image_data_url(&id) {
                        Some(data_url) => el.set_attribute("src", &data_url)?,
                        None => warn!(
                            target = "application::render::images",
                            op = "images::resolve",
                            result = "missing",
                            image_id = %id,
                            "local image reference could not be resolved"
                        ),
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| RenderError::html(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneImage;

    impl ImageSource for OneImage {
        fn get_stored_image_data_url(&self, id: &str) -> Option<String> {
            (id == "img-1").then(|| "data:image/png;base64,AAAA".to_string())
        }
    }

    #[test]
    fn local_ids_are_extracted() {
        assert_eq!(local_image_id("local://img-1").as_deref(), Some("img-1"));
        assert_eq!(local_image_id("https://example.com/a.png"), None);
        assert_eq!(local_image_id("local://"), None);
    }

    #[test]
    fn known_images_are_inlined_and_unknown_are_kept() {
        let resolver = LocalImageResolver::new(Arc::new(OneImage));
        let html = resolver
            .finalize(r#"<p><img src="local://img-1" alt="a"><img src="local://img-2"><img src="x.png"></p>"#)
            .expect("rewrite");
        assert_eq!(
            html,
            r#"<p><img src="data:image/png;base64,AAAA" alt="a"><img src="local://img-2"><img src="x.png"></p>"#
        );
    }
}
