use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::render::ImageSource;
use crate::application::repos::{ImagesRepo, RepoError};
use crate::domain::{
    entities::{IMAGE_PREFIX, MAX_IMAGE_BYTES, MAX_TOTAL_IMAGE_BYTES, StoredImage, timestamp_now},
    error::DomainError,
};

const FALLBACK_MIME: &str = "image/png";
const LOCAL_REFERENCE: &str = "local://";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct AddImageCommand {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Explicit MIME type; otherwise guessed from `name`.
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageStats {
    pub count: usize,
    pub total_bytes: u64,
    pub max_total_bytes: u64,
}

#[derive(Clone)]
pub struct ImageService {
    repo: Arc<dyn ImagesRepo>,
}

impl ImageService {
    pub fn new(repo: Arc<dyn ImagesRepo>) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<StoredImage>, ImageError> {
        self.repo.list_images().map_err(ImageError::from)
    }

    pub fn add(&self, command: AddImageCommand) -> Result<StoredImage, ImageError> {
        let size = command.bytes.len() as u64;
        if size == 0 {
            return Err(DomainError::validation("image is empty").into());
        }
        if size > MAX_IMAGE_BYTES {
            return Err(DomainError::limit(
                "image",
                format!("images may not exceed {} MiB", MAX_IMAGE_BYTES / 1024 / 1024),
            )
            .into());
        }

        let stats = self.stats()?;
        if stats.total_bytes + size > MAX_TOTAL_IMAGE_BYTES {
            return Err(DomainError::limit(
                "image storage",
                "not enough space left; delete some images first",
            )
            .into());
        }

        let id = format!("{IMAGE_PREFIX}{}", Uuid::new_v4());
        let name = match command.name.trim() {
            "" => format!("image-{id}.png"),
            name => name.to_string(),
        };
        let image = StoredImage {
            mime_type: resolve_mime(command.mime_type.as_deref(), &name),
            data: STANDARD.encode(&command.bytes),
            id,
            name,
            size,
            created_at: timestamp_now(),
        };
        self.repo.insert_image(&image)?;

        info!(
            target = "application::images",
            op = "images::add",
            result = "ok",
            image_id = %image.id,
            size = image.size,
            mime = %image.mime_type,
            "image stored"
        );
        Ok(image)
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredImage>, ImageError> {
        self.repo.find_image(id).map_err(ImageError::from)
    }

    pub fn data_url(&self, id: &str) -> Result<Option<String>, ImageError> {
        Ok(self.get(id)?.map(|image| image.data_url()))
    }

    pub fn delete(&self, id: &str) -> Result<(), ImageError> {
        if !self.repo.delete_image(id)? {
            return Err(DomainError::not_found("image", id).into());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ImageError> {
        self.repo.clear_images().map_err(ImageError::from)
    }

    pub fn stats(&self) -> Result<ImageStats, ImageError> {
        let images = self.repo.list_images()?;
        Ok(ImageStats {
            count: images.len(),
            total_bytes: images.iter().map(|image| image.size).sum(),
            max_total_bytes: MAX_TOTAL_IMAGE_BYTES,
        })
    }
}

impl ImageSource for ImageService {
    fn get_stored_image_data_url(&self, id: &str) -> Option<String> {
        match self.data_url(id) {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    target = "application::images",
                    op = "images::data_url",
                    result = "error",
                    image_id = %id,
                    error = %err,
                    "image lookup failed"
                );
                None
            }
        }
    }
}

/// Ids of every `![alt](local://<id>)` reference in `markdown`, in order.
pub fn referenced_ids(markdown: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = markdown;
    while let Some(start) = rest.find("![") {
        let after_alt = &rest[start + 2..];
        let Some(close) = after_alt.find("](") else {
            break;
        };
        let target = &after_alt[close + 2..];
        let Some(end) = target.find(')') else {
            break;
        };
        if let Some(id) = target[..end].trim().strip_prefix(LOCAL_REFERENCE) {
            let id = id.trim();
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        }
        rest = &target[end + 1..];
    }
    ids
}

fn resolve_mime(explicit: Option<&str>, name: &str) -> String {
    if let Some(mime) = explicit.map(str::trim).filter(|mime| !mime.is_empty()) {
        return mime.to_string();
    }
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}
