//! Repository traits describing persistence adapters.
//!
//! Adapters are plain CRUD over one collection each; limits, id generation and
//! pointer reassignment live in the services on top.

use thiserror::Error;

use crate::domain::entities::{Document, StoredImage, Template};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("stored {collection} data is corrupt: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn corrupt(collection: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            collection,
            message: err.to_string(),
        }
    }
}

/// Custom templates plus the default pointer. Built-ins are never stored.
pub trait TemplatesRepo: Send + Sync {
    fn list_templates(&self) -> Result<Vec<Template>, RepoError>;

    fn find_template(&self, id: &str) -> Result<Option<Template>, RepoError>;

    /// Insert or replace by id.
    fn save_template(&self, template: &Template) -> Result<(), RepoError>;

    /// Returns whether a record was removed.
    fn delete_template(&self, id: &str) -> Result<bool, RepoError>;

    fn default_template_id(&self) -> Result<Option<String>, RepoError>;

    fn set_default_template_id(&self, id: Option<&str>) -> Result<(), RepoError>;
}

pub trait DocumentsRepo: Send + Sync {
    fn list_documents(&self) -> Result<Vec<Document>, RepoError>;

    fn find_document(&self, id: &str) -> Result<Option<Document>, RepoError>;

    /// Insert or replace by id, keeping insertion order for existing records.
    fn save_document(&self, document: &Document) -> Result<(), RepoError>;

    fn delete_document(&self, id: &str) -> Result<bool, RepoError>;

    fn current_document_id(&self) -> Result<Option<String>, RepoError>;

    fn set_current_document_id(&self, id: Option<&str>) -> Result<(), RepoError>;
}

pub trait ImagesRepo: Send + Sync {
    fn list_images(&self) -> Result<Vec<StoredImage>, RepoError>;

    fn find_image(&self, id: &str) -> Result<Option<StoredImage>, RepoError>;

    fn insert_image(&self, image: &StoredImage) -> Result<(), RepoError>;

    fn delete_image(&self, id: &str) -> Result<bool, RepoError>;

    fn clear_images(&self) -> Result<(), RepoError>;
}
