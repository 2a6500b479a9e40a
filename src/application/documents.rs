use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{DocumentsRepo, RepoError};
use crate::domain::{
    entities::{DOCUMENT_PREFIX, Document, MAX_DOCUMENTS, timestamp_now},
    error::DomainError,
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct CreateDocumentCommand {
    pub name: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone)]
pub struct DocumentService {
    repo: Arc<dyn DocumentsRepo>,
}

impl DocumentService {
    pub fn new(repo: Arc<dyn DocumentsRepo>) -> Self {
        Self { repo }
    }

    pub fn list(&self) -> Result<Vec<Document>, DocumentError> {
        self.repo.list_documents().map_err(DocumentError::from)
    }

    pub fn get(&self, id: &str) -> Result<Option<Document>, DocumentError> {
        self.repo.find_document(id).map_err(DocumentError::from)
    }

    /// The document behind the current pointer, if it still exists.
    pub fn current(&self) -> Result<Option<Document>, DocumentError> {
        match self.repo.current_document_id()? {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }

    pub fn can_create(&self) -> Result<bool, DocumentError> {
        Ok(self.repo.list_documents()?.len() < MAX_DOCUMENTS)
    }

    /// Create a document and make it current.
    pub fn create(&self, command: CreateDocumentCommand) -> Result<Document, DocumentError> {
        let existing = self.repo.list_documents()?.len();
        if existing >= MAX_DOCUMENTS {
            return Err(DomainError::limit(
                "document",
                format!("at most {MAX_DOCUMENTS} documents can be saved; delete one first"),
            )
            .into());
        }

        let name = command
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Document {}", existing + 1));

        let now = timestamp_now();
        let document = Document {
            id: format!("{DOCUMENT_PREFIX}{}", Uuid::new_v4()),
            name,
            content: command.content.unwrap_or_default(),
            selected_template_id: None,
            created_at: now,
            updated_at: now,
        };
        self.repo.save_document(&document)?;
        self.repo.set_current_document_id(Some(&document.id))?;

        info!(
            target = "application::documents",
            op = "documents::create",
            result = "ok",
            document_id = %document.id,
            "document created"
        );
        Ok(document)
    }

    pub fn update_content(&self, id: &str, content: String) -> Result<Document, DocumentError> {
        self.modify(id, |document| {
            document.content = content;
            Ok(())
        })
    }

    pub fn rename(&self, id: &str, name: &str) -> Result<Document, DocumentError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("document name must not be empty").into());
        }
        self.modify(id, |document| {
            document.name = name.to_string();
            Ok(())
        })
    }

    pub fn set_template(
        &self,
        id: &str,
        template_id: Option<String>,
    ) -> Result<Document, DocumentError> {
        self.modify(id, |document| {
            document.selected_template_id = template_id;
            Ok(())
        })
    }

    pub fn select(&self, id: &str) -> Result<Document, DocumentError> {
        let document = self
            .get(id)?
            .ok_or_else(|| DomainError::not_found("document", id))?;
        self.repo.set_current_document_id(Some(id))?;
        Ok(document)
    }

    /// Delete a document. If it was current, the first remaining document (or
    /// none) becomes current.
    pub fn delete(&self, id: &str) -> Result<(), DocumentError> {
        if !self.repo.delete_document(id)? {
            return Err(DomainError::not_found("document", id).into());
        }

        if self.repo.current_document_id()?.as_deref() == Some(id) {
            let next = self.repo.list_documents()?.into_iter().next();
            self.repo
                .set_current_document_id(next.as_ref().map(|document| document.id.as_str()))?;
        }

        info!(
            target = "application::documents",
            op = "documents::delete",
            result = "ok",
            document_id = %id,
            "document deleted"
        );
        Ok(())
    }

    fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Document) -> Result<(), DocumentError>,
    ) -> Result<Document, DocumentError> {
        let mut document = self
            .get(id)?
            .ok_or_else(|| DomainError::not_found("document", id))?;
        change(&mut document)?;
        document.updated_at = timestamp_now();
        self.repo.save_document(&document)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::infra::store::JsonFileStore;

    fn service() -> (TempDir, DocumentService) {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(JsonFileStore::new(dir.path()));
        (dir, DocumentService::new(store))
    }

    #[test]
    fn created_documents_become_current_with_default_names() {
        let (_dir, service) = service();
        let first = service.create(CreateDocumentCommand::default()).expect("first");
        assert_eq!(first.name, "Document 1");
        assert!(first.id.starts_with("doc-"));
        let second = service.create(CreateDocumentCommand::default()).expect("second");
        assert_eq!(second.name, "Document 2");
        assert_eq!(service.current().expect("current").map(|d| d.id), Some(second.id));
    }

    #[test]
    fn collection_is_capped() {
        let (_dir, service) = service();
        for _ in 0..MAX_DOCUMENTS {
            service.create(CreateDocumentCommand::default()).expect("create");
        }
        assert!(!service.can_create().expect("can create"));
        let err = service
            .create(CreateDocumentCommand::default())
            .expect_err("limit");
        assert!(matches!(err, DocumentError::Domain(DomainError::Limit { .. })));
    }

    #[test]
    fn edits_are_persisted() {
        let (_dir, service) = service();
        let doc = service.create(CreateDocumentCommand::default()).expect("create");
        service.update_content(&doc.id, "# Hi".into()).expect("content");
        service.rename(&doc.id, "  Draft ").expect("rename");
        service
            .set_template(&doc.id, Some("builtin-minimal-blue".into()))
            .expect("template");

        let stored = service.get(&doc.id).expect("get").expect("exists");
        assert_eq!(stored.content, "# Hi");
        assert_eq!(stored.name, "Draft");
        assert_eq!(stored.selected_template_id.as_deref(), Some("builtin-minimal-blue"));
        assert!(service.rename(&doc.id, " ").is_err());
    }

    #[test]
    fn deleting_current_reassigns_pointer() {
        let (_dir, service) = service();
        let a = service.create(CreateDocumentCommand::default()).expect("a");
        let b = service.create(CreateDocumentCommand::default()).expect("b");

        service.delete(&b.id).expect("delete b");
        assert_eq!(service.current().expect("current").map(|d| d.id), Some(a.id.clone()));

        service.delete(&a.id).expect("delete a");
        assert!(service.current().expect("current").is_none());
        assert!(service.delete(&a.id).is_err());
    }

    #[test]
    fn select_requires_existing_document() {
        let (_dir, service) = service();
        let a = service.create(CreateDocumentCommand::default()).expect("a");
        service.create(CreateDocumentCommand::default()).expect("b");
        service.select(&a.id).expect("select");
        assert_eq!(service.current().expect("current").map(|d| d.id), Some(a.id));
        assert!(service.select("doc-missing").is_err());
    }
}
