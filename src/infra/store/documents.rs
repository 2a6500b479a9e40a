use serde::{Deserialize, Serialize};

use crate::application::repos::{DocumentsRepo, RepoError};
use crate::domain::entities::Document;

use super::{Collection, JsonFileStore};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentsFile {
    #[serde(default)]
    current_id: Option<String>,
    #[serde(default)]
    documents: Vec<Document>,
}

impl DocumentsRepo for JsonFileStore {
    fn list_documents(&self) -> Result<Vec<Document>, RepoError> {
        Ok(self.load::<DocumentsFile>(Collection::Documents)?.documents)
    }

    fn find_document(&self, id: &str) -> Result<Option<Document>, RepoError> {
        Ok(self
            .list_documents()?
            .into_iter()
            .find(|document| document.id == id))
    }

    fn save_document(&self, document: &Document) -> Result<(), RepoError> {
        self.update(Collection::Documents, |file: &mut DocumentsFile| {
            match file.documents.iter_mut().find(|existing| existing.id == document.id) {
                Some(existing) => *existing = document.clone(),
                None => file.documents.push(document.clone()),
            }
            Ok(())
        })
    }

    fn delete_document(&self, id: &str) -> Result<bool, RepoError> {
        self.update(Collection::Documents, |file: &mut DocumentsFile| {
            let before = file.documents.len();
            file.documents.retain(|document| document.id != id);
            Ok(file.documents.len() != before)
        })
    }

    fn current_document_id(&self) -> Result<Option<String>, RepoError> {
        Ok(self.load::<DocumentsFile>(Collection::Documents)?.current_id)
    }

    fn set_current_document_id(&self, id: Option<&str>) -> Result<(), RepoError> {
        self.update(Collection::Documents, |file: &mut DocumentsFile| {
            file.current_id = id.map(str::to_string);
            Ok(())
        })
    }
}
