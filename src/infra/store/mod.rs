//! JSON-file persistence for templates, documents and images.
//!
//! Each collection lives in its own file under the data directory. Writes go
//! to a temporary file in the same directory and are renamed into place, so a
//! crash never leaves a half-written collection behind.

mod documents;
mod images;
mod templates;

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::repos::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Templates,
    Documents,
    Images,
}

impl Collection {
    fn name(self) -> &'static str {
        match self {
            Collection::Templates => "templates",
            Collection::Documents => "documents",
            Collection::Images => "images",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            Collection::Templates => "templates.json",
            Collection::Documents => "documents.json",
            Collection::Images => "images.json",
        }
    }
}

/// File-backed store implementing every repository trait.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.file_name())
    }

    fn load<T>(&self, collection: Collection) -> Result<T, RepoError>
    where
        T: DeserializeOwned + Default,
    {
        let _guard = self.guard()?;
        self.read(collection)
    }

    /// Read-modify-write under the store lock. The file is only rewritten when
    /// `change` succeeds.
    fn update<T, R>(
        &self,
        collection: Collection,
        change: impl FnOnce(&mut T) -> Result<R, RepoError>,
    ) -> Result<R, RepoError>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let _guard = self.guard()?;
        let mut value: T = self.read(collection)?;
        let result = change(&mut value)?;
        self.write(collection, &value)?;
        Ok(result)
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, RepoError> {
        self.lock
            .lock()
            .map_err(|_| RepoError::from_persistence("store lock poisoned"))
    }

    fn read<T>(&self, collection: Collection) -> Result<T, RepoError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(collection);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => return Err(RepoError::from_persistence(err)),
        };
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&raw).map_err(|err| RepoError::corrupt(collection.name(), err))
    }

    fn write<T: Serialize>(&self, collection: Collection, value: &T) -> Result<(), RepoError> {
        fs::create_dir_all(&self.root).map_err(RepoError::from_persistence)?;

        let mut file = NamedTempFile::new_in(&self.root).map_err(RepoError::from_persistence)?;
        serde_json::to_writer_pretty(&mut file, value).map_err(RepoError::from_persistence)?;
        file.write_all(b"\n").map_err(RepoError::from_persistence)?;

        let path = self.path(collection);
        file.persist(&path)
            .map_err(|err| RepoError::from_persistence(err.error))?;

        debug!(
            target = "infra::store",
            collection = collection.name(),
            path = %path.display(),
            "collection written"
        );
        Ok(())
    }
}
