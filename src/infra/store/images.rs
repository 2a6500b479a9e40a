use serde::{Deserialize, Serialize};

use crate::application::repos::{ImagesRepo, RepoError};
use crate::domain::entities::StoredImage;

use super::{Collection, JsonFileStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ImagesFile {
    #[serde(default)]
    images: Vec<StoredImage>,
}

impl ImagesRepo for JsonFileStore {
    fn list_images(&self) -> Result<Vec<StoredImage>, RepoError> {
        Ok(self.load::<ImagesFile>(Collection::Images)?.images)
    }

    fn find_image(&self, id: &str) -> Result<Option<StoredImage>, RepoError> {
        Ok(self.list_images()?.into_iter().find(|image| image.id == id))
    }

    fn insert_image(&self, image: &StoredImage) -> Result<(), RepoError> {
        self.update(Collection::Images, |file: &mut ImagesFile| {
            if file.images.iter().any(|existing| existing.id == image.id) {
                return Err(RepoError::Integrity {
                    message: format!("image `{}` already exists", image.id),
                });
            }
            file.images.push(image.clone());
            Ok(())
        })
    }

    fn delete_image(&self, id: &str) -> Result<bool, RepoError> {
        self.update(Collection::Images, |file: &mut ImagesFile| {
            let before = file.images.len();
            file.images.retain(|image| image.id != id);
            Ok(file.images.len() != before)
        })
    }

    fn clear_images(&self) -> Result<(), RepoError> {
        self.update(Collection::Images, |file: &mut ImagesFile| {
            file.images.clear();
            Ok(())
        })
    }
}
