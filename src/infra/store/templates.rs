use serde::{Deserialize, Serialize};

use crate::application::repos::{RepoError, TemplatesRepo};
use crate::domain::entities::Template;

use super::{Collection, JsonFileStore};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplatesFile {
    #[serde(default)]
    default_id: Option<String>,
    #[serde(default)]
    templates: Vec<Template>,
}

impl TemplatesRepo for JsonFileStore {
    fn list_templates(&self) -> Result<Vec<Template>, RepoError> {
        Ok(self.load::<TemplatesFile>(Collection::Templates)?.templates)
    }

    fn find_template(&self, id: &str) -> Result<Option<Template>, RepoError> {
        Ok(self
            .list_templates()?
            .into_iter()
            .find(|template| template.id == id))
    }

    fn save_template(&self, template: &Template) -> Result<(), RepoError> {
        self.update(Collection::Templates, |file: &mut TemplatesFile| {
            match file.templates.iter_mut().find(|existing| existing.id == template.id) {
                Some(existing) => *existing = template.clone(),
                None => file.templates.push(template.clone()),
            }
            Ok(())
        })
    }

    fn delete_template(&self, id: &str) -> Result<bool, RepoError> {
        self.update(Collection::Templates, |file: &mut TemplatesFile| {
            let before = file.templates.len();
            file.templates.retain(|template| template.id != id);
            Ok(file.templates.len() != before)
        })
    }

    fn default_template_id(&self) -> Result<Option<String>, RepoError> {
        Ok(self.load::<TemplatesFile>(Collection::Templates)?.default_id)
    }

    fn set_default_template_id(&self, id: Option<&str>) -> Result<(), RepoError> {
        self.update(Collection::Templates, |file: &mut TemplatesFile| {
            file.default_id = id.map(str::to_string);
            Ok(())
        })
    }
}
