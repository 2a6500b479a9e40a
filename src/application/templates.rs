use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::render::{ScopePrefix, scope::scope};
use crate::application::repos::{RepoError, TemplatesRepo};
use crate::domain::{
    entities::{
        CUSTOM_TEMPLATE_PREFIX, MAX_CUSTOM_TEMPLATES, Template, is_builtin_template_id,
        timestamp_now,
    },
    error::DomainError,
    templates::builtin_templates,
};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Change notification delivered to [`TemplateListener`]s after a write succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateChange {
    Created(String),
    Updated(String),
    Deleted(String),
    DefaultChanged(Option<String>),
}

pub trait TemplateListener: Send + Sync {
    fn on_template_change(&self, change: &TemplateChange);
}

#[derive(Debug, Clone)]
pub struct CreateTemplateCommand {
    pub name: String,
    pub css: String,
}

#[derive(Debug, Clone)]
pub struct UpdateTemplateCommand {
    pub id: String,
    pub name: Option<String>,
    pub css: Option<String>,
}

#[derive(Clone)]
pub struct TemplateService {
    repo: Arc<dyn TemplatesRepo>,
    prefix: ScopePrefix,
    listeners: Vec<Arc<dyn TemplateListener>>,
}

impl TemplateService {
    pub fn new(repo: Arc<dyn TemplatesRepo>, prefix: ScopePrefix) -> Self {
        Self {
            repo,
            prefix,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Arc<dyn TemplateListener>) {
        self.listeners.push(listener);
    }

    pub fn prefix(&self) -> &ScopePrefix {
        &self.prefix
    }

    /// Built-ins first, then custom templates. Exactly one entry is default.
    ///
    /// Built-in CSS is scoped under this service's prefix on every call;
    /// custom CSS was scoped when it was saved.
    pub fn list(&self) -> Result<Vec<Template>, TemplateError> {
        let mut templates: Vec<Template> = builtin_templates()
            .into_iter()
            .map(|mut template| {
                template.css = scope(&template.css, &self.prefix);
                template
            })
            .collect();
        templates.extend(self.repo.list_templates()?);

        let pointer = self.repo.default_template_id()?;
        let default_index = pointer
            .as_deref()
            .and_then(|id| templates.iter().position(|template| template.id == id))
            .or_else(|| templates.iter().position(|template| template.is_builtin() && template.is_default))
            .unwrap_or(0);

        for (index, template) in templates.iter_mut().enumerate() {
            template.is_default = index == default_index;
        }
        Ok(templates)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Template>, TemplateError> {
        Ok(self.list()?.into_iter().find(|template| template.id == id))
    }

    pub fn get_default(&self) -> Result<Option<Template>, TemplateError> {
        Ok(self.list()?.into_iter().find(|template| template.is_default))
    }

    pub fn can_create(&self) -> Result<bool, TemplateError> {
        Ok(self.repo.list_templates()?.len() < MAX_CUSTOM_TEMPLATES)
    }

    pub fn create(&self, command: CreateTemplateCommand) -> Result<Template, TemplateError> {
        let name = required("template name", &command.name)?;
        let css = required("template css", &command.css)?;

        if !self.can_create()? {
            return Err(DomainError::limit(
                "template",
                format!("at most {MAX_CUSTOM_TEMPLATES} custom templates can be saved"),
            )
            .into());
        }

        let now = timestamp_now();
        let template = Template {
            id: format!("{CUSTOM_TEMPLATE_PREFIX}{}", Uuid::new_v4()),
            name,
            css: scope(&css, &self.prefix),
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        self.repo.save_template(&template)?;

        info!(
            target = "application::templates",
            op = "templates::create",
            result = "ok",
            template_id = %template.id,
            "template created"
        );
        self.notify(TemplateChange::Created(template.id.clone()));
        Ok(template)
    }

    pub fn update(&self, command: UpdateTemplateCommand) -> Result<Template, TemplateError> {
        reject_builtin(&command.id, "edited")?;
        let mut template = self
            .repo
            .find_template(&command.id)?
            .ok_or_else(|| DomainError::not_found("template", &command.id))?;

        if let Some(name) = command.name.as_deref() {
            template.name = required("template name", name)?;
        }
        if let Some(css) = command.css.as_deref() {
            template.css = scope(&required("template css", css)?, &self.prefix);
        }
        template.updated_at = timestamp_now();
        self.repo.save_template(&template)?;

        info!(
            target = "application::templates",
            op = "templates::update",
            result = "ok",
            template_id = %template.id,
            "template updated"
        );
        self.notify(TemplateChange::Updated(template.id.clone()));
        Ok(template)
    }

    /// Delete a custom template. Removing the default clears the pointer, so the
    /// built-in default takes over.
    pub fn delete(&self, id: &str) -> Result<(), TemplateError> {
        reject_builtin(id, "deleted")?;
        if !self.repo.delete_template(id)? {
            return Err(DomainError::not_found("template", id).into());
        }

        if self.repo.default_template_id()?.as_deref() == Some(id) {
            self.repo.set_default_template_id(None)?;
            self.notify(TemplateChange::DefaultChanged(None));
        }

        info!(
            target = "application::templates",
            op = "templates::delete",
            result = "ok",
            template_id = %id,
            "template deleted"
        );
        self.notify(TemplateChange::Deleted(id.to_string()));
        Ok(())
    }

    pub fn set_default(&self, id: &str) -> Result<(), TemplateError> {
        if self.get_by_id(id)?.is_none() {
            return Err(DomainError::not_found("template", id).into());
        }
        self.repo.set_default_template_id(Some(id))?;

        info!(
            target = "application::templates",
            op = "templates::set_default",
            result = "ok",
            template_id = %id,
            "default template changed"
        );
        self.notify(TemplateChange::DefaultChanged(Some(id.to_string())));
        Ok(())
    }

    fn notify(&self, change: TemplateChange) {
        for listener in &self.listeners {
            listener.on_template_change(&change);
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn reject_builtin(id: &str, action: &str) -> Result<(), DomainError> {
    if is_builtin_template_id(id) {
        return Err(DomainError::validation(format!(
            "built-in template `{id}` cannot be {action}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::templates::DEFAULT_BUILTIN_ID;
    use crate::infra::store::JsonFileStore;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TemplateChange>>);

    impl TemplateListener for Recorder {
        fn on_template_change(&self, change: &TemplateChange) {
            self.0.lock().expect("lock").push(change.clone());
        }
    }

    fn service() -> (TempDir, TemplateService) {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(JsonFileStore::new(dir.path()));
        (dir, TemplateService::new(store, ScopePrefix::default()))
    }

    fn command(name: &str, css: &str) -> CreateTemplateCommand {
        CreateTemplateCommand {
            name: name.to_string(),
            css: css.to_string(),
        }
    }

    #[test]
    fn builtins_are_listed_with_one_default() {
        let (_dir, service) = service();
        let templates = service.list().expect("list");
        assert_eq!(templates.len(), 6);
        let default = service.get_default().expect("default").expect("some");
        assert_eq!(default.id, DEFAULT_BUILTIN_ID);
    }

    #[test]
    fn builtins_follow_the_configured_prefix() {
        let (_dir, service) = service();
        let default = service.get_default().expect("default").expect("some");
        assert!(
            default
                .css
                .contains(".preview-container .markdown-body.wechat-article {")
        );
        assert!(
            default
                .css
                .contains(".preview-container .markdown-body .wechat-article-title {")
        );

        let dir = TempDir::new().expect("tempdir");
        let custom = TemplateService::new(
            Arc::new(JsonFileStore::new(dir.path())),
            ScopePrefix::new("editor-preview", "article-body"),
        );
        let default = custom.get_default().expect("default").expect("some");
        assert!(default.css.contains(".editor-preview .article-body.wechat-article {"));
        assert!(default.css.contains(".editor-preview .article-body strong {"));
        assert!(!default.css.contains("markdown-body"));
    }

    #[test]
    fn created_css_is_scoped_and_capped() {
        let (_dir, service) = service();
        let template = service
            .create(command(" Mine ", ".wechat-article-h2 { color: red; }"))
            .expect("create");
        assert_eq!(template.name, "Mine");
        assert!(template.id.starts_with("template-"));
        assert!(
            template
                .css
                .starts_with(".preview-container .markdown-body .wechat-article-h2")
        );

        service.create(command("b", "p{}")).expect("second");
        service.create(command("c", "p{}")).expect("third");
        assert!(!service.can_create().expect("can create"));
        let err = service.create(command("d", "p{}")).expect_err("limit");
        assert!(matches!(err, TemplateError::Domain(DomainError::Limit { .. })));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let (_dir, service) = service();
        let err = service.create(command("  ", "p{}")).expect_err("name");
        assert!(matches!(err, TemplateError::Domain(DomainError::Validation { .. })));
    }

    #[test]
    fn builtins_cannot_be_changed() {
        let (_dir, service) = service();
        assert!(service.delete(DEFAULT_BUILTIN_ID).is_err());
        let update = UpdateTemplateCommand {
            id: DEFAULT_BUILTIN_ID.to_string(),
            name: Some("x".into()),
            css: None,
        };
        assert!(service.update(update).is_err());
    }

    #[test]
    fn deleting_the_default_falls_back_and_notifies() {
        let (_dir, mut service) = service();
        let recorder = Arc::new(Recorder::default());
        service.subscribe(recorder.clone());

        let template = service.create(command("Mine", "p { color: red }")).expect("create");
        service.set_default(&template.id).expect("set default");
        assert_eq!(
            service.get_default().expect("default").map(|t| t.id),
            Some(template.id.clone())
        );

        service.delete(&template.id).expect("delete");
        assert_eq!(
            service.get_default().expect("default").map(|t| t.id).as_deref(),
            Some(DEFAULT_BUILTIN_ID)
        );

        let changes = recorder.0.lock().expect("lock").clone();
        assert_eq!(
            changes,
            vec![
                TemplateChange::Created(template.id.clone()),
                TemplateChange::DefaultChanged(Some(template.id.clone())),
                TemplateChange::DefaultChanged(None),
                TemplateChange::Deleted(template.id),
            ]
        );
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (_dir, service) = service();
        assert!(service.get_by_id("template-missing").expect("get").is_none());
        let err = service.set_default("template-missing").expect_err("missing");
        assert!(matches!(err, TemplateError::Domain(DomainError::NotFound { .. })));
    }
}
