use std::{fs, io::Read, path::Path};

use inkpress::{application::error::AppError, config::SourceArgs, infra::error::InfraError};

use crate::ApplicationContext;

/// Markdown to render plus the template its document asks for, if any.
pub struct Source {
    pub markdown: String,
    pub template_id: Option<String>,
}

pub fn read_source(ctx: &ApplicationContext, source: &SourceArgs) -> Result<Source, AppError> {
    if let Some(id) = source.document.as_deref() {
        let document = ctx
            .documents
            .get(id)?
            .ok_or_else(|| AppError::validation(format!("document `{id}` does not exist")))?;
        return Ok(Source {
            markdown: document.content,
            template_id: document.selected_template_id,
        });
    }

    let path = source
        .file
        .as_ref()
        .ok_or_else(|| AppError::validation("a markdown file or --document is required"))?;
    Ok(Source {
        markdown: read_text(path)?,
        template_id: None,
    })
}

/// Read a UTF-8 file; `-` reads stdin.
pub fn read_text(path: &Path) -> Result<String, AppError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| AppError::validation(format!("failed to read stdin: {err}")))?;
        return Ok(text);
    }
    fs::read_to_string(path)
        .map_err(|err| AppError::validation(format!("failed to read `{}`: {err}", path.display())))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path)
        .map_err(|err| AppError::validation(format!("failed to read `{}`: {err}", path.display())))
}

pub fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| AppError::from(InfraError::Io(err)))?;
    }
    fs::write(path, text).map_err(|err| AppError::from(InfraError::Io(err)))
}
