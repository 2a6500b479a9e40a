use inkpress::{
    application::{documents::CreateDocumentCommand, error::AppError},
    config::DocumentsCommand,
};
use serde_json::json;

use super::require_confirmation;
use crate::{ApplicationContext, io, print::print_json};

pub fn handle(ctx: &ApplicationContext, cmd: DocumentsCommand) -> Result<(), AppError> {
    match cmd {
        DocumentsCommand::List => list(ctx),
        DocumentsCommand::Create { name, file } => {
            let content = file.as_deref().map(io::read_text).transpose()?;
            let document = ctx
                .documents
                .create(CreateDocumentCommand { name, content })?;
            println!("{}", document.id);
            Ok(())
        }
        DocumentsCommand::Show { id } => show(ctx, id.as_deref()),
        DocumentsCommand::Rename { id, name } => {
            ctx.documents.rename(&id, &name)?;
            println!("renamed");
            Ok(())
        }
        DocumentsCommand::Update { id, file } => {
            let content = io::read_text(&file)?;
            ctx.documents.update_content(&id, content)?;
            println!("updated");
            Ok(())
        }
        DocumentsCommand::Select { id } => {
            ctx.documents.select(&id)?;
            println!("current document is now {id}");
            Ok(())
        }
        DocumentsCommand::SetTemplate { id, template } => {
            if let Some(template_id) = template.as_deref() {
                if ctx.templates.get_by_id(template_id)?.is_none() {
                    return Err(AppError::validation(format!(
                        "template `{template_id}` does not exist"
                    )));
                }
            }
            ctx.documents.set_template(&id, template)?;
            println!("updated");
            Ok(())
        }
        DocumentsCommand::Delete { id, confirm } => {
            require_confirmation(confirm, "delete a document")?;
            ctx.documents.delete(&id)?;
            println!("deleted");
            Ok(())
        }
    }
}

fn list(ctx: &ApplicationContext) -> Result<(), AppError> {
    let current = ctx.documents.current()?.map(|document| document.id);
    let documents: Vec<_> = ctx
        .documents
        .list()?
        .into_iter()
        .map(|document| {
            json!({
                "current": current.as_deref() == Some(document.id.as_str()),
                "id": document.id,
                "name": document.name,
                "selectedTemplateId": document.selected_template_id,
                "updatedAt": document.updated_at,
            })
        })
        .collect();
    print_json(&documents)
}

fn show(ctx: &ApplicationContext, id: Option<&str>) -> Result<(), AppError> {
    let document = match id {
        Some(id) => ctx.documents.get(id)?,
        None => ctx.documents.current()?,
    };
    let document = document.ok_or_else(|| AppError::validation("no such document"))?;
    print!("{}", document.content);
    if !document.content.ends_with('\n') {
        println!();
    }
    Ok(())
}
