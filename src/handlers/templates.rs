use inkpress::{
    application::{
        error::AppError,
        templates::{CreateTemplateCommand, UpdateTemplateCommand},
    },
    config::TemplatesCommand,
};
use serde_json::json;

use super::require_confirmation;
use crate::{ApplicationContext, io, print::print_json};

pub fn handle(ctx: &ApplicationContext, cmd: TemplatesCommand) -> Result<(), AppError> {
    match cmd {
        TemplatesCommand::List => list(ctx),
        TemplatesCommand::Show { id } => show(ctx, &id),
        TemplatesCommand::Create { name, css_file } => {
            let css = io::read_text(&css_file)?;
            let template = ctx.templates.create(CreateTemplateCommand { name, css })?;
            print_json(&template)
        }
        TemplatesCommand::Update { id, name, css_file } => {
            let css = css_file.as_deref().map(io::read_text).transpose()?;
            if name.is_none() && css.is_none() {
                return Err(AppError::validation("nothing to update; pass --name or --css-file"));
            }
            let template = ctx
                .templates
                .update(UpdateTemplateCommand { id, name, css })?;
            print_json(&template)
        }
        TemplatesCommand::Delete { id, confirm } => {
            require_confirmation(confirm, "delete a template")?;
            ctx.templates.delete(&id)?;
            println!("deleted");
            Ok(())
        }
        TemplatesCommand::SetDefault { id } => {
            ctx.templates.set_default(&id)?;
            println!("default template is now {id}");
            Ok(())
        }
    }
}

fn list(ctx: &ApplicationContext) -> Result<(), AppError> {
    let templates: Vec<_> = ctx
        .templates
        .list()?
        .into_iter()
        .map(|template| {
            json!({
                "id": template.id,
                "name": template.name,
                "builtin": template.is_builtin(),
                "isDefault": template.is_default,
                "updatedAt": template.updated_at,
            })
        })
        .collect();
    print_json(&templates)
}

fn show(ctx: &ApplicationContext, id: &str) -> Result<(), AppError> {
    let template = ctx
        .templates
        .get_by_id(id)?
        .ok_or_else(|| AppError::validation(format!("template `{id}` does not exist")))?;
    print_json(&template)
}
