use std::path::PathBuf;

use inkpress::{
    application::{error::AppError, images::AddImageCommand},
    config::ImagesCommand,
};
use serde_json::json;

use super::require_confirmation;
use crate::{ApplicationContext, io, print::print_json};

pub fn handle(ctx: &ApplicationContext, cmd: ImagesCommand) -> Result<(), AppError> {
    match cmd {
        ImagesCommand::Add { path, name, mime } => add(ctx, path, name, mime),
        ImagesCommand::List => {
            let images: Vec<_> = ctx
                .images
                .list()?
                .into_iter()
                .map(|image| {
                    json!({
                        "reference": format!("local://{}", image.id),
                        "id": image.id,
                        "name": image.name,
                        "type": image.mime_type,
                        "size": image.size,
                        "createdAt": image.created_at,
                    })
                })
                .collect();
            print_json(&images)
        }
        ImagesCommand::Delete { id, confirm } => {
            require_confirmation(confirm, "delete an image")?;
            ctx.images.delete(&id)?;
            println!("deleted");
            Ok(())
        }
        ImagesCommand::Clear { confirm } => {
            require_confirmation(confirm, "delete every image")?;
            ctx.images.clear()?;
            println!("cleared");
            Ok(())
        }
        ImagesCommand::Stats => print_json(&ctx.images.stats()?),
    }
}

fn add(
    ctx: &ApplicationContext,
    path: PathBuf,
    name: Option<String>,
    mime: Option<String>,
) -> Result<(), AppError> {
    let bytes = io::read_bytes(&path)?;
    let name = name.unwrap_or_else(|| {
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string()
    });
    let image = ctx.images.add(AddImageCommand {
        name,
        bytes,
        mime_type: mime,
    })?;
    println!("![{}](local://{})", image.name, image.id);
    Ok(())
}
