use inkpress::{
    application::{
        error::AppError,
        export::{ExportMode, copy_to_target},
    },
    config::{CopyArgs, ExportArgs, PreviewCssArgs},
};
use tracing::info;

use crate::{ApplicationContext, io};

pub fn export(ctx: &ApplicationContext, args: ExportArgs) -> Result<(), AppError> {
    let mode: ExportMode = args
        .mode
        .parse()
        .map_err(|err| AppError::validation(format!("{err}")))?;
    let source = io::read_source(ctx, &args.source)?;
    let template = args.template.or(source.template_id);

    let html = ctx
        .export
        .export_as(mode, &source.markdown, template.as_deref())?;

    match args.output {
        Some(path) => {
            io::write_text(&path, &html)?;
            info!(
                target = "inkpress::export",
                op = "cli::export",
                result = "ok",
                path = %path.display(),
                mode = %mode,
                "export written"
            );
            println!("wrote {}", path.display());
        }
        None => println!("{html}"),
    }
    Ok(())
}

pub fn copy(ctx: &ApplicationContext, args: CopyArgs) -> Result<(), AppError> {
    let source = io::read_source(ctx, &args.source)?;
    let template = args.template.or(source.template_id);

    let html = ctx.export.export_as(
        ExportMode::TargetOptimized,
        &source.markdown,
        template.as_deref(),
    )?;
    copy_to_target(&html, &ctx.clipboard)?;
    println!("copied");
    Ok(())
}

pub fn preview_css(ctx: &ApplicationContext, args: PreviewCssArgs) -> Result<(), AppError> {
    if let Some(css) = ctx.export.preview_css(args.template.as_deref())? {
        println!("{css}");
    }
    Ok(())
}
