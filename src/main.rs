use std::{process, sync::Arc};

use inkpress::{
    application::{
        documents::DocumentService,
        error::AppError,
        export::ExportService,
        images::ImageService,
        render::{RenderPipelineConfig, ScopePrefix, configure_render_service, render_service},
        repos::{DocumentsRepo, ImagesRepo, TemplatesRepo},
        templates::TemplateService,
    },
    config,
    infra::{clipboard::CommandClipboard, error::InfraError, store::JsonFileStore, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

mod handlers;
mod io;
mod print;

/// Services shared by every command handler.
pub(crate) struct ApplicationContext {
    pub templates: TemplateService,
    pub documents: DocumentService,
    pub images: ImageService,
    pub export: ExportService,
    pub clipboard: CommandClipboard,
}

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    let emit = || {
        error!(
            error = %report.joined(),
            hint = error.presentation_message(),
            "application error"
        );
    };

    if dispatcher::has_been_set() {
        emit();
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, emit);
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let ctx = build_application_context(&settings)?;

    match cli_args.command {
        config::Command::Export(args) => handlers::export::export(&ctx, args),
        config::Command::Copy(args) => handlers::export::copy(&ctx, args),
        config::Command::PreviewCss(args) => handlers::export::preview_css(&ctx, args),
        config::Command::Templates(cmd) => handlers::templates::handle(&ctx, cmd),
        config::Command::Documents(cmd) => handlers::documents::handle(&ctx, cmd),
        config::Command::Images(cmd) => handlers::images::handle(&ctx, cmd),
    }
}

fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let store = Arc::new(JsonFileStore::new(settings.storage.data_dir.clone()));
    let templates_repo: Arc<dyn TemplatesRepo> = store.clone();
    let documents_repo: Arc<dyn DocumentsRepo> = store.clone();
    let images_repo: Arc<dyn ImagesRepo> = store;

    let prefix = ScopePrefix::new(
        settings.render.scope_container.as_str(),
        settings.render.content_root.as_str(),
    );
    let templates = TemplateService::new(templates_repo, prefix);
    let documents = DocumentService::new(documents_repo);
    let images = ImageService::new(images_repo);

    configure_render_service(
        RenderPipelineConfig::from(&settings.render).with_image_source(Arc::new(images.clone())),
    )
    .map_err(|err| AppError::unexpected(err.to_string()))?;
    let export = ExportService::new(templates.clone(), render_service());

    Ok(ApplicationContext {
        templates,
        documents,
        images,
        export,
        clipboard: CommandClipboard::from(&settings.clipboard),
    })
}
