use std::sync::Arc;

use inkpress::{
    application::{
        documents::{CreateDocumentCommand, DocumentService},
        export::{ExportMode, ExportService},
        images::{AddImageCommand, ImageService},
        render::{ComrakRenderService, RenderPipelineConfig, ScopePrefix},
        templates::{CreateTemplateCommand, TemplateService},
    },
    infra::store::JsonFileStore,
};
use tempfile::TempDir;

struct Services {
    templates: TemplateService,
    documents: DocumentService,
    images: ImageService,
}

fn open(dir: &TempDir) -> Services {
    let store = Arc::new(JsonFileStore::new(dir.path()));
    Services {
        templates: TemplateService::new(store.clone(), ScopePrefix::default()),
        documents: DocumentService::new(store.clone()),
        images: ImageService::new(store),
    }
}

#[test]
fn state_survives_reopening_the_store() {
    let dir = TempDir::new().expect("tempdir");

    let (template_id, document_id) = {
        let services = open(&dir);
        let template = services
            .templates
            .create(CreateTemplateCommand {
                name: "House".into(),
                css: ".wechat-article-paragraph { color: #222; }".into(),
            })
            .expect("create template");
        services
            .templates
            .set_default(&template.id)
            .expect("set default");

        let document = services
            .documents
            .create(CreateDocumentCommand {
                name: Some("Launch notes".into()),
                content: Some("# Launch".into()),
            })
            .expect("create document");
        services
            .documents
            .set_template(&document.id, Some(template.id.clone()))
            .expect("set template");
        (template.id, document.id)
    };

    let reopened = open(&dir);
    let default = reopened
        .templates
        .get_default()
        .expect("default")
        .expect("some default");
    assert_eq!(default.id, template_id);
    assert!(!default.is_builtin());

    let current = reopened
        .documents
        .current()
        .expect("current")
        .expect("some current");
    assert_eq!(current.id, document_id);
    assert_eq!(current.name, "Launch notes");
    assert_eq!(current.content, "# Launch");
    assert_eq!(current.selected_template_id.as_deref(), Some(template_id.as_str()));
}

#[test]
fn stored_images_are_inlined_on_export() {
    let dir = TempDir::new().expect("tempdir");
    let services = open(&dir);
    let image = services
        .images
        .add(AddImageCommand {
            name: "dot.png".into(),
            bytes: vec![1, 2, 3],
            mime_type: None,
        })
        .expect("add image");

    let renderer = ComrakRenderService::with_config(
        &RenderPipelineConfig::default().with_image_source(Arc::new(services.images.clone())),
    );
    let export = ExportService::new(services.templates.clone(), Arc::new(renderer));
    let markdown = format!("Look:\n\n![dot](local://{})", image.id);

    let html = export
        .export_as(ExportMode::TargetOptimized, &markdown, None)
        .expect("export");
    assert!(html.contains("data:image/png;base64,AQID"), "{html}");
    assert!(!html.contains("local://"));

    services.images.delete(&image.id).expect("delete");
    let html = export
        .export_as(ExportMode::ContentOnly, &markdown, None)
        .expect("export");
    assert!(html.contains(&format!("local://{}", image.id)));
}

#[test]
fn custom_template_css_reaches_the_export() {
    let dir = TempDir::new().expect("tempdir");
    let services = open(&dir);
    let template = services
        .templates
        .create(CreateTemplateCommand {
            name: "Loud".into(),
            css: "strong { color: #c00; }".into(),
        })
        .expect("create");

    let export = ExportService::new(
        services.templates.clone(),
        Arc::new(ComrakRenderService::with_config(&RenderPipelineConfig::default())),
    );
    let html = export
        .export_as(ExportMode::TargetOptimized, "Some **bold** words", Some(&template.id))
        .expect("export");
    assert!(html.contains("color:#c00;"), "{html}");

    let page = export
        .export_as(ExportMode::FullDocument, "Some **bold** words", Some(&template.id))
        .expect("export");
    assert!(page.contains(".preview-container .markdown-body strong"));
}

#[test]
fn builtin_template_follows_a_custom_prefix() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(JsonFileStore::new(dir.path()));
    let templates = TemplateService::new(store, ScopePrefix::new("editor-preview", "article-body"));
    let config = RenderPipelineConfig {
        content_root: "article-body".to_string(),
        ..RenderPipelineConfig::default()
    };
    let export = ExportService::new(
        templates,
        Arc::new(ComrakRenderService::with_config(&config)),
    );

    let html = export
        .export_as(ExportMode::TargetOptimized, "# Title\n\nSome **bold** words", None)
        .expect("export");
    assert!(html.contains("color:#07c160;"), "{html}");

    let page = export
        .export_as(ExportMode::FullDocument, "# Title", None)
        .expect("export");
    assert!(page.contains(".editor-preview .article-body strong"), "{page}");
    assert!(!page.contains("markdown-body"), "{page}");
}
