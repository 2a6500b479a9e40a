use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use super::*;

#[test]
fn defaults_are_usable_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert_eq!(settings.storage.data_dir, PathBuf::from(".inkpress"));
    assert_eq!(settings.render.scope_container, "preview-container");
    assert_eq!(settings.render.content_root, "markdown-body");
    assert_eq!(settings.clipboard.html_program, "xclip");
    assert_eq!(
        settings.clipboard.html_args,
        vec!["-selection", "clipboard", "-t", "text/html"]
    );
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.storage.data_dir = Some(PathBuf::from("/from/file"));

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        log_json: Some(true),
        data_dir: Some(PathBuf::from("/from/cli")),
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.logging.format, LogFormat::Json);
    assert_eq!(settings.storage.data_dir, PathBuf::from("/from/cli"));
}

#[test]
fn invalid_values_name_their_key() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));

    let mut raw = RawSettings::default();
    raw.clipboard.text_program = Some("  ".to_string());
    let err = Settings::from_raw(raw).expect_err("empty program");
    assert!(matches!(err, LoadError::Invalid { key: "clipboard.text_program", .. }));

    let mut raw = RawSettings::default();
    raw.storage.data_dir = Some(PathBuf::new());
    let err = Settings::from_raw(raw).expect_err("empty dir");
    assert!(matches!(err, LoadError::Invalid { key: "storage.data_dir", .. }));
}

#[test]
fn class_names_accept_a_leading_dot() {
    let mut raw = RawSettings::default();
    raw.render.scope_container = Some(".editor-preview".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.render.scope_container, "editor-preview");

    let mut raw = RawSettings::default();
    raw.render.content_root = Some("a b".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
#[serial]
fn config_file_layer_is_read() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("inkpress.toml");
    fs::write(
        &path,
        "[storage]\ndata_dir = \"/srv/inkpress\"\n\n[clipboard]\nhtml_program = \"wl-copy\"\nhtml_args = [\"--type\", \"text/html\"]\n",
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "inkpress",
        "--config-file",
        path.to_str().expect("utf-8 path"),
        "templates",
        "list",
    ]);
    let settings = load(&args).expect("settings");

    assert_eq!(settings.storage.data_dir, PathBuf::from("/srv/inkpress"));
    assert_eq!(settings.clipboard.html_program, "wl-copy");
    assert_eq!(settings.clipboard.html_args, vec!["--type", "text/html"]);
    assert_eq!(settings.clipboard.text_program, "xclip");
}

#[test]
#[serial]
fn environment_layer_overrides_defaults() {
    // SAFETY: serialised with every other test that reads the environment.
    unsafe {
        std::env::set_var("INKPRESS__STORAGE__DATA_DIR", "/from/env");
        std::env::set_var("INKPRESS__CLIPBOARD__TEXT_ARGS", "-selection primary");
    }

    let args = CliArgs::parse_from(["inkpress", "images", "stats"]);
    let result = load(&args);

    unsafe {
        std::env::remove_var("INKPRESS__STORAGE__DATA_DIR");
        std::env::remove_var("INKPRESS__CLIPBOARD__TEXT_ARGS");
    }

    let settings = result.expect("settings");
    assert_eq!(settings.storage.data_dir, PathBuf::from("/from/env"));
    assert_eq!(settings.clipboard.text_args, vec!["-selection", "primary"]);
}

#[test]
fn parse_export_from_file() {
    let args = CliArgs::parse_from([
        "inkpress",
        "export",
        "--mode",
        "full",
        "--template",
        "builtin-minimal-blue",
        "-o",
        "/tmp/out.html",
        "notes.md",
    ]);

    match args.command {
        Command::Export(export) => {
            assert_eq!(export.mode, "full");
            assert_eq!(export.template.as_deref(), Some("builtin-minimal-blue"));
            assert_eq!(export.output, Some(PathBuf::from("/tmp/out.html")));
            assert_eq!(export.source.file, Some(PathBuf::from("notes.md")));
            assert!(export.source.document.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn export_needs_exactly_one_source() {
    assert!(CliArgs::try_parse_from(["inkpress", "export"]).is_err());
    assert!(
        CliArgs::try_parse_from(["inkpress", "copy", "a.md", "--document", "doc-1"]).is_err()
    );
    assert!(CliArgs::try_parse_from(["inkpress", "export", "--mode", "pdf", "a.md"]).is_err());

    let args = CliArgs::parse_from(["inkpress", "copy", "--document", "doc-1"]);
    match args.command {
        Command::Copy(copy) => assert_eq!(copy.source.document.as_deref(), Some("doc-1")),
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn destructive_commands_default_to_unconfirmed() {
    let args = CliArgs::parse_from(["inkpress", "templates", "delete", "template-1"]);
    match args.command {
        Command::Templates(TemplatesCommand::Delete { id, confirm }) => {
            assert_eq!(id, "template-1");
            assert!(!confirm.yes);
        }
        _ => panic!("wrong command parsed"),
    }

    let args = CliArgs::parse_from(["inkpress", "images", "clear", "--yes"]);
    assert!(matches!(
        args.command,
        Command::Images(ImagesCommand::Clear { confirm: ConfirmArgs { yes: true } })
    ));
}

#[test]
fn global_overrides_follow_the_subcommand() {
    let args = CliArgs::parse_from([
        "inkpress",
        "documents",
        "set-template",
        "doc-1",
        "--data-dir",
        "/tmp/data",
        "--log-level",
        "warn",
    ]);
    assert_eq!(args.overrides.data_dir, Some(PathBuf::from("/tmp/data")));
    assert_eq!(args.overrides.log_level.as_deref(), Some("warn"));
    assert!(matches!(
        args.command,
        Command::Documents(DocumentsCommand::SetTemplate { template: None, .. })
    ));
}
