//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{
    CliArgs, Command, ConfirmArgs, CopyArgs, DocumentsCommand, ExportArgs, GlobalOverrides,
    ImagesCommand, PreviewCssArgs, SourceArgs, TemplatesCommand,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkpress";
const ENV_PREFIX: &str = "INKPRESS";
const DEFAULT_DATA_DIR: &str = ".inkpress";
const DEFAULT_SCOPE_CONTAINER: &str = "preview-container";
const DEFAULT_CONTENT_ROOT: &str = "markdown-body";
const DEFAULT_CLIPBOARD_PROGRAM: &str = "xclip";
const DEFAULT_HTML_ARGS: &[&str] = &["-selection", "clipboard", "-t", "text/html"];
const DEFAULT_TEXT_ARGS: &[&str] = &["-selection", "clipboard"];

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub render: RenderSettings,
    pub clipboard: ClipboardSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Class of the preview container that scopes template CSS.
    pub scope_container: String,
    /// Class of the article wrapper inside the container.
    pub content_root: String,
}

#[derive(Debug, Clone)]
pub struct ClipboardSettings {
    pub html_program: String,
    pub html_args: Vec<String>,
    pub text_program: String,
    pub text_args: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(environment());

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(" ")
        .with_list_parse_key("clipboard.html_args")
        .with_list_parse_key("clipboard.text_args")
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    storage: RawStorageSettings,
    render: RawRenderSettings,
    clipboard: RawClipboardSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(dir) = overrides.data_dir.as_ref() {
            self.storage.data_dir = Some(dir.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            storage,
            render,
            clipboard,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            storage: build_storage_settings(storage)?,
            render: build_render_settings(render)?,
            clipboard: build_clipboard_settings(clipboard)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let data_dir = storage
        .data_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if data_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "storage.data_dir",
            "path must not be empty",
        ));
    }
    Ok(StorageSettings { data_dir })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    Ok(RenderSettings {
        scope_container: class_name(
            "render.scope_container",
            render.scope_container,
            DEFAULT_SCOPE_CONTAINER,
        )?,
        content_root: class_name(
            "render.content_root",
            render.content_root,
            DEFAULT_CONTENT_ROOT,
        )?,
    })
}

fn class_name(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<String, LoadError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return Err(LoadError::invalid(key, "class name must not be empty"));
    }
    if trimmed.chars().any(|c| c.is_whitespace()) {
        return Err(LoadError::invalid(key, "class name must be a single class"));
    }
    Ok(trimmed.to_string())
}

fn build_clipboard_settings(
    clipboard: RawClipboardSettings,
) -> Result<ClipboardSettings, LoadError> {
    Ok(ClipboardSettings {
        html_program: program("clipboard.html_program", clipboard.html_program)?,
        html_args: clipboard
            .html_args
            .unwrap_or_else(|| owned(DEFAULT_HTML_ARGS)),
        text_program: program("clipboard.text_program", clipboard.text_program)?,
        text_args: clipboard
            .text_args
            .unwrap_or_else(|| owned(DEFAULT_TEXT_ARGS)),
    })
}

fn program(key: &'static str, value: Option<String>) -> Result<String, LoadError> {
    match value {
        None => Ok(DEFAULT_CLIPBOARD_PROGRAM.to_string()),
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(LoadError::invalid(key, "program must not be empty"));
            }
            Ok(trimmed.to_string())
        }
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    scope_container: Option<String>,
    content_root: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawClipboardSettings {
    html_program: Option<String>,
    html_args: Option<Vec<String>>,
    text_program: Option<String>,
    text_args: Option<Vec<String>>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
