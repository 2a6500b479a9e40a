use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the inkpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "inkpress",
    version,
    about = "Markdown to inline-styled HTML for restricted rich-text editors"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "INKPRESS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the directory holding templates, documents and images.
    #[arg(long = "data-dir", value_name = "PATH", value_hint = ValueHint::DirPath, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render markdown and print (or write) the exported HTML.
    Export(ExportArgs),
    /// Render markdown for the target editor and put it on the clipboard.
    Copy(CopyArgs),
    /// Print the scoped CSS a template contributes to the live preview.
    #[command(name = "preview-css")]
    PreviewCss(PreviewCssArgs),
    /// Manage style templates.
    #[command(subcommand)]
    Templates(TemplatesCommand),
    /// Manage saved documents.
    #[command(subcommand)]
    Documents(DocumentsCommand),
    /// Manage stored images referenced as `local://<id>`.
    #[command(subcommand)]
    Images(ImagesCommand),
}

/// Where the markdown comes from: a file (`-` for stdin) or a saved document.
#[derive(Debug, Args, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Markdown file to render; `-` reads stdin.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Render a saved document instead of a file.
    #[arg(long = "document", value_name = "ID")]
    pub document: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Output flavor: content, full or target.
    #[arg(
        long,
        value_name = "MODE",
        default_value = "target",
        value_parser = ["content", "full", "target"]
    )]
    pub mode: String,

    /// Template to style with; defaults to the document's or the default template.
    #[arg(long = "template", value_name = "ID")]
    pub template: Option<String>,

    /// Write the result here instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CopyArgs {
    /// Template to style with; defaults to the document's or the default template.
    #[arg(long = "template", value_name = "ID")]
    pub template: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Args, Clone, Default)]
pub struct PreviewCssArgs {
    /// Template to print; defaults to the default template.
    #[arg(long = "template", value_name = "ID")]
    pub template: Option<String>,
}

/// Explicit confirmation for commands that delete data.
#[derive(Debug, Args, Clone, Copy, Default)]
pub struct ConfirmArgs {
    /// Confirm the deletion.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub yes: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TemplatesCommand {
    /// List built-in and custom templates.
    List,
    /// Print one template, CSS included.
    Show { id: String },
    /// Save a custom template from a CSS file.
    Create {
        #[arg(long, value_name = "NAME")]
        name: String,
        #[arg(long = "css-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
        css_file: PathBuf,
    },
    /// Rename a custom template or replace its CSS.
    Update {
        id: String,
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long = "css-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
        css_file: Option<PathBuf>,
    },
    /// Delete a custom template.
    Delete {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Make a template the default.
    #[command(name = "set-default")]
    SetDefault { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum DocumentsCommand {
    /// List saved documents.
    List,
    /// Create a document, optionally from a markdown file; it becomes current.
    Create {
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    /// Print a document's markdown; defaults to the current document.
    Show { id: Option<String> },
    /// Rename a document.
    Rename { id: String, name: String },
    /// Replace a document's markdown with a file's contents.
    Update {
        id: String,
        #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Make a document current.
    Select { id: String },
    /// Attach a template to a document, or detach it when omitted.
    #[command(name = "set-template")]
    SetTemplate { id: String, template: Option<String> },
    /// Delete a document.
    Delete {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImagesCommand {
    /// Store an image file and print its `local://` reference.
    Add {
        #[arg(value_name = "PATH", value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long, value_name = "MIME")]
        mime: Option<String>,
    },
    /// List stored images.
    List,
    /// Delete one image.
    Delete {
        id: String,
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Delete every stored image.
    Clear {
        #[command(flatten)]
        confirm: ConfirmArgs,
    },
    /// Show storage usage.
    Stats,
}
