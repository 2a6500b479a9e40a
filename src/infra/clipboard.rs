//! System clipboard adapter backed by external programs.

use std::{
    ffi::OsString,
    io::{self, ErrorKind, Write},
    path::PathBuf,
    process::{Command, Stdio},
    time::Instant,
};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ClipboardSettings;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("nothing to copy")]
    Empty,
    #[error("failed to talk to `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("clipboard program `{program}` not found")]
    NotFound {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` failed (exit {exit_code:?}): {stderr}")]
    Cli {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("clipboard unavailable; html: {primary}; plain text: {fallback}")]
    Unavailable {
        primary: Box<ClipboardError>,
        fallback: Box<ClipboardError>,
    },
}

/// What gets placed on the clipboard: a rich HTML flavor and a plain one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub html: String,
    pub plain: String,
}

impl ClipboardPayload {
    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty() && self.plain.trim().is_empty()
    }
}

pub trait ClipboardWriter: Send + Sync {
    fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;
}

/// A program plus its arguments; the payload is fed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ClipboardCommand {
    pub fn new<I, A>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn display(&self) -> String {
        self.program.display().to_string()
    }

    fn pipe(&self, input: &str) -> Result<(), ClipboardError> {
        let program = self.display();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    ClipboardError::NotFound {
                        program: program.clone(),
                        source,
                    }
                } else {
                    ClipboardError::Io {
                        program: program.clone(),
                        source,
                    }
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input.as_bytes()) {
                Ok(()) => {}
                // The exit status below says whether the program was happy.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                Err(source) => {
                    return Err(ClipboardError::Io {
                        program: program.clone(),
                        source,
                    });
                }
            }
        }

        let output = child.wait_with_output().map_err(|source| ClipboardError::Io {
            program: program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ClipboardError::Cli {
                program,
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Writes HTML through the primary program, falling back to plain text.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    primary: ClipboardCommand,
    fallback: ClipboardCommand,
}

impl CommandClipboard {
    pub fn new(primary: ClipboardCommand, fallback: ClipboardCommand) -> Self {
        Self { primary, fallback }
    }
}

impl From<&ClipboardSettings> for CommandClipboard {
    fn from(settings: &ClipboardSettings) -> Self {
        Self::new(
            ClipboardCommand::new(&settings.html_program, &settings.html_args),
            ClipboardCommand::new(&settings.text_program, &settings.text_args),
        )
    }
}

impl ClipboardWriter for CommandClipboard {
    fn write(&self, payload: &ClipboardPayload) -> Result<(), ClipboardError> {
        if payload.is_empty() {
            return Err(ClipboardError::Empty);
        }
        let started_at = Instant::now();

        let primary = match self.primary.pipe(&payload.html) {
            Ok(()) => {
                info!(
                    target = "infra::clipboard",
                    op = "clipboard::write",
                    result = "ok",
                    flavor = "html",
                    program = %self.primary.display(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "copied to clipboard"
                );
                return Ok(());
            }
            Err(err) => err,
        };

        warn!(
            target = "infra::clipboard",
            op = "clipboard::write",
            result = "fallback",
            program = %self.primary.display(),
            error = %primary,
            "html clipboard write failed; trying plain text"
        );

        match self.fallback.pipe(&payload.plain) {
            Ok(()) => {
                info!(
                    target = "infra::clipboard",
                    op = "clipboard::write",
                    result = "ok",
                    flavor = "plain",
                    program = %self.fallback.display(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "copied to clipboard"
                );
                Ok(())
            }
            Err(fallback) => {
                warn!(
                    target = "infra::clipboard",
                    op = "clipboard::write",
                    result = "error",
                    program = %self.fallback.display(),
                    error = %fallback,
                    "plain text clipboard write failed"
                );
                Err(ClipboardError::Unavailable {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })
            }
        }
    }
}
