use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{
        documents::DocumentError, export::ExportError, images::ImageError, repos::RepoError,
        templates::TemplateError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// An error flattened into its message chain, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn joined(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(err)
            | AppError::Template(TemplateError::Domain(err))
            | AppError::Document(DocumentError::Domain(err))
            | AppError::Image(ImageError::Domain(err)) => Some(err),
            AppError::Export(ExportError::Template(TemplateError::Domain(err))) => Some(err),
            _ => None,
        }
    }

    /// Short, actionable message for the person at the terminal.
    pub fn presentation_message(&self) -> &'static str {
        if let Some(domain) = self.domain() {
            return match domain {
                DomainError::NotFound { .. } => "Nothing with that id exists",
                DomainError::Validation { .. } => "Request could not be processed",
                DomainError::Limit { .. } => "Storage limit reached",
            };
        }
        match self {
            AppError::Validation(_) => "Request could not be processed",
            AppError::Export(ExportError::EmptyOutput) => "No content to copy",
            AppError::Export(ExportError::Clipboard(_)) => "Copy failed, retry",
            AppError::Export(ExportError::Render(_)) => "Markdown could not be rendered",
            AppError::Repo(_)
            | AppError::Template(TemplateError::Repo(_))
            | AppError::Document(DocumentError::Repo(_))
            | AppError::Image(ImageError::Repo(_))
            | AppError::Export(ExportError::Template(TemplateError::Repo(_))) => {
                "Stored data could not be read or written"
            }
            AppError::Infra(InfraError::Configuration { .. }) => "Configuration is invalid",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure",
            _ => "Unexpected error occurred",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
