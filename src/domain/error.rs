use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: String },
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("{resource} limit reached: {message}")]
    Limit {
        resource: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn limit(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Limit {
            resource,
            message: message.into(),
        }
    }
}
