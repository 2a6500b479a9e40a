pub mod documents;
pub mod export;
pub mod images;
pub mod templates;

use inkpress::{application::error::AppError, config::ConfirmArgs};

/// Destructive commands only run with `--yes`.
fn require_confirmation(confirm: ConfirmArgs, action: &str) -> Result<(), AppError> {
    if confirm.yes {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "refusing to {action} without --yes"
        )))
    }
}
