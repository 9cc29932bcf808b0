pub mod auth;
pub mod calendar;
pub mod events;

use crate::error::{AppError, AppResult};
use crate::models::COUNTRY_NAMES;

/// Lines to show the user for a failed command: one per field for
/// validation failures, otherwise the error's code and status message.
pub fn error_lines(err: &AppError) -> Vec<String> {
    match err.validation_errors() {
        Some(errors) => errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect(),
        None => vec![format!("error[{}]: {}", err.code(), err.status_message())],
    }
}

/// Convert a one-based month from the command line to a grid index.
pub fn month_arg(month: u32) -> AppResult<usize> {
    if (1..=12).contains(&month) {
        Ok(month as usize - 1)
    } else {
        Err(AppError::NotFound(format!(
            "month {} (expected 1 to 12)",
            month
        )))
    }
}

pub fn country_name(id: u8) -> &'static str {
    COUNTRY_NAMES.get(id as usize).copied().unwrap_or("Unknown")
}
