//! Mapping of sqlx errors into the application taxonomy.

use rpidrive_core::error::{AppError, ErrorKind};

/// Convert a sqlx error, classifying integrity violations as conflicts.
pub fn db_error(context: &str, e: sqlx::Error) -> AppError {
    let integrity = e.as_database_error().is_some_and(|db| {
        db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
    });
    if integrity {
        AppError::with_source(ErrorKind::Conflict, format!("{context}: integrity violation"), e)
    } else {
        AppError::with_source(ErrorKind::Database, context.to_string(), e)
    }
}
