//! Convenience result type alias for RPi Drive.

use crate::error::AppError;

/// A specialized `Result` type for RPi Drive operations.
pub type AppResult<T> = Result<T, AppError>;
