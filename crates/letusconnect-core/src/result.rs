//! Convenience result type alias for LetUsConnect.

use crate::error::AppError;

/// A specialized `Result` type for LetUsConnect operations.
pub type AppResult<T> = Result<T, AppError>;
