//! Input checks for connection-graph operations.

use validator::{Validate, ValidationError};

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;

/// The two parties of a bilateral operation.
#[derive(Debug, Validate)]
pub struct PairInput<'a> {
    /// Acting or requesting user.
    #[validate(length(min = 1, max = 128), custom(function = "validate_uid"))]
    pub from: &'a str,
    /// The other user.
    #[validate(length(min = 1, max = 128), custom(function = "validate_uid"))]
    pub to: &'a str,
}

impl<'a> PairInput<'a> {
    /// Borrow both uids.
    pub fn new(from: &'a Uid, to: &'a Uid) -> Self {
        Self {
            from: from.as_str(),
            to: to.as_str(),
        }
    }

    /// Run field checks, then reject self-pairs.
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::invalid_argument(format!("Invalid input: {e}")))?;
        if self.from == self.to {
            return Err(AppError::invalid_argument(
                "A user cannot connect with themselves",
            ));
        }
        Ok(())
    }
}

/// A single uid argument.
#[derive(Debug, Validate)]
pub struct UidInput<'a> {
    /// The user the operation reads.
    #[validate(length(min = 1, max = 128), custom(function = "validate_uid"))]
    pub uid: &'a str,
}

impl<'a> UidInput<'a> {
    /// Borrow the uid.
    pub fn new(uid: &'a Uid) -> Self {
        Self { uid: uid.as_str() }
    }

    /// Run field checks.
    pub fn check(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::invalid_argument(format!("Invalid input: {e}")))
    }
}

// Uids end up in dotted field paths such as `readStatus.{uid}`.
fn validate_uid(uid: &str) -> Result<(), ValidationError> {
    if uid.contains('.') || uid.trim() != uid {
        return Err(ValidationError::new("uid_format"));
    }
    Ok(())
}

/// Bound the free-text message attached to a request.
pub fn check_message(message: &str, max_length: u64) -> AppResult<()> {
    let length = message.chars().count() as u64;
    if length > max_length {
        return Err(AppError::invalid_argument(format!(
            "Request message is {length} characters; the limit is {max_length}"
        )));
    }
    Ok(())
}
