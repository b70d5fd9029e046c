//! Delivery failure classification.

use letusconnect_core::error::{AppError, ErrorKind};

/// Why a delivery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Network failure, timeout, throttling or a 5xx; worth retrying.
    #[error("retryable delivery failure: {0}")]
    Retryable(String),
    /// Validation or authorization failure; retrying cannot help.
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl DeliveryError {
    /// Whether the attempt may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        let kind = match err {
            DeliveryError::Retryable(_) => ErrorKind::AdapterRetryable,
            DeliveryError::Permanent(_) => ErrorKind::AdapterPermanent,
        };
        AppError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_adapter_kinds() {
        let retry: AppError = DeliveryError::Retryable("503".into()).into();
        assert_eq!(retry.kind, ErrorKind::AdapterRetryable);
        let perm: AppError = DeliveryError::Permanent("400".into()).into();
        assert_eq!(perm.kind, ErrorKind::AdapterPermanent);
    }
}
