//! Per-call deadlines for store operations.

use std::future::Future;
use std::time::Duration;

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;

/// Run `fut` under `deadline`, surfacing expiry as a `Timeout` error.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(format!(
            "{operation} exceeded its deadline of {}ms",
            deadline.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letusconnect_core::ErrorKind;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, AppError>(())
        };
        let err = with_deadline(Duration::from_secs(10), "store.get", slow)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("store.get"));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let value = with_deadline(Duration::from_secs(1), "store.get", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
