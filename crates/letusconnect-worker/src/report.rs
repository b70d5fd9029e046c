//! Summary of one scheduler tick.

use serde::Serialize;

/// What a single tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Notifications the tick found due or with a lapsed lease.
    pub due: usize,
    /// Notifications this instance leased.
    pub claimed: usize,
    /// Delivered and marked `sent`.
    pub sent: usize,
    /// Put back to `pending` after a retryable failure.
    pub retried: usize,
    /// Marked `failed`.
    pub failed: usize,
    /// Expired before dispatch and marked `cancelled`.
    pub cancelled: usize,
    /// Skipped because another instance holds them or the store call failed.
    pub skipped: usize,
}

impl TickReport {
    /// Whether the tick had nothing to do.
    pub fn is_idle(&self) -> bool {
        self.due == 0
    }
}
