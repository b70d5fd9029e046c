//! Background delivery of queued notifications for LetUsConnect.
//!
//! This crate provides:
//! - A scheduler that wakes on a fixed tick, leases due notifications and
//!   hands them to the delivery adapters
//! - Per-recipient fan-out with address resolution per channel
//! - Lease renewal so a slow fan-out is never claimed twice
//! - Tick reports for logging and tests

pub mod fanout;
pub mod lease;
pub mod report;
pub mod scheduler;

pub use report::TickReport;
pub use scheduler::NotificationScheduler;
