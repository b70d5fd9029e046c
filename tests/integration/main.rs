//! End-to-end scenarios against the in-memory store, an in-memory identity
//! directory and scripted delivery adapters.

mod helpers;

mod connection_test;
mod laws_test;
mod notification_test;
mod scheduler_test;
