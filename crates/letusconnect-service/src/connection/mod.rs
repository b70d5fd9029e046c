//! Connection graph: requests, connections and blocks between users.

pub mod service;
pub mod transitions;
pub mod validation;

pub use service::ConnectionGraphService;
