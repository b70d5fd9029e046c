//! Connection graph domain entities.

pub mod model;
pub mod request;
pub mod status;

pub use model::{Connection, USER_CONNECTIONS_COLLECTION, UserConnections};
pub use request::{ConnectionRequest, SentRequest};
pub use status::{ConnectionStatus, PeerState, RequestStatus, SentRequestStatus};
