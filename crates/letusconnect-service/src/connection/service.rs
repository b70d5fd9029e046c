//! Connection graph service.

use std::sync::Arc;

use tracing::info;

use letusconnect_core::config::ConnectionsConfig;
use letusconnect_core::events::{ConnectionEvent, DomainEvent, EventPayload};
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::Clock;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::connection::{
    Connection, ConnectionRequest, PeerState, SentRequest, UserConnections,
};
use letusconnect_store::ConnectionRepository;

use super::transitions::{self, Decision};
use super::validation::{PairInput, UidInput, check_message};
use crate::dispatch::EventDispatcher;
use crate::identity::IdentityResolver;

/// Maintains the per-user connection documents.
///
/// Every bilateral operation reads and writes both users' documents in a
/// single transaction; events are dispatched only after it commits.
#[derive(Debug, Clone)]
pub struct ConnectionGraphService {
    /// Connection document repository.
    repo: Arc<ConnectionRepository>,
    /// Display-name lookups.
    identity: Arc<dyn IdentityResolver>,
    /// Post-commit event hand-off.
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
    config: ConnectionsConfig,
}

impl ConnectionGraphService {
    /// Creates a new connection graph service.
    pub fn new(
        repo: Arc<ConnectionRepository>,
        identity: Arc<dyn IdentityResolver>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock>,
        config: ConnectionsConfig,
    ) -> Self {
        Self {
            repo,
            identity,
            dispatcher,
            clock,
            config,
        }
    }

    /// Returns the connection document of `uid`, creating an empty one on first access.
    pub async fn get_connections(&self, uid: &Uid) -> AppResult<UserConnections> {
        UidInput::new(uid).check()?;
        self.repo.get_or_create(uid, self.clock.now()).await
    }

    /// Sends a connection request from `from` to `to`.
    pub async fn send_request(&self, from: &Uid, to: &Uid, message: &str) -> AppResult<SentRequest> {
        PairInput::new(from, to).check()?;
        check_message(message, self.config.max_message_length)?;
        let from_name = self.display_name(from).await?;
        self.display_name(to).await?;

        let cooldown = self.config.rerequest_cooldown();
        let now = self.clock.now();
        let name = from_name.as_str();
        let sent = self
            .repo
            .update_pair("connections.send_request", from, to, now, |a, b| {
                transitions::send(a, b, name, message, cooldown, now)
            })
            .await?;
        info!(uid = %from, peer = %to, "Connection request sent");

        self.emit(
            from,
            ConnectionEvent::RequestSent {
                from: from.clone(),
                from_name,
                to: to.clone(),
                message: message.to_string(),
            },
        )
        .await;
        Ok(sent)
    }

    /// `to` accepts the pending request sent by `from`.
    ///
    /// Accepting an already accepted request succeeds without a second event.
    pub async fn accept_request(&self, from: &Uid, to: &Uid) -> AppResult<()> {
        PairInput::new(from, to).check()?;
        let to_name = self.display_name(to).await?;
        let now = self.clock.now();
        let name = to_name.as_str();
        let decision = self
            .repo
            .update_pair("connections.accept_request", from, to, now, |a, b| {
                transitions::accept(a, b, name, now)
            })
            .await?;
        if decision == Decision::AlreadyApplied {
            return Ok(());
        }
        info!(uid = %to, peer = %from, "Connection request accepted");

        self.emit(
            to,
            ConnectionEvent::RequestAccepted {
                from: from.clone(),
                to: to.clone(),
                to_name,
            },
        )
        .await;
        Ok(())
    }

    /// `to` declines the pending request sent by `from`.
    pub async fn reject_request(&self, from: &Uid, to: &Uid) -> AppResult<()> {
        PairInput::new(from, to).check()?;
        // Nothing may fail once the reject has committed.
        let to_name = if self.config.notify_on_reject {
            Some(self.display_name(to).await?)
        } else {
            None
        };
        let now = self.clock.now();
        let decision = self
            .repo
            .update_pair("connections.reject_request", from, to, now, |a, b| {
                transitions::reject(a, b, now)
            })
            .await?;
        if decision == Decision::AlreadyApplied {
            return Ok(());
        }
        info!(uid = %to, peer = %from, "Connection request rejected");

        if let Some(to_name) = to_name {
            self.emit(
                to,
                ConnectionEvent::RequestRejected {
                    from: from.clone(),
                    to: to.clone(),
                    to_name,
                },
            )
            .await;
        }
        Ok(())
    }

    /// `from` takes back a request that `to` has not answered yet.
    pub async fn withdraw_request(&self, from: &Uid, to: &Uid) -> AppResult<()> {
        PairInput::new(from, to).check()?;
        let now = self.clock.now();
        let decision = self
            .repo
            .update_pair("connections.withdraw_request", from, to, now, |a, b| {
                transitions::withdraw(a, b, now)
            })
            .await?;
        if decision == Decision::Applied {
            info!(uid = %from, peer = %to, "Connection request withdrawn");
        }
        Ok(())
    }

    /// Removes the connection between `a` and `b`. Removing a missing connection succeeds.
    pub async fn remove_connection(&self, a: &Uid, b: &Uid) -> AppResult<()> {
        PairInput::new(a, b).check()?;
        let removed = self
            .repo
            .update_pair("connections.remove", a, b, self.clock.now(), |doc_a, doc_b| {
                Ok(transitions::remove(doc_a, doc_b))
            })
            .await?;
        if removed {
            info!(uid = %a, peer = %b, "Connection removed");
        }
        Ok(())
    }

    /// `uid` blocks `target`, dropping any connection or request between them.
    pub async fn block_user(&self, uid: &Uid, target: &Uid) -> AppResult<()> {
        PairInput::new(uid, target).check()?;
        let target_name = self.display_name(target).await?;
        let now = self.clock.now();
        let name = target_name.as_str();
        let changed = self
            .repo
            .update_pair("connections.block", uid, target, now, |a, b| {
                Ok(transitions::block(a, b, name, now))
            })
            .await?;
        if changed {
            info!(uid = %uid, peer = %target, "User blocked");
        }
        Ok(())
    }

    /// Lifts a block `uid` placed on `target`.
    pub async fn unblock_user(&self, uid: &Uid, target: &Uid) -> AppResult<()> {
        PairInput::new(uid, target).check()?;
        let changed = self
            .repo
            .update_pair("connections.unblock", uid, target, self.clock.now(), |a, b| {
                Ok(transitions::unblock(a, b))
            })
            .await?;
        if changed {
            info!(uid = %uid, peer = %target, "User unblocked");
        }
        Ok(())
    }

    /// Active connections of `uid`.
    pub async fn list_connections(&self, uid: &Uid) -> AppResult<Vec<Connection>> {
        Ok(self
            .find(uid)
            .await?
            .map(|doc| {
                doc.connections
                    .into_values()
                    .filter(Connection::is_active)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Requests waiting for an answer from `uid`.
    pub async fn list_pending(&self, uid: &Uid) -> AppResult<Vec<ConnectionRequest>> {
        Ok(self
            .find(uid)
            .await?
            .map(|doc| doc.pending_requests.into_values().collect())
            .unwrap_or_default())
    }

    /// Requests `uid` sent, whatever their outcome.
    pub async fn list_sent(&self, uid: &Uid) -> AppResult<Vec<SentRequest>> {
        Ok(self
            .find(uid)
            .await?
            .map(|doc| doc.sent_requests.into_values().collect())
            .unwrap_or_default())
    }

    /// How `peer` relates to `uid`, from `uid`'s point of view.
    pub async fn connection_status(&self, uid: &Uid, peer: &Uid) -> AppResult<PeerState> {
        Ok(self
            .find(uid)
            .await?
            .map_or(PeerState::None, |doc| doc.peer_state(peer)))
    }

    /// Users actively connected to both `a` and `b`.
    pub async fn mutual_connections(&self, a: &Uid, b: &Uid) -> AppResult<Vec<Uid>> {
        let (Some(doc_a), Some(doc_b)) = (self.find(a).await?, self.find(b).await?) else {
            return Ok(Vec::new());
        };
        Ok(doc_a
            .active_peers()
            .filter(|peer| doc_b.is_connected_to(peer))
            .cloned()
            .collect())
    }

    async fn find(&self, uid: &Uid) -> AppResult<Option<UserConnections>> {
        UidInput::new(uid).check()?;
        self.repo.find(uid).await
    }

    async fn display_name(&self, uid: &Uid) -> AppResult<String> {
        Ok(self.identity.get_user(uid).await?.name().to_string())
    }

    async fn emit(&self, actor: &Uid, event: ConnectionEvent) {
        let event = DomainEvent::new(
            Some(actor.clone()),
            self.clock.now(),
            EventPayload::Connection(event),
        );
        self.dispatcher.dispatch(event).await;
    }
}
