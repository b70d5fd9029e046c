//! Pure state changes applied to a pair of connection documents.
//!
//! Each function receives both documents as loaded inside one transaction
//! and either mutates them or fails without touching them. The service
//! re-runs them on fresh state after contention, so they must not depend
//! on anything but their arguments.

use chrono::{DateTime, Duration, Utc};

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::connection::{
    Connection, ConnectionRequest, ConnectionStatus, RequestStatus, SentRequest, SentRequestStatus,
    UserConnections,
};

/// Outcome of a decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request was pending and is now resolved.
    Applied,
    /// The request had already been resolved the same way.
    AlreadyApplied,
}

/// Record a new request from `from` to `to`.
pub fn send(
    from: &mut UserConnections,
    to: &mut UserConnections,
    from_name: &str,
    message: &str,
    cooldown: Option<Duration>,
    now: DateTime<Utc>,
) -> AppResult<SentRequest> {
    if from.is_connected_to(&to.uid) {
        return Err(AppError::already_exists(format!(
            "{} and {} are already connected",
            from.uid, to.uid
        )));
    }
    if from.has_blocked(&to.uid) || to.has_blocked(&from.uid) {
        return Err(AppError::conflict(format!(
            "Requests between {} and {} are blocked",
            from.uid, to.uid
        )));
    }
    if to.pending_requests.contains_key(&from.uid) {
        return Err(AppError::already_exists(format!(
            "{} already has a pending request from {}",
            to.uid, from.uid
        )));
    }
    if from.pending_requests.contains_key(&to.uid) {
        return Err(AppError::already_exists(format!(
            "{} already sent a request to {}; accept it instead",
            to.uid, from.uid
        )));
    }
    if let (Some(cooldown), Some(previous)) = (cooldown, from.sent_requests.get(&to.uid)) {
        let rejected_at = previous
            .responded_at
            .filter(|_| previous.status == SentRequestStatus::Rejected);
        let cooling = rejected_at
            .is_some_and(|at| at.checked_add_signed(cooldown).is_none_or(|until| now < until));
        if cooling {
            return Err(AppError::conflict(format!(
                "{} recently declined a request from {}",
                to.uid, from.uid
            )));
        }
    }

    let inbound = ConnectionRequest {
        from_uid: from.uid.clone(),
        from_name: from_name.to_string(),
        to_uid: to.uid.clone(),
        sent_at: now,
        message: message.to_string(),
        status: RequestStatus::Pending,
    };
    let sent = SentRequest {
        to_uid: to.uid.clone(),
        sent_at: now,
        message: message.to_string(),
        status: SentRequestStatus::Pending,
        accepted: None,
        responded_at: None,
    };
    to.pending_requests.insert(from.uid.clone(), inbound);
    from.sent_requests.insert(to.uid.clone(), sent.clone());
    Ok(sent)
}

/// Turn the pending request from `from` to `to` into a connection on both sides.
pub fn accept(
    from: &mut UserConnections,
    to: &mut UserConnections,
    to_name: &str,
    now: DateTime<Utc>,
) -> AppResult<Decision> {
    let Some(request) = to.pending_requests.remove(&from.uid) else {
        return missing_request(from, to, SentRequestStatus::Accepted);
    };
    from.connections.insert(
        to.uid.clone(),
        Connection {
            target_uid: to.uid.clone(),
            target_name: to_name.to_string(),
            sent_at: request.sent_at,
            accepted_at: Some(now),
            status: ConnectionStatus::Active,
        },
    );
    to.connections.insert(
        from.uid.clone(),
        Connection {
            target_uid: from.uid.clone(),
            target_name: request.from_name,
            sent_at: request.sent_at,
            accepted_at: Some(now),
            status: ConnectionStatus::Active,
        },
    );
    resolve_sent(from, to, SentRequestStatus::Accepted, now);
    Ok(Decision::Applied)
}

/// Decline the pending request from `from` to `to`.
pub fn reject(
    from: &mut UserConnections,
    to: &mut UserConnections,
    now: DateTime<Utc>,
) -> AppResult<Decision> {
    if to.pending_requests.remove(&from.uid).is_none() {
        return missing_request(from, to, SentRequestStatus::Rejected);
    }
    resolve_sent(from, to, SentRequestStatus::Rejected, now);
    Ok(Decision::Applied)
}

/// Take back the pending request from `from` to `to`.
pub fn withdraw(
    from: &mut UserConnections,
    to: &mut UserConnections,
    now: DateTime<Utc>,
) -> AppResult<Decision> {
    if to.pending_requests.remove(&from.uid).is_none() {
        return missing_request(from, to, SentRequestStatus::Withdrawn);
    }
    resolve_sent(from, to, SentRequestStatus::Withdrawn, now);
    Ok(Decision::Applied)
}

fn resolve_sent(
    from: &mut UserConnections,
    to: &UserConnections,
    status: SentRequestStatus,
    now: DateTime<Utc>,
) {
    if let Some(sent) = from.sent_requests.get_mut(&to.uid) {
        sent.resolve(status, now);
    }
}

// The inbound entry is gone: either someone already decided, or there never was one.
fn missing_request(
    from: &UserConnections,
    to: &UserConnections,
    intended: SentRequestStatus,
) -> AppResult<Decision> {
    match from.sent_requests.get(&to.uid).map(|s| s.status) {
        Some(status) if status == intended => {
            if intended == SentRequestStatus::Accepted && !from.is_connected_to(&to.uid) {
                return Err(AppError::conflict(format!(
                    "Request from {} to {} was accepted but the connection is gone",
                    from.uid, to.uid
                )));
            }
            Ok(Decision::AlreadyApplied)
        }
        Some(status) if status.is_terminal() => Err(AppError::conflict(format!(
            "Request from {} to {} was already {status}",
            from.uid, to.uid
        ))),
        _ if from.pending_requests.contains_key(&to.uid) => Err(AppError::unauthorized(format!(
            "The pending request between {} and {} was sent by {}",
            from.uid, to.uid, to.uid
        ))),
        _ => Err(AppError::not_found(format!(
            "No pending request from {} to {}",
            from.uid, to.uid
        ))),
    }
}

/// Drop the active connection between `a` and `b`. Returns whether anything changed.
pub fn remove(a: &mut UserConnections, b: &mut UserConnections) -> bool {
    let removed_a = drop_active(a, b);
    let removed_b = drop_active(b, a);
    removed_a || removed_b
}

fn drop_active(owner: &mut UserConnections, peer: &UserConnections) -> bool {
    if !owner.is_connected_to(&peer.uid) {
        return false;
    }
    owner.connections.remove(&peer.uid);
    if owner
        .sent_requests
        .get(&peer.uid)
        .is_some_and(|s| s.status == SentRequestStatus::Accepted)
    {
        owner.sent_requests.remove(&peer.uid);
    }
    true
}

/// `blocker` blocks `target`: connections and pending requests in both
/// directions are dropped. Returns whether anything changed.
pub fn block(
    blocker: &mut UserConnections,
    target: &mut UserConnections,
    target_name: &str,
    now: DateTime<Utc>,
) -> bool {
    if blocker.has_blocked(&target.uid) {
        return false;
    }
    remove(blocker, target);
    if blocker.pending_requests.remove(&target.uid).is_some() {
        resolve_pending_sent(target, &blocker.uid, SentRequestStatus::Rejected, now);
    }
    if target.pending_requests.remove(&blocker.uid).is_some() {
        resolve_pending_sent(blocker, &target.uid, SentRequestStatus::Withdrawn, now);
    }
    blocker.connections.insert(
        target.uid.clone(),
        Connection {
            target_uid: target.uid.clone(),
            target_name: target_name.to_string(),
            sent_at: now,
            accepted_at: None,
            status: ConnectionStatus::Blocked,
        },
    );
    true
}

fn resolve_pending_sent(
    owner: &mut UserConnections,
    peer: &Uid,
    status: SentRequestStatus,
    now: DateTime<Utc>,
) {
    if let Some(sent) = owner
        .sent_requests
        .get_mut(peer)
        .filter(|s| s.status == SentRequestStatus::Pending)
    {
        sent.resolve(status, now);
    }
}

/// Lift a block placed by `blocker`. Returns whether anything changed.
pub fn unblock(blocker: &mut UserConnections, target: &UserConnections) -> bool {
    if !blocker.has_blocked(&target.uid) {
        return false;
    }
    blocker.connections.remove(&target.uid);
    true
}
