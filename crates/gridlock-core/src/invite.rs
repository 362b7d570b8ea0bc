//! Invite records: a proposal from one identity to another to start a
//! session.
//!
//! Resolution is one-way: `Pending → Accepted` or `Pending → Declined`,
//! never reversed. An accepted invite yields exactly one new session (the
//! matchmaker's responsibility; the record itself only tracks status).

use serde::{Deserialize, Serialize};

use crate::{error::EngineError, player::PlayerId};

/// Unique invite identifier (random, hex-rendered in logs).
pub type InviteId = u64;

/// Lifecycle stage of an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    /// Awaiting the recipient's decision.
    Pending,
    /// Recipient accepted; a session was created.
    Accepted,
    /// Recipient declined.
    Declined,
}

/// Durable record of one invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Unique identifier.
    pub id: InviteId,
    /// Identity that sent the invite (plays X if accepted).
    pub from: PlayerId,
    /// Identity the invite is addressed to (plays O if accepted).
    pub to: PlayerId,
    /// Lifecycle stage.
    pub status: InviteStatus,
    /// Unix milliseconds at creation.
    pub created_at_ms: u64,
    /// Unix milliseconds at resolution, `None` while pending.
    pub resolved_at_ms: Option<u64>,
}

impl Invite {
    /// Create a pending invite.
    pub fn new(
        id: InviteId,
        from: impl Into<PlayerId>,
        to: impl Into<PlayerId>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            from: from.into(),
            to: to.into(),
            status: InviteStatus::Pending,
            created_at_ms: now_ms,
            resolved_at_ms: None,
        }
    }

    /// Whether the invite still awaits a decision.
    pub fn is_pending(&self) -> bool {
        self.status == InviteStatus::Pending
    }

    /// Resolve the invite one way or the other.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyResolved`] if the invite is not pending; the
    /// record is unchanged.
    pub fn resolve(&mut self, accept: bool, now_ms: u64) -> Result<(), EngineError> {
        if !self.is_pending() {
            return Err(EngineError::AlreadyResolved(self.id));
        }

        self.status = if accept { InviteStatus::Accepted } else { InviteStatus::Declined };
        self.resolved_at_ms = Some(now_ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_invite_is_pending() {
        let invite = Invite::new(7, "alice", "bob", 100);
        assert!(invite.is_pending());
        assert_eq!(invite.resolved_at_ms, None);
    }

    #[test]
    fn accept_records_status_and_time() {
        let mut invite = Invite::new(7, "alice", "bob", 100);
        invite.resolve(true, 250).unwrap();

        assert_eq!(invite.status, InviteStatus::Accepted);
        assert_eq!(invite.resolved_at_ms, Some(250));
    }

    #[test]
    fn decline_records_status() {
        let mut invite = Invite::new(7, "alice", "bob", 100);
        invite.resolve(false, 250).unwrap();
        assert_eq!(invite.status, InviteStatus::Declined);
    }

    #[test]
    fn resolution_is_one_way() {
        let mut invite = Invite::new(7, "alice", "bob", 100);
        invite.resolve(false, 250).unwrap();
        let before = invite.clone();

        let err = invite.resolve(true, 300).unwrap_err();
        assert_eq!(err, EngineError::AlreadyResolved(7));
        assert_eq!(invite, before);
    }
}
