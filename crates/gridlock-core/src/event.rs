//! Events produced by state-mutating operations.
//!
//! The engine never performs delivery. Operations return [`Notice`]s —
//! (recipient identity, event) pairs — and the transport layer resolves
//! recipients through the presence ledger, dropping anyone not currently
//! reachable. No acknowledgement, no retry: clients that miss an event
//! re-fetch the authoritative record by identifier.

use serde::{Deserialize, Serialize};

use crate::{
    board::Slot,
    invite::InviteId,
    player::{PlayerId, PlayerProfile},
    session::{Outcome, Session, SessionId},
};

/// A push event addressed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A move was applied; carries the full updated session record so
    /// clients need no follow-up fetch.
    MoveMade {
        /// Updated session record.
        session: Session,
        /// Slot the mark was placed on.
        slot: Slot,
        /// Identity that moved.
        actor: PlayerId,
    },

    /// The finishing transition of a session. Sent in addition to the final
    /// `MoveMade`, to both participants.
    SessionFinished {
        /// Session that finished.
        session_id: SessionId,
        /// Terminal result; `Won` carries the completed line.
        outcome: Outcome,
    },

    /// A new invite addressed to the recipient.
    GameInvite {
        /// Invite identifier, used to resolve it.
        invite_id: InviteId,
        /// Sender's profile.
        from: PlayerProfile,
    },

    /// Sent to the invite's sender when the recipient accepts.
    InviteAccepted {
        /// The newly created session (sender plays X).
        session_id: SessionId,
        /// Recipient's profile.
        opponent: PlayerProfile,
    },

    /// Sent to the invite's recipient when they accept.
    SessionStarted {
        /// The newly created session (recipient plays O).
        session_id: SessionId,
        /// Sender's profile.
        opponent: PlayerProfile,
    },

    /// A player's reachability changed. Broadcast to everyone connected.
    PlayerStatusChanged {
        /// The player in question.
        player: PlayerId,
        /// `true` when the player came online, `false` on disconnect.
        online: bool,
    },

    /// Snapshot of currently reachable players, sent to a newly connected
    /// client. Later changes arrive as `PlayerStatusChanged`.
    OnlineRoster {
        /// Profiles of everyone currently online.
        players: Vec<PlayerProfile>,
    },
}

/// An event addressed to one identity.
///
/// Delivery is best-effort: if the recipient is offline when the transport
/// layer looks them up, the notice is dropped silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Identity the event is addressed to.
    pub recipient: PlayerId,
    /// The event itself.
    pub event: Event,
}

impl Notice {
    /// Address an event to one identity.
    pub fn new(recipient: impl Into<PlayerId>, event: Event) -> Self {
        Self { recipient: recipient.into(), event }
    }
}
