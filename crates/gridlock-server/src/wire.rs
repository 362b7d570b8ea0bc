//! Wire protocol: length-prefixed CBOR messages.
//!
//! Every frame is a 4-byte big-endian length prefix followed by a CBOR body.
//! Requests (client → server) and [`ServerMessage`]s (server → client) are
//! self-describing tagged enums, so the prefix carries no opcode — the
//! server decodes every request anyway.
//!
//! # Invariants
//!
//! - Bodies never exceed [`MAX_FRAME_SIZE`]; enforced on encode and on the
//!   length prefix before a body is read.
//! - Round-trip encoding must produce identical values.

use bytes::BufMut;
use gridlock_core::{
    EngineError, Event, Invite, InviteId, PlayerProfile, Session, SessionId, StatsSnapshot,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Largest accepted frame body, in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Size of the length prefix, in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors from encoding or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Frame body exceeds [`MAX_FRAME_SIZE`].
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Claimed or actual body size.
        size: usize,
        /// The enforced limit.
        max: usize,
    },

    /// CBOR serialization failed.
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
}

/// Client requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Identify this connection and mark the player online.
    Hello {
        /// Opaque identity key.
        player: String,
        /// Display name; an empty string falls back to the identity key.
        display_name: String,
    },

    /// Invite another player to a session.
    CreateInvite {
        /// Recipient identity.
        to: String,
    },

    /// Accept or decline a pending invite.
    ResolveInvite {
        /// The invite to resolve.
        invite_id: InviteId,
        /// `true` to accept, `false` to decline.
        accept: bool,
    },

    /// Place a mark.
    MakeMove {
        /// The session to move in.
        session_id: SessionId,
        /// Raw slot index; validated into a `Slot` before it reaches the
        /// engine.
        slot: u8,
    },

    /// Fetch a session record by identifier.
    FetchSession {
        /// The session to fetch.
        session_id: SessionId,
    },

    /// Fetch pending invites addressed to the calling player.
    FetchPendingInvites,

    /// Fetch a player's profile and cumulative statistics.
    FetchProfile {
        /// The player to fetch.
        player: String,
    },

    /// Fetch the service-wide statistics snapshot.
    FetchStats,

    /// Graceful disconnect.
    Goodbye,
}

/// A pending invite joined with the sender's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInvite {
    /// The invite record.
    pub invite: Invite,
    /// The sender's profile.
    pub from: PlayerProfile,
}

/// Direct replies to requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Response to `Hello`: the caller's profile after the upsert.
    Welcome {
        /// The caller's (possibly freshly created) profile.
        profile: PlayerProfile,
    },

    /// Response to `CreateInvite`.
    InviteCreated {
        /// The pending invite.
        invite: Invite,
    },

    /// Response to `ResolveInvite`.
    InviteResolved {
        /// The resolved invite.
        invite: Invite,
        /// The created session when the invite was accepted.
        session_id: Option<SessionId>,
    },

    /// Response to `FetchSession`.
    SessionState {
        /// The session record.
        session: Session,
    },

    /// Response to `FetchPendingInvites`.
    PendingInvites {
        /// Pending invites addressed to the caller.
        invites: Vec<PendingInvite>,
    },

    /// Response to `FetchProfile`.
    Profile {
        /// The requested profile.
        profile: PlayerProfile,
    },

    /// Response to `FetchStats`.
    Statistics {
        /// Point-in-time service statistics.
        stats: StatsSnapshot,
    },
}

/// A rejected request, delivered to the originating connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Stable numeric code identifying the reason kind.
    pub code: u16,
    /// Human-readable reason.
    pub message: String,
}

impl Rejection {
    /// Unknown session, invite, or player reference.
    pub const NOT_FOUND: u16 = 0x0001;
    /// Operation invalid for the current lifecycle stage.
    pub const ILLEGAL_STATE: u16 = 0x0002;
    /// Target slot already holds a mark.
    pub const SLOT_OCCUPIED: u16 = 0x0003;
    /// Acting player's seat is not to move.
    pub const WRONG_TURN: u16 = 0x0004;
    /// Invite was already accepted or declined.
    pub const ALREADY_RESOLVED: u16 = 0x0005;
    /// Sender and recipient are the same identity.
    pub const SELF_INVITE: u16 = 0x0006;
    /// A durable read or write did not complete.
    pub const STORE_FAILURE: u16 = 0x0007;
    /// Request was malformed (e.g. slot index out of range).
    pub const INVALID_REQUEST: u16 = 0x0008;
    /// The connection has not identified itself with `Hello`.
    pub const HELLO_REQUIRED: u16 = 0x0009;

    /// Malformed request rejection.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { code: Self::INVALID_REQUEST, message: message.into() }
    }

    /// Rejection for identity-dependent requests on anonymous connections.
    pub fn hello_required() -> Self {
        Self { code: Self::HELLO_REQUIRED, message: "identify with hello first".to_owned() }
    }

    /// Generic storage rejection. Details are logged server-side, not
    /// leaked to the caller.
    pub fn store_failure() -> Self {
        Self { code: Self::STORE_FAILURE, message: "storage operation failed".to_owned() }
    }
}

impl From<&EngineError> for Rejection {
    fn from(err: &EngineError) -> Self {
        let code = match err {
            EngineError::SessionNotFound(_)
            | EngineError::InviteNotFound(_)
            | EngineError::PlayerNotFound(_) => Self::NOT_FOUND,
            EngineError::SessionOver(_) => Self::ILLEGAL_STATE,
            EngineError::SlotOccupied(_) => Self::SLOT_OCCUPIED,
            EngineError::WrongTurn(_) => Self::WRONG_TURN,
            EngineError::AlreadyResolved(_) => Self::ALREADY_RESOLVED,
            EngineError::SelfInvite => Self::SELF_INVITE,
            EngineError::Store(_) => return Self::store_failure(),
        };
        Self { code, message: err.to_string() }
    }
}

/// Everything the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Direct reply to a request.
    Reply(Reply),
    /// Pushed event (move made, invite received, status change, ...).
    Event(Event),
    /// Rejected request, with the reason kind.
    Rejection(Rejection),
}

/// Encode a value as one frame: length prefix + CBOR body.
pub fn encode_frame<T: Serialize>(value: &T, dst: &mut impl BufMut) -> Result<()> {
    let mut body = Vec::new();
    ciborium::ser::into_writer(value, &mut body)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;

    if body.len() > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: body.len(), max: MAX_FRAME_SIZE });
    }

    dst.put_u32(body.len() as u32);
    dst.put_slice(&body);
    Ok(())
}

/// Validate a length prefix, returning the body length to read.
pub fn frame_length(prefix: [u8; LENGTH_PREFIX_SIZE]) -> Result<usize> {
    let length = u32::from_be_bytes(prefix) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: length, max: MAX_FRAME_SIZE });
    }
    Ok(length)
}

/// Decode a frame body.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    ciborium::de::from_reader(body).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug>(value: &T) {
        let mut buf = Vec::new();
        encode_frame(value, &mut buf).unwrap();

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&buf[..LENGTH_PREFIX_SIZE]);
        let length = frame_length(prefix).unwrap();
        assert_eq!(length, buf.len() - LENGTH_PREFIX_SIZE);

        let decoded: T = decode_body(&buf[LENGTH_PREFIX_SIZE..]).unwrap();
        assert_eq!(&decoded, value);
    }

    #[test]
    fn request_round_trip() {
        round_trip(&Request::Hello {
            player: "alice".to_owned(),
            display_name: "Alice".to_owned(),
        });
        round_trip(&Request::MakeMove { session_id: 0xdead_beef, slot: 4 });
        round_trip(&Request::FetchStats);
    }

    #[test]
    fn server_message_round_trip() {
        round_trip(&ServerMessage::Rejection(Rejection::hello_required()));
        round_trip(&ServerMessage::Event(Event::PlayerStatusChanged {
            player: "alice".to_owned(),
            online: true,
        }));
        round_trip(&ServerMessage::Reply(Reply::Welcome {
            profile: PlayerProfile::new("alice", "Alice", 1_000),
        }));
    }

    #[test]
    fn oversized_frame_is_rejected_on_encode() {
        let huge = Request::Hello {
            player: "alice".to_owned(),
            display_name: "x".repeat(MAX_FRAME_SIZE + 1),
        };
        let mut buf = Vec::new();
        let err = encode_frame(&huge, &mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let err = frame_length(u32::MAX.to_be_bytes()).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { .. }));
    }

    #[test]
    fn garbage_body_fails_to_decode() {
        let err = decode_body::<Request>(&[0xff, 0x00, 0x12]).unwrap_err();
        assert!(matches!(err, ProtocolError::CborDecode(_)));
    }

    #[test]
    fn rejection_codes_map_engine_errors() {
        let cases = [
            (EngineError::SessionNotFound(1), Rejection::NOT_FOUND),
            (EngineError::SessionOver(1), Rejection::ILLEGAL_STATE),
            (EngineError::SlotOccupied(4), Rejection::SLOT_OCCUPIED),
            (EngineError::WrongTurn("alice".to_owned()), Rejection::WRONG_TURN),
            (EngineError::AlreadyResolved(1), Rejection::ALREADY_RESOLVED),
            (EngineError::SelfInvite, Rejection::SELF_INVITE),
        ];
        for (err, code) in cases {
            assert_eq!(Rejection::from(&err).code, code);
        }
    }

    #[test]
    fn store_failure_rejection_hides_details() {
        let err = EngineError::Store(gridlock_core::StoreError::Io("disk on fire".to_owned()));
        let rejection = Rejection::from(&err);
        assert_eq!(rejection.code, Rejection::STORE_FAILURE);
        assert!(!rejection.message.contains("disk"));
    }
}
