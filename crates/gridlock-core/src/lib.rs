//! Sans-IO match engine for the gridlock game service.
//!
//! This crate holds everything the server needs to run two-player grid
//! matches, with no I/O of its own:
//!
//! ```text
//! Driver (gridlock-server)
//!   ├─ SessionEngine (move validation, turn state, outcomes)
//!   │   └─ rules (win/draw detection)
//!   ├─ Matchmaker (invite lifecycle, session creation)
//!   ├─ PresenceLedger (identity → address)
//!   └─ Store (durable records)
//! ```
//!
//! ## Event/Action Pattern
//!
//! Every state-mutating operation returns [`Notice`]s — (recipient, event)
//! pairs — instead of performing delivery. The transport layer resolves
//! recipients through the [`PresenceLedger`] and drops unreachable targets
//! silently. The authoritative state lives in the [`Store`] records, never in
//! the notification stream, so a client that misses an event re-fetches by
//! identifier.
//!
//! ## Module Structure
//!
//! - [`board`]: marks, validated slots, the 3x3 grid
//! - [`rules`]: win and draw detection (pure, total)
//! - [`session`]: the per-match record and its state machine
//! - [`player`]: profiles and cumulative statistics
//! - [`invite`]: invite records and their one-way resolution
//! - [`engine`]: session orchestration against the store
//! - [`matchmaker`]: invite orchestration against the store
//! - [`presence`]: who is reachable, and where
//! - [`store`]: persistence abstraction + in-memory reference backend
//! - [`stats`]: service-wide statistics snapshot
//! - [`env`]: time and randomness abstraction for deterministic tests

pub mod board;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod invite;
pub mod matchmaker;
pub mod player;
pub mod presence;
pub mod rules;
pub mod session;
pub mod stats;
pub mod store;

pub use board::{Board, Mark, Slot};
pub use engine::SessionEngine;
pub use env::Environment;
pub use error::EngineError;
pub use event::{Event, Notice};
pub use invite::{Invite, InviteId, InviteStatus};
pub use matchmaker::Matchmaker;
pub use player::{GameResult, PlayerId, PlayerProfile, PlayerStats};
pub use presence::{PresenceEntry, PresenceLedger};
pub use rules::Verdict;
pub use session::{MoveRecord, Outcome, Session, SessionId};
pub use stats::StatsSnapshot;
pub use store::{MemoryStore, Store, StoreError};
