//! Storage backends for the server.
//!
//! The [`Store`] trait and the in-memory reference backend live in
//! `gridlock-core`; this module adds the production backend (redb) and a
//! fault-injecting wrapper for chaos tests, and re-exports the core names so
//! runtime code has a single import path.

mod chaotic;
mod redb;

pub use chaotic::ChaoticStore;
pub use gridlock_core::{MemoryStore, Store, StoreError};

pub use self::redb::RedbStore;
