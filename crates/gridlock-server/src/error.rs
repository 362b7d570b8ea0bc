//! Runtime error types.

use crate::{driver::DriverError, wire::ProtocolError};

/// Errors from the server runtime (bind, accept, connection handling).
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket or file system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding or decoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The driver and runtime disagreed about connection state.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// Opening the durable store failed.
    #[error("store error: {0}")]
    Store(#[from] gridlock_core::StoreError),
}
