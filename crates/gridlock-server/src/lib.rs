//! gridlock production server.
//!
//! Production glue around [`gridlock_core`]'s action-based logic: TCP
//! transport with length-prefixed CBOR frames, Tokio runtime, system clock
//! and OS entropy.
//!
//! # Architecture
//!
//! The [`ServerDriver`] follows the Sans-IO pattern: the runtime feeds it
//! [`ServerEvent`]s and executes the [`ServerAction`]s it returns. All
//! driver calls are serialized behind one async mutex, so store
//! read-modify-write cycles run single-writer; moves within one session are
//! applied in receipt order.
//!
//! # Components
//!
//! - [`ServerDriver`]: action-based orchestrator (pure logic, no I/O)
//! - [`Server`]: runtime that accepts connections and executes actions
//! - [`storage`]: durable backends (redb) + chaos wrapper
//! - [`SystemEnv`]: production environment (real clock, OS entropy)
//! - [`wire`]: the frame format and message types

mod driver;
mod error;
pub mod storage;
mod system_env;
pub mod wire;

use std::{collections::HashMap, sync::Arc};

pub use driver::{DriverError, LogLevel, ServerAction, ServerConfig, ServerDriver, ServerEvent};
pub use error::ServerError;
use gridlock_core::{Environment, Store};
pub use storage::{ChaoticStore, MemoryStore, RedbStore};
pub use system_env::SystemEnv;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{Mutex, RwLock, mpsc},
};
use wire::{Request, ServerMessage};

/// Shared state for all connections: the outbound queue per connection.
///
/// Each connection has a writer task draining its queue onto the socket, so
/// message order per connection is preserved.
struct SharedState {
    outbound: RwLock<HashMap<u64, mpsc::UnboundedSender<Vec<u8>>>>,
}

/// Server configuration for the runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g. "127.0.0.1:4600").
    pub bind_address: String,
    /// Driver configuration (connection limits).
    pub driver: ServerConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1:4600".to_owned(), driver: ServerConfig::default() }
    }
}

/// Production gridlock server.
///
/// Wraps [`ServerDriver`] with TCP transport and the system environment.
pub struct Server<S>
where
    S: Store,
{
    driver: ServerDriver<SystemEnv, S>,
    listener: TcpListener,
    env: SystemEnv,
}

impl<S> Server<S>
where
    S: Store,
{
    /// Create and bind a new server over the given store.
    pub async fn bind(store: S, config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let env = SystemEnv::new();
        let driver = ServerDriver::new(env.clone(), store, config.driver);
        let listener = TcpListener::bind(&config.bind_address).await?;

        Ok(Self { driver, listener, env })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server, accepting connections and processing requests.
    ///
    /// Runs until the process is shut down or the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("server listening on {}", self.listener.local_addr()?);

        let env = self.env;
        let driver = Arc::new(Mutex::new(self.driver));
        let shared = Arc::new(SharedState { outbound: RwLock::new(HashMap::new()) });

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);
                    let env = env.clone();

                    tokio::spawn(async move {
                        tracing::debug!("accepted connection from {peer}");
                        if let Err(e) = handle_connection(stream, driver, shared, env).await {
                            tracing::debug!("connection error: {e}");
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("accept error: {e}");
                },
            }
        }
    }
}

/// Handle a single TCP connection.
async fn handle_connection<S: Store>(
    stream: TcpStream,
    driver: Arc<Mutex<ServerDriver<SystemEnv, S>>>,
    shared: Arc<SharedState>,
    env: SystemEnv,
) -> Result<(), ServerError> {
    let conn_id = env.random_u64();
    let (mut reader, mut writer) = stream.into_split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    shared.outbound.write().await.insert(conn_id, tx);

    // Writer task: drains the outbound queue onto the socket. Removing the
    // sender (connection close, displacement) lets the task drain what is
    // queued, then shut the write half down.
    tokio::spawn(async move {
        while let Some(bytes) = rx.recv().await {
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(ServerEvent::ConnectionAccepted { conn_id })?;
        drop(driver);
        execute_actions(actions, &shared).await;
    }

    loop {
        let mut prefix = [0u8; wire::LENGTH_PREFIX_SIZE];
        if reader.read_exact(&mut prefix).await.is_err() {
            break;
        }

        let length = match wire::frame_length(prefix) {
            Ok(length) => length,
            Err(e) => {
                tracing::warn!("bad frame from {conn_id:016x}: {e}");
                break;
            },
        };

        let mut body = vec![0u8; length];
        if reader.read_exact(&mut body).await.is_err() {
            break;
        }

        let request: Request = match wire::decode_body(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("undecodable request from {conn_id:016x}: {e}");
                break;
            },
        };

        let actions = {
            let mut driver = driver.lock().await;
            match driver.process_event(ServerEvent::RequestReceived { conn_id, request }) {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::warn!("request processing error: {e}");
                    continue;
                },
            }
        };

        execute_actions(actions, &shared).await;
    }

    shared.outbound.write().await.remove(&conn_id);

    {
        let mut driver = driver.lock().await;
        let actions = driver.process_event(ServerEvent::ConnectionClosed {
            conn_id,
            reason: "connection closed".to_owned(),
        })?;
        drop(driver);
        execute_actions(actions, &shared).await;
    }

    Ok(())
}

/// Execute server actions against the shared connection state.
///
/// Delivery is best-effort throughout: a missing or closed connection means
/// the message is dropped, matching the no-acknowledgement contract.
async fn execute_actions(actions: Vec<ServerAction>, shared: &SharedState) {
    for action in actions {
        match action {
            ServerAction::SendToConnection { conn_id, message } => {
                let Some(bytes) = encode_or_log(&message) else { continue };

                let outbound = shared.outbound.read().await;
                match outbound.get(&conn_id) {
                    Some(tx) => {
                        if tx.send(bytes).is_err() {
                            tracing::debug!("connection {conn_id:016x} gone, message dropped");
                        }
                    },
                    None => {
                        tracing::debug!("connection {conn_id:016x} unknown, message dropped");
                    },
                }
            },

            ServerAction::Broadcast { message, exclude } => {
                let Some(bytes) = encode_or_log(&message) else { continue };

                let outbound = shared.outbound.read().await;
                for (conn_id, tx) in outbound.iter() {
                    if Some(*conn_id) != exclude {
                        let _ = tx.send(bytes.clone());
                    }
                }
            },

            ServerAction::CloseConnection { conn_id, reason } => {
                tracing::info!("closing connection {conn_id:016x}: {reason}");
                shared.outbound.write().await.remove(&conn_id);
            },

            ServerAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}

fn encode_or_log(message: &ServerMessage) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    match wire::encode_frame(message, &mut bytes) {
        Ok(()) => Some(bytes),
        Err(e) => {
            tracing::error!("failed to encode message: {e}");
            None
        },
    }
}
