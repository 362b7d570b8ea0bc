//! Sans-IO server driver.
//!
//! Ties together the presence ledger, session engine, matchmaker, and store.
//!
//! ## Event/Action Pattern
//!
//! 1. The runtime produces [`ServerEvent`]s (connections, requests)
//! 2. [`ServerDriver::process_event`] returns [`ServerAction`]s
//! 3. The runtime executes the actions (socket writes, closes, log lines)
//!
//! No I/O happens here, so every flow is testable by driving
//! `process_event` directly. Engine rejections become [`Rejection`] messages
//! to the originating connection only — never broadcast. Notices whose
//! recipient is offline are dropped silently (best-effort delivery; the
//! authoritative state is in the store).

use std::collections::HashSet;

use gridlock_core::{
    EngineError, Environment, Event, Matchmaker, Notice, PlayerProfile, PresenceLedger,
    SessionEngine, Slot, Store, stats,
};

use crate::wire::{PendingInvite, Rejection, Reply, Request, ServerMessage};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent connections; further ones are refused.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_connections: 10_000 }
    }
}

/// Events that the server driver processes.
///
/// These are produced by the external runtime (or tests).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new connection was accepted.
    ConnectionAccepted {
        /// Unique connection id assigned by the runtime.
        conn_id: u64,
    },

    /// A request was received from a connection.
    RequestReceived {
        /// Connection that sent the request.
        conn_id: u64,
        /// The decoded request.
        request: Request,
    },

    /// A connection was closed (by peer or error).
    ConnectionClosed {
        /// Connection that was closed.
        conn_id: u64,
        /// Reason for closure.
        reason: String,
    },
}

/// Actions that the server driver produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAction {
    /// Send a message to a specific connection.
    SendToConnection {
        /// Target connection.
        conn_id: u64,
        /// Message to deliver.
        message: ServerMessage,
    },

    /// Send a message to every connection, optionally excluding one.
    Broadcast {
        /// Message to deliver.
        message: ServerMessage,
        /// Connection to skip (typically the one that caused the event).
        exclude: Option<u64>,
    },

    /// Close a connection.
    CloseConnection {
        /// Connection to close.
        conn_id: u64,
        /// Reason for closure.
        reason: String,
    },

    /// Log a message.
    Log {
        /// Log level.
        level: LogLevel,
        /// Message to log.
        message: String,
    },
}

/// Log levels for server actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational message.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

/// Errors from driver operations.
///
/// Rejections of well-formed requests are not errors — they become
/// [`ServerAction::SendToConnection`] with a [`Rejection`] payload. This
/// type covers runtime/driver disagreements only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// The runtime referenced a connection the driver does not know.
    #[error("unknown connection: {0:016x}")]
    ConnectionUnknown(u64),
}

/// Action-based server driver.
///
/// Owns all per-process state: the connection set, the presence ledger, and
/// handles to the store-backed engine and matchmaker.
pub struct ServerDriver<E, S>
where
    E: Environment,
    S: Store,
{
    /// Connections currently accepted by the runtime.
    connections: HashSet<u64>,
    /// Identity ↔ address ledger.
    ledger: PresenceLedger,
    /// Session orchestration.
    engine: SessionEngine<S, E>,
    /// Invite orchestration.
    matchmaker: Matchmaker<S, E>,
    /// Store handle for profile upserts and fetch requests.
    store: S,
    /// Environment (clock, RNG).
    env: E,
    /// Server configuration.
    config: ServerConfig,
}

impl<E, S> ServerDriver<E, S>
where
    E: Environment,
    S: Store,
{
    /// Create a new server driver.
    pub fn new(env: E, store: S, config: ServerConfig) -> Self {
        Self {
            connections: HashSet::new(),
            ledger: PresenceLedger::new(),
            engine: SessionEngine::new(store.clone(), env.clone()),
            matchmaker: Matchmaker::new(store.clone(), env.clone()),
            store,
            env,
            config,
        }
    }

    /// Process a server event and return actions to execute.
    pub fn process_event(&mut self, event: ServerEvent) -> Result<Vec<ServerAction>, DriverError> {
        match event {
            ServerEvent::ConnectionAccepted { conn_id } => self.handle_connection_accepted(conn_id),
            ServerEvent::RequestReceived { conn_id, request } => {
                self.handle_request(conn_id, request)
            },
            ServerEvent::ConnectionClosed { conn_id, reason } => {
                Ok(self.handle_connection_closed(conn_id, &reason))
            },
        }
    }

    /// Number of accepted connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether a player is currently marked online.
    pub fn is_online(&self, player: &str) -> bool {
        self.ledger.is_online(player)
    }

    /// Store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn handle_connection_accepted(
        &mut self,
        conn_id: u64,
    ) -> Result<Vec<ServerAction>, DriverError> {
        if self.connections.len() >= self.config.max_connections {
            return Ok(vec![ServerAction::CloseConnection {
                conn_id,
                reason: "max connections exceeded".to_owned(),
            }]);
        }

        self.connections.insert(conn_id);

        Ok(vec![ServerAction::Log {
            level: LogLevel::Debug,
            message: format!("connection {conn_id:016x} accepted"),
        }])
    }

    fn handle_request(
        &mut self,
        conn_id: u64,
        request: Request,
    ) -> Result<Vec<ServerAction>, DriverError> {
        if !self.connections.contains(&conn_id) {
            return Err(DriverError::ConnectionUnknown(conn_id));
        }

        let actions = match request {
            Request::Hello { player, display_name } => self.handle_hello(conn_id, player, display_name),
            Request::CreateInvite { to } => self.handle_create_invite(conn_id, &to),
            Request::ResolveInvite { invite_id, accept } => {
                self.handle_resolve_invite(conn_id, invite_id, accept)
            },
            Request::MakeMove { session_id, slot } => {
                self.handle_make_move(conn_id, session_id, slot)
            },
            Request::FetchSession { session_id } => match self.engine.session(session_id) {
                Ok(session) => vec![self.reply(conn_id, Reply::SessionState { session })],
                Err(err) => self.reject(conn_id, &err),
            },
            Request::FetchPendingInvites => self.handle_fetch_pending(conn_id),
            Request::FetchProfile { player } => self.handle_fetch_profile(conn_id, &player),
            Request::FetchStats => match stats::snapshot(&self.store, &self.ledger) {
                Ok(snapshot) => vec![self.reply(conn_id, Reply::Statistics { stats: snapshot })],
                Err(err) => self.reject(conn_id, &EngineError::Store(err)),
            },
            Request::Goodbye => self.handle_goodbye(conn_id),
        };

        Ok(actions)
    }

    fn handle_hello(
        &mut self,
        conn_id: u64,
        player: String,
        display_name: String,
    ) -> Vec<ServerAction> {
        let now = self.env.wall_clock_millis();

        // Create-on-first-contact, update the display name on later hellos.
        let profile = match self.store.load_player(&player) {
            Ok(Some(mut existing)) => {
                if !display_name.is_empty() {
                    existing.display_name = display_name;
                }
                existing
            },
            Ok(None) => {
                let name = if display_name.is_empty() { player.clone() } else { display_name };
                PlayerProfile::new(player.clone(), name, now)
            },
            Err(err) => return self.reject(conn_id, &EngineError::Store(err)),
        };
        if let Err(err) = self.store.put_player(&profile) {
            return self.reject(conn_id, &EngineError::Store(err));
        }

        let mut actions = Vec::new();

        if let Some(stale) = self.ledger.mark_online(player.clone(), conn_id, now) {
            actions.push(ServerAction::CloseConnection {
                conn_id: stale,
                reason: "displaced by reconnect".to_owned(),
            });
        }

        actions.push(self.reply(conn_id, Reply::Welcome { profile }));
        actions.push(ServerAction::SendToConnection {
            conn_id,
            message: ServerMessage::Event(Event::OnlineRoster { players: self.roster() }),
        });
        actions.push(ServerAction::Broadcast {
            message: ServerMessage::Event(Event::PlayerStatusChanged {
                player: player.clone(),
                online: true,
            }),
            exclude: Some(conn_id),
        });
        actions.push(ServerAction::Log {
            level: LogLevel::Info,
            message: format!("player {player} online at connection {conn_id:016x}"),
        });

        actions
    }

    fn handle_create_invite(&mut self, conn_id: u64, to: &str) -> Vec<ServerAction> {
        let Some(caller) = self.caller(conn_id) else {
            return vec![self.send_rejection(conn_id, Rejection::hello_required())];
        };

        match self.matchmaker.create_invite(&caller, to) {
            Ok((invite, notices)) => {
                let mut actions = vec![self.reply(conn_id, Reply::InviteCreated { invite })];
                actions.extend(self.dispatch(notices));
                actions
            },
            Err(err) => self.reject(conn_id, &err),
        }
    }

    fn handle_resolve_invite(
        &mut self,
        conn_id: u64,
        invite_id: u64,
        accept: bool,
    ) -> Vec<ServerAction> {
        if self.caller(conn_id).is_none() {
            return vec![self.send_rejection(conn_id, Rejection::hello_required())];
        }

        match self.matchmaker.resolve_invite(invite_id, accept, &self.engine) {
            Ok((invite, session, notices)) => {
                let session_id = session.map(|s| s.id);
                let mut actions =
                    vec![self.reply(conn_id, Reply::InviteResolved { invite, session_id })];
                actions.extend(self.dispatch(notices));
                actions
            },
            Err(err) => self.reject(conn_id, &err),
        }
    }

    fn handle_make_move(&mut self, conn_id: u64, session_id: u64, slot: u8) -> Vec<ServerAction> {
        let Some(caller) = self.caller(conn_id) else {
            return vec![self.send_rejection(conn_id, Rejection::hello_required())];
        };

        let Some(slot) = Slot::new(slot) else {
            return vec![
                self.send_rejection(conn_id, Rejection::invalid_request("slot index out of range")),
            ];
        };

        match self.engine.apply_move(session_id, &caller, slot) {
            // No direct reply on success: the caller is one of the
            // participants and receives the MoveMade event.
            Ok((_, notices)) => self.dispatch(notices),
            Err(err) => self.reject(conn_id, &err),
        }
    }

    fn handle_fetch_pending(&mut self, conn_id: u64) -> Vec<ServerAction> {
        let Some(caller) = self.caller(conn_id) else {
            return vec![self.send_rejection(conn_id, Rejection::hello_required())];
        };

        match self.matchmaker.pending_invites_for(&caller) {
            Ok(pending) => {
                let invites = pending
                    .into_iter()
                    .map(|(invite, from)| PendingInvite { invite, from })
                    .collect();
                vec![self.reply(conn_id, Reply::PendingInvites { invites })]
            },
            Err(err) => self.reject(conn_id, &err),
        }
    }

    fn handle_fetch_profile(&mut self, conn_id: u64, player: &str) -> Vec<ServerAction> {
        match self.store.load_player(player) {
            Ok(Some(profile)) => vec![self.reply(conn_id, Reply::Profile { profile })],
            Ok(None) => self.reject(conn_id, &EngineError::PlayerNotFound(player.to_owned())),
            Err(err) => self.reject(conn_id, &EngineError::Store(err)),
        }
    }

    fn handle_goodbye(&mut self, conn_id: u64) -> Vec<ServerAction> {
        let mut actions = self.offline_actions(conn_id);
        actions.push(ServerAction::CloseConnection { conn_id, reason: "goodbye".to_owned() });
        actions
    }

    fn handle_connection_closed(&mut self, conn_id: u64, reason: &str) -> Vec<ServerAction> {
        self.connections.remove(&conn_id);

        let mut actions = self.offline_actions(conn_id);
        actions.push(ServerAction::Log {
            level: LogLevel::Debug,
            message: format!("connection {conn_id:016x} closed: {reason}"),
        });
        actions
    }

    /// Mark the connection's identity offline (if it had one) and announce
    /// it. A connection that never identified, or whose identity has since
    /// been rebound to a newer connection, produces no announcement.
    fn offline_actions(&mut self, conn_id: u64) -> Vec<ServerAction> {
        let Some(player) = self.ledger.identity_for(conn_id).cloned() else {
            return Vec::new();
        };

        self.ledger.mark_offline(&player);

        vec![
            ServerAction::Broadcast {
                message: ServerMessage::Event(Event::PlayerStatusChanged {
                    player: player.clone(),
                    online: false,
                }),
                exclude: Some(conn_id),
            },
            ServerAction::Log {
                level: LogLevel::Info,
                message: format!("player {player} offline"),
            },
        ]
    }

    /// Resolve notices to connections, dropping offline recipients silently.
    fn dispatch(&self, notices: Vec<Notice>) -> Vec<ServerAction> {
        notices
            .into_iter()
            .map(|notice| match self.ledger.address_of(&notice.recipient) {
                Some(conn_id) => ServerAction::SendToConnection {
                    conn_id,
                    message: ServerMessage::Event(notice.event),
                },
                None => ServerAction::Log {
                    level: LogLevel::Debug,
                    message: format!("dropped event for offline player {}", notice.recipient),
                },
            })
            .collect()
    }

    fn caller(&self, conn_id: u64) -> Option<String> {
        self.ledger.identity_for(conn_id).cloned()
    }

    fn reply(&self, conn_id: u64, reply: Reply) -> ServerAction {
        ServerAction::SendToConnection { conn_id, message: ServerMessage::Reply(reply) }
    }

    fn send_rejection(&self, conn_id: u64, rejection: Rejection) -> ServerAction {
        ServerAction::SendToConnection { conn_id, message: ServerMessage::Rejection(rejection) }
    }

    /// Rejection + log pair for an engine error. Store failures are logged
    /// with their details at error level and surfaced generically.
    fn reject(&self, conn_id: u64, err: &EngineError) -> Vec<ServerAction> {
        let log = match err {
            EngineError::Store(store_err) => ServerAction::Log {
                level: LogLevel::Error,
                message: format!("store failure serving connection {conn_id:016x}: {store_err}"),
            },
            _ => ServerAction::Log {
                level: LogLevel::Warn,
                message: format!("rejected request from {conn_id:016x}: {err}"),
            },
        };

        vec![self.send_rejection(conn_id, Rejection::from(err)), log]
    }

    fn roster(&self) -> Vec<PlayerProfile> {
        let mut players = Vec::with_capacity(self.ledger.online_count());
        for id in self.ledger.online_players() {
            if let Ok(Some(profile)) = self.store.load_player(id) {
                players.push(profile);
            }
        }
        players
    }
}

impl<E, S> std::fmt::Debug for ServerDriver<E, S>
where
    E: Environment,
    S: Store,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDriver")
            .field("connection_count", &self.connections.len())
            .field("online_count", &self.ledger.online_count())
            .finish()
    }
}
