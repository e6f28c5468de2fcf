//! `TurnstileServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → lobby.

use std::sync::Arc;

use turnstile_lobby::{GameRegistry, Matchmaker, MembershipTables};
use turnstile_protocol::{Codec, JsonCodec};
use turnstile_session::BroadcastGroups;
use turnstile_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ServerClock, SessionRouter, TurnstileError};

/// Shared server state passed to each connection handler task.
///
/// Everything inside synchronizes itself, so the `Arc` is all that is
/// needed to share it.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) router: SessionRouter,
    pub(crate) groups: Arc<BroadcastGroups>,
    pub(crate) codec: C,
    pub(crate) clock: ServerClock,
}

/// Builder for configuring and starting a Turnstile server.
///
/// # Example
///
/// ```rust,no_run
/// use turnstile::prelude::*;
///
/// # async fn run() -> Result<(), TurnstileError> {
/// let games = GameRegistry::load_dir("games")?;
/// let server = TurnstileServer::builder()
///     .bind("0.0.0.0:3000")
///     .games(games)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TurnstileServerBuilder {
    bind_addr: String,
    games: GameRegistry,
}

impl TurnstileServerBuilder {
    /// Creates a builder bound to `127.0.0.1:3000` with no games.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            games: GameRegistry::new(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the games players may queue for.
    pub fn games(mut self, games: GameRegistry) -> Self {
        self.games = games;
        self
    }

    /// Binds the listener and assembles the shared state.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<TurnstileServer<JsonCodec>, TurnstileError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        if self.games.is_empty() {
            tracing::warn!("no games registered, every join will be rejected");
        }

        let matchmaker = Matchmaker::new(Arc::new(self.games), Arc::new(MembershipTables::new()));
        let state = Arc::new(ServerState {
            router: SessionRouter::new(Arc::new(matchmaker)),
            groups: Arc::new(BroadcastGroups::new()),
            codec: JsonCodec,
            clock: ServerClock::start(),
        });

        Ok(TurnstileServer { transport, state })
    }
}

impl Default for TurnstileServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Turnstile server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TurnstileServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TurnstileServer<JsonCodec> {
    pub fn builder() -> TurnstileServerBuilder {
        TurnstileServerBuilder::new()
    }
}

impl<C: Codec> TurnstileServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning one handler task per connection.
    ///
    /// Runs until the process is terminated; a failed accept is logged and
    /// does not stop the loop.
    pub async fn run(mut self) -> Result<(), TurnstileError> {
        match self.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Turnstile server running"),
            Err(_) => tracing::info!("Turnstile server running"),
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
