//! Per-connection handler: register the peer, pump events out, route
//! requests in.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow is:
//!   1. Register a peer keyed by the connection id → `Player`
//!   2. Spawn a writer task draining the peer's event channel onto the socket
//!   3. Loop: receive frames → decode → dispatch through the router
//!   4. On exit, close the socket; the guard runs disconnect cleanup

use std::sync::Arc;

use tokio::task::AbortHandle;
use turnstile_protocol::{Codec, Envelope, PlayerId, ServerEvent};
use turnstile_session::{PeerReceiver, Player};
use turnstile_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;

pub(crate) const INVALID_JSON: &str = "Invalid JSON";

/// Runs disconnect cleanup when the handler exits, however it exits.
///
/// Cleanup is synchronous, so it happens inline instead of on a spawned
/// task.
struct SessionGuard<C: Codec> {
    player: Player,
    state: Arc<ServerState<C>>,
    writer: AbortHandle,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        // Unregister first: a room formed after this point cannot add the
        // player to its group, so it unseats the player itself. A room
        // formed before it is seen by the router cleanup below.
        self.state.groups.disconnect(self.player.id());
        self.state.router.disconnect(&self.player);
        self.writer.abort();
        tracing::info!(
            player_id = %self.player.id(),
            peers = self.state.groups.peer_count(),
            "player disconnected"
        );
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) {
    let conn = Arc::new(conn);
    let player_id = PlayerId(conn.id().to_string());
    let (handle, outbound) = state.groups.connect(player_id.clone());
    let player = Player::new(handle);
    tracing::info!(%player_id, "player connected");

    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        outbound,
        Arc::clone(&state),
    ));
    let _guard = SessionGuard {
        player: player.clone(),
        state: Arc::clone(&state),
        writer: writer.abort_handle(),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let request = state
            .codec
            .decode::<Envelope>(&data)
            .and_then(Envelope::into_request);
        match request {
            Ok(request) => state.router.handle(&player, request),
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "rejected frame");
                if let Err(e) = player.emit(ServerEvent::client_error(INVALID_JSON)) {
                    tracing::debug!(%player_id, error = %e, "error reply dropped");
                }
            }
        }
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%player_id, error = %e, "close after session end failed");
    }
    // _guard drops here → cleanup fires.
}

/// Drains a peer's event channel onto its socket, stamping each frame.
///
/// Only this task writes to the connection, so `seq` is gap-free and
/// timestamps never decrease for the recipient.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbound: PeerReceiver,
    state: Arc<ServerState<C>>,
) {
    let mut seq: u64 = 1;
    while let Some(event) = outbound.recv().await {
        let kind = event.kind();
        let envelope = Envelope::event(next_seq(&mut seq), state.clock.now_millis(), event);
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), %kind, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
