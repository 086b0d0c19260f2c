//! WebSocket handler — the per-connection session coordinator.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection id and enters a `select!` loop:
//! - Incoming client events → decode + dispatch by typed variant
//! - Broadcast events from room peers → forward to the client
//!
//! Dispatch validates the connection's state and names the audience for
//! each event through the room-service call it makes; the service applies
//! the mutation and enqueues the broadcast inside one critical section, so
//! peers observe events in apply order. Dispatch returns only the events
//! destined for the sender's own socket (the `room-joined` reply).
//!
//! Note the fan-out asymmetry: `draw` and `cursor-move` go to peers only
//! (the originator already rendered locally), while `undo`, `redo` and
//! `clear-canvas` go to the whole room including the originator, whose
//! client must adopt the server's authoritative history index. The
//! originator's copy arrives through its own registered channel.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → connection is Unjoined
//! 2. `join-room` → register in the directory, reply `room-joined`, notify peers
//! 3. Drawing/presence events → dispatch → service mutation + fan-out
//! 4. Close → `leave_room`: survivors get `user-left` + `users-update`

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use rand::seq::IndexedRandom;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{ClientEvent, ServerEvent};
use crate::services;
use crate::state::AppState;

// =============================================================================
// COLORS
// =============================================================================

/// Display colors assigned round-the-wheel at join. Picks are independent
/// and uniform; two users may share a color.
const PALETTE: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#FFD93D", "#95E1D3", "#A8D8EA", "#F38181", "#AA96DA", "#6BCB77",
];

fn pick_color() -> String {
    let mut rng = rand::rng();
    (*PALETTE.choose(&mut rng).unwrap_or(&PALETTE[0])).to_owned()
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast events from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerEvent>(256);

    info!(%client_id, "ws: client connected");

    // Unjoined until the first accepted join-room; Joined(room) afterwards.
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_event_text(&state, &mut current_room, client_id, &client_tx, &text).await;
                        for event in replies {
                            let _ = send_event(&mut socket, client_id, &event).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, client_id, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    // leave_room deregisters the member, notifies survivors, and evicts the
    // room if it emptied.
    if let Some(room) = current_room {
        services::room::leave_room(&state, &room, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// Decode and process one inbound text frame, returning the events destined
/// for the sender's socket. Peer fan-out happens inside the room service.
///
/// Kept separate from the socket loop so tests can exercise dispatch and
/// fan-out end-to-end through registered peer channels.
async fn process_event_text(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    text: &str,
) -> Vec<ServerEvent> {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: ignoring malformed event");
            return Vec::new();
        }
    };

    // Cursor traffic is too chatty to log.
    if !matches!(event, ClientEvent::CursorMove { .. }) {
        info!(%client_id, event = event_name(&event), "ws: recv event");
    }

    dispatch(state, current_room, client_id, client_tx, event).await
}

async fn dispatch(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerEvent>,
    event: ClientEvent,
) -> Vec<ServerEvent> {
    match event {
        ClientEvent::JoinRoom { room_name, username } => {
            if current_room.is_some() {
                warn!(%client_id, "ws: join-room on an already joined connection, ignoring");
                return Vec::new();
            }

            let color = pick_color();
            let (users, drawing_state) =
                services::room::join_room(state, &room_name, client_id, &username, &color, client_tx.clone()).await;
            *current_room = Some(room_name);

            vec![ServerEvent::RoomJoined { user_id: client_id, color, users, drawing_state }]
        }
        ClientEvent::Draw(stroke) => {
            let Some(room) = current_room.as_deref() else {
                return ignore_unjoined(client_id, "draw");
            };
            services::room::add_stroke(state, room, client_id, stroke).await;
            Vec::new()
        }
        ClientEvent::CursorMove { x, y } => {
            let Some(room) = current_room.as_deref() else {
                // Not even worth a log line; cursors fire constantly.
                return Vec::new();
            };
            services::room::update_cursor(state, room, client_id, x, y).await;
            Vec::new()
        }
        ClientEvent::Undo => {
            let Some(room) = current_room.as_deref() else {
                return ignore_unjoined(client_id, "undo");
            };
            // A boundary failure enqueues nothing; silence is the contract.
            services::room::undo(state, room).await;
            Vec::new()
        }
        ClientEvent::Redo => {
            let Some(room) = current_room.as_deref() else {
                return ignore_unjoined(client_id, "redo");
            };
            services::room::redo(state, room).await;
            Vec::new()
        }
        ClientEvent::ClearCanvas => {
            let Some(room) = current_room.as_deref() else {
                return ignore_unjoined(client_id, "clear-canvas");
            };
            services::room::clear_canvas(state, room).await;
            Vec::new()
        }
    }
}

/// Fail-quiet rule for events that require a joined connection: log and
/// emit nothing. A disabled client button must never break the session.
fn ignore_unjoined(client_id: Uuid, event: &str) -> Vec<ServerEvent> {
    warn!(%client_id, event, "ws: event before join-room, ignoring");
    Vec::new()
}

// =============================================================================
// HELPERS
// =============================================================================

fn event_name(event: &ClientEvent) -> &'static str {
    match event {
        ClientEvent::JoinRoom { .. } => "join-room",
        ClientEvent::Draw(_) => "draw",
        ClientEvent::CursorMove { .. } => "cursor-move",
        ClientEvent::Undo => "undo",
        ClientEvent::Redo => "redo",
        ClientEvent::ClearCanvas => "clear-canvas",
    }
}

async fn send_event(socket: &mut WebSocket, client_id: Uuid, event: &ServerEvent) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: failed to serialize event");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
