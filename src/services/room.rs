//! Room directory — membership, cursor presence, and fan-out.
//!
//! DESIGN
//! ======
//! Rooms are created lazily on first join and evicted the moment the last
//! member leaves; an evicted room's history is gone for good.
//!
//! Every mutating operation takes the registry write lock once, applies its
//! state change, and enqueues the resulting event to member channels before
//! releasing the guard. Mutation and fan-out form one critical section, so
//! if operation A is applied before operation B, every member's channel
//! holds A's event before B's: clients observe events in apply order. The
//! audience is chosen per call site (`exclude` the originator, or include
//! the whole room).
//!
//! ERROR HANDLING
//! ==============
//! Directory lookups on unknown rooms or users are silent no-ops by
//! contract. Nothing here returns an error; the only failure signal is
//! `undo`/`redo` returning `None` at a history boundary, which means no
//! event was enqueued.

use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::protocol::{DrawingState, Point, ServerEvent, Stroke, UserInfo};
use crate::state::{AppState, ConnectedUser, RoomState};

// =============================================================================
// JOIN / LEAVE
// =============================================================================

/// Join a room, creating it if this is the first member. Re-joining with an
/// existing connection id overwrites that member's metadata and resets its
/// cursor to the origin.
///
/// Peers are notified with `user-joined` then `users-update` inside the same
/// guard. Returns the post-join membership and a full history snapshot for
/// the joiner's resync.
pub async fn join_room(
    state: &AppState,
    room_name: &str,
    client_id: Uuid,
    username: &str,
    color: &str,
    tx: mpsc::Sender<ServerEvent>,
) -> (Vec<UserInfo>, DrawingState) {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(room_name.to_owned()).or_insert_with(RoomState::new);

    room.clients.insert(client_id, tx);
    room.users.insert(
        client_id,
        ConnectedUser { username: username.to_owned(), color: color.to_owned(), cursor: Point::ORIGIN },
    );

    let users = room.user_list();
    send_all(
        room,
        &ServerEvent::UserJoined { id: client_id, username: username.to_owned(), color: color.to_owned() },
        Some(client_id),
    );
    send_all(room, &ServerEvent::UsersUpdate { users: users.clone() }, Some(client_id));

    info!(room = room_name, %client_id, members = room.users.len(), "client joined room");
    (users, room.history.snapshot())
}

/// Leave a room. Survivors get `user-left` then `users-update`; the departed
/// member's channel is deregistered first and receives neither. If the last
/// member leaves, the room and its entire stroke history are evicted.
/// Unknown room or member: silent no-op.
pub async fn leave_room(state: &AppState, room_name: &str, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return;
    };

    room.clients.remove(&client_id);
    if room.users.remove(&client_id).is_none() {
        return;
    }
    info!(room = room_name, %client_id, remaining = room.users.len(), "client left room");

    if room.users.is_empty() {
        rooms.remove(room_name);
        info!(room = room_name, "evicted empty room");
        return;
    }

    send_all(room, &ServerEvent::UserLeft { user_id: client_id }, None);
    send_all(room, &ServerEvent::UsersUpdate { users: room.user_list() }, None);
}

// =============================================================================
// PRESENCE
// =============================================================================

/// Overwrite a member's last known cursor position and notify peers with
/// `cursor-update`. Silent no-op when the room or member does not exist.
pub async fn update_cursor(state: &AppState, room_name: &str, client_id: Uuid, x: f64, y: f64) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return;
    };
    let Some(user) = room.users.get_mut(&client_id) else {
        return;
    };
    user.cursor = Point { x, y };
    send_all(room, &ServerEvent::CursorUpdate { user_id: client_id, x, y }, Some(client_id));
}

/// Current membership of a room; empty for unknown rooms.
pub async fn list_users(state: &AppState, room_name: &str) -> Vec<UserInfo> {
    let rooms = state.rooms.read().await;
    rooms.get(room_name).map_or_else(Vec::new, RoomState::user_list)
}

// =============================================================================
// HISTORY OPERATIONS
// =============================================================================

/// Append a stroke to the room's shared history, truncating any
/// redo-pending tail, and fan it out to everyone except the originator
/// (whose client already rendered it locally).
pub async fn add_stroke(state: &AppState, room_name: &str, client_id: Uuid, stroke: Stroke) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return;
    };
    room.history.add_stroke(stroke.clone());
    send_all(room, &ServerEvent::Draw(stroke), Some(client_id));
}

/// Step the room's shared history back. On success the authoritative new
/// index is broadcast to the whole room, originator included, and returned.
/// `None` at the boundary or for an unknown room; nothing is enqueued.
pub async fn undo(state: &AppState, room_name: &str) -> Option<i64> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_name)?;
    let history_index = room.history.undo()?;
    send_all(room, &ServerEvent::Undo { history_index }, None);
    Some(history_index)
}

/// Step the room's shared history forward. Same contract as [`undo`].
pub async fn redo(state: &AppState, room_name: &str) -> Option<i64> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_name)?;
    let history_index = room.history.redo()?;
    send_all(room, &ServerEvent::Redo { history_index }, None);
    Some(history_index)
}

/// Wipe the room's history and tell the whole room, originator included.
/// Not undoable.
pub async fn clear_canvas(state: &AppState, room_name: &str) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_name) else {
        return;
    };
    room.history.clear();
    send_all(room, &ServerEvent::ClearCanvas, None);
    info!(room = room_name, "canvas cleared");
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Enqueue an event to every member channel, optionally excluding one
/// connection. Callers hold the registry write guard, so enqueue order is
/// apply order. Best-effort: a member whose channel is full misses the
/// event.
fn send_all(room: &RoomState, event: &ServerEvent, exclude: Option<Uuid>) {
    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        if tx.try_send(event.clone()).is_err() {
            warn!(%client_id, "dropping event for slow or closed client");
        }
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
