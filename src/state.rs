//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! owns the room registry for the lifetime of the process: one authoritative
//! process per room, no module-global singleton. Tests construct as many
//! independent `AppState` instances as they like.
//!
//! Each room holds its membership, the per-connection outbound channels, and
//! one `History`. Rooms are created lazily on first join and destroyed the
//! moment the last member leaves; a room's stroke log does not outlive its
//! membership.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::{Point, ServerEvent, UserInfo};
use crate::services::history::History;

// =============================================================================
// CONNECTED USER
// =============================================================================

/// A room member's presence data, keyed by connection id in `RoomState`.
#[derive(Debug, Clone)]
pub struct ConnectedUser {
    pub username: String,
    /// Display color assigned at join; collisions between users are allowed.
    pub color: String,
    /// Last known cursor position, updated on every cursor-move.
    pub cursor: Point,
}

impl ConnectedUser {
    #[must_use]
    pub fn info(&self, id: Uuid) -> UserInfo {
        UserInfo { id, username: self.username.clone(), color: self.color.clone(), cursor: self.cursor }
    }
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room live state. Exists only while at least one member is connected.
pub struct RoomState {
    /// Members keyed by connection id.
    pub users: HashMap<Uuid, ConnectedUser>,
    /// Outbound channels: connection id -> sender for server events.
    pub clients: HashMap<Uuid, mpsc::Sender<ServerEvent>>,
    /// The room-wide shared drawing history.
    pub history: History,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self { users: HashMap::new(), clients: HashMap::new(), history: History::new() }
    }

    /// Membership as wire-ready `UserInfo` records.
    #[must_use]
    pub fn user_list(&self) -> Vec<UserInfo> {
        self.users.iter().map(|(id, user)| user.info(*id)).collect()
    }
}

impl Default for RoomState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum — the registry is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// Rooms keyed by name; the name is the sole key, so two clients
    /// supplying the same name always land in the same room.
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())) }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_state_new_is_empty() {
        let room = RoomState::new();
        assert!(room.users.is_empty());
        assert!(room.clients.is_empty());
        assert_eq!(room.history.history_index(), -1);
    }

    #[test]
    fn app_state_instances_are_independent() {
        let a = AppState::new();
        let b = AppState::new();
        assert!(!Arc::ptr_eq(&a.rooms, &b.rooms));
    }

    #[test]
    fn user_list_projects_members() {
        let mut room = RoomState::new();
        let id = Uuid::new_v4();
        room.users.insert(
            id,
            ConnectedUser { username: "ann".into(), color: "#4ECDC4".into(), cursor: Point { x: 3.0, y: 4.0 } },
        );
        let users = room.user_list();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, id);
        assert_eq!(users[0].username, "ann");
        assert!((users[0].cursor.x - 3.0).abs() < f64::EPSILON);
    }
}
