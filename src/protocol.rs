//! Protocol — the typed event catalog for `sketchroom`.
//!
//! DESIGN
//! ======
//! Every wire message is one JSON object tagged by `"type"`. Inbound and
//! outbound events are closed enums (one variant per event name), so the
//! websocket dispatch match is exhaustive: adding an event without wiring
//! its fan-out rule is a compile error, not a silent drop.
//!
//! Tags are kebab-case (`"join-room"`, `"clear-canvas"`), payload fields
//! camelCase (`"historyIndex"`), matching what browser clients send.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// CORE DATA TYPES
// =============================================================================

/// A point in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };
}

/// Drawing tool used for a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Brush,
    Eraser,
}

/// One recorded freehand gesture. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub tool: Tool,
    pub color: String,
    pub width: f64,
    pub points: Vec<Point>,
}

/// Wire projection of a room member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub color: String,
    pub cursor: Point,
}

/// Full history snapshot sent to late joiners: the entire stroke log,
/// including the redo-pending tail beyond `history_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingState {
    pub strokes: Vec<Stroke>,
    pub history_index: i64,
}

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// Events a client may send. `Draw` flattens the stroke fields into the
/// event object itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_name: String, username: String },
    Draw(Stroke),
    CursorMove { x: f64, y: f64 },
    Undo,
    Redo,
    ClearCanvas,
}

// =============================================================================
// OUTBOUND EVENTS
// =============================================================================

/// Events the server emits. The `history_index` carried by `Undo`/`Redo` is
/// authoritative: every client, the originator included, adopts it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        user_id: Uuid,
        color: String,
        users: Vec<UserInfo>,
        drawing_state: DrawingState,
    },
    UserJoined {
        id: Uuid,
        username: String,
        color: String,
    },
    UsersUpdate {
        users: Vec<UserInfo>,
    },
    Draw(Stroke),
    #[serde(rename_all = "camelCase")]
    CursorUpdate { user_id: Uuid, x: f64, y: f64 },
    #[serde(rename_all = "camelCase")]
    Undo { history_index: i64 },
    #[serde(rename_all = "camelCase")]
    Redo { history_index: i64 },
    ClearCanvas,
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: Uuid },
}

// =============================================================================
// DECODE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ClientEvent {
    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Malformed` for invalid JSON or an unknown
    /// event tag. Callers log and ignore; malformed input never produces
    /// a broadcast.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
