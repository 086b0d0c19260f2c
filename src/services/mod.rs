//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the room-scoped state transitions so the websocket
//! handler can stay focused on protocol translation and fan-out.

pub mod history;
pub mod room;
