//! History engine — the shared stroke log and its single visibility pointer.
//!
//! DESIGN
//! ======
//! One `History` per room, one pointer for everyone: any member's undo or
//! redo moves the whole room's view. Internally the pointer is stored as
//! `visible`, the count of visible strokes (`0..=strokes.len()`), so the
//! bounds invariant holds by construction. The wire contract's `-1`-based
//! `historyIndex` is derived at the boundary via `history_index()`.
//!
//! A new stroke after an undo truncates the redo-pending tail first — the
//! classic linear undo rule. There is no branching history and `clear` is
//! itself not undoable.

use crate::protocol::{DrawingState, Stroke};

/// Ordered stroke log with a room-wide visibility pointer.
#[derive(Debug, Default)]
pub struct History {
    strokes: Vec<Stroke>,
    /// Number of visible strokes. `strokes[..visible]` is what clients render.
    visible: usize,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wire-facing history index: `-1` when nothing is visible,
    /// otherwise the index of the last visible stroke.
    #[must_use]
    pub fn history_index(&self) -> i64 {
        i64::try_from(self.visible).unwrap_or(i64::MAX) - 1
    }

    /// Append a stroke, discarding any redo-pending tail first.
    /// The discarded strokes are unrecoverable.
    pub fn add_stroke(&mut self, stroke: Stroke) {
        self.strokes.truncate(self.visible);
        self.strokes.push(stroke);
        self.visible = self.strokes.len();
    }

    /// Step the pointer back one stroke. Returns the new history index,
    /// or `None` (state unchanged) at the lower boundary.
    pub fn undo(&mut self) -> Option<i64> {
        if self.visible == 0 {
            return None;
        }
        self.visible -= 1;
        Some(self.history_index())
    }

    /// Step the pointer forward one stroke. Returns the new history index,
    /// or `None` (state unchanged) at the upper boundary.
    pub fn redo(&mut self) -> Option<i64> {
        if self.visible == self.strokes.len() {
            return None;
        }
        self.visible += 1;
        Some(self.history_index())
    }

    /// The strokes clients should currently render.
    #[must_use]
    pub fn visible_strokes(&self) -> &[Stroke] {
        &self.strokes[..self.visible]
    }

    /// Full snapshot for late-joiner resync: the whole log including the
    /// redo-pending tail, so a joiner who later redoes sees the same
    /// strokes everyone else would have.
    #[must_use]
    pub fn snapshot(&self) -> DrawingState {
        DrawingState { strokes: self.strokes.clone(), history_index: self.history_index() }
    }

    /// Drop everything. Irreversible; not undoable.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.visible = 0;
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
