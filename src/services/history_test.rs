use super::*;
use crate::state::test_helpers::dummy_stroke;

fn colors(strokes: &[Stroke]) -> Vec<&str> {
    strokes.iter().map(|s| s.color.as_str()).collect()
}

// =============================================================================
// Fresh engine and boundary idempotence
// =============================================================================

#[test]
fn fresh_engine_is_empty_at_index_minus_one() {
    let history = History::new();
    assert_eq!(history.history_index(), -1);
    assert!(history.visible_strokes().is_empty());
    assert_eq!(history.snapshot(), DrawingState { strokes: vec![], history_index: -1 });
}

#[test]
fn undo_on_fresh_engine_fails_and_changes_nothing() {
    let mut history = History::new();
    assert_eq!(history.undo(), None);
    assert_eq!(history.undo(), None);
    assert_eq!(history.history_index(), -1);
    assert!(history.visible_strokes().is_empty());
}

#[test]
fn redo_at_the_top_fails_and_changes_nothing() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    history.add_stroke(dummy_stroke("#b"));
    assert_eq!(history.redo(), None);
    assert_eq!(history.history_index(), 1);
    assert_eq!(history.visible_strokes().len(), 2);
}

// =============================================================================
// Add / undo / redo stepping
// =============================================================================

#[test]
fn add_stroke_advances_the_index() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    assert_eq!(history.history_index(), 0);
    history.add_stroke(dummy_stroke("#b"));
    assert_eq!(history.history_index(), 1);
    assert_eq!(colors(history.visible_strokes()), vec!["#a", "#b"]);
}

#[test]
fn undo_and_redo_return_the_new_index() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    history.add_stroke(dummy_stroke("#b"));

    assert_eq!(history.undo(), Some(0));
    assert_eq!(colors(history.visible_strokes()), vec!["#a"]);
    assert_eq!(history.undo(), Some(-1));
    assert!(history.visible_strokes().is_empty());

    assert_eq!(history.redo(), Some(0));
    assert_eq!(history.redo(), Some(1));
    assert_eq!(colors(history.visible_strokes()), vec!["#a", "#b"]);
}

// =============================================================================
// Truncation law
// =============================================================================

#[test]
fn new_stroke_after_undo_destroys_the_redo_branch() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    history.add_stroke(dummy_stroke("#b"));
    history.add_stroke(dummy_stroke("#c"));

    assert_eq!(history.undo(), Some(1));
    history.add_stroke(dummy_stroke("#d"));

    assert_eq!(history.history_index(), 2);
    let snapshot = history.snapshot();
    assert_eq!(colors(&snapshot.strokes), vec!["#a", "#b", "#d"]);
    // "#c" is gone; redo cannot bring it back.
    assert_eq!(history.redo(), None);
}

// =============================================================================
// Invariants over an operation sequence
// =============================================================================

#[test]
fn bounds_and_visible_count_hold_after_every_operation() {
    let mut history = History::new();

    let check = |history: &History| {
        let len = i64::try_from(history.snapshot().strokes.len()).expect("small");
        let index = history.history_index();
        assert!((-1..len).contains(&index), "index {index} out of bounds for len {len}");
        assert_eq!(i64::try_from(history.visible_strokes().len()).expect("small"), index + 1);
    };

    check(&history);
    history.add_stroke(dummy_stroke("#a"));
    check(&history);
    history.add_stroke(dummy_stroke("#b"));
    check(&history);
    history.undo();
    check(&history);
    history.undo();
    check(&history);
    history.undo();
    check(&history);
    history.redo();
    check(&history);
    history.add_stroke(dummy_stroke("#c"));
    check(&history);
    history.redo();
    check(&history);
    history.clear();
    check(&history);
}

// =============================================================================
// Snapshot and clear
// =============================================================================

#[test]
fn snapshot_includes_the_redo_pending_tail() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    history.add_stroke(dummy_stroke("#b"));
    history.undo();

    let snapshot = history.snapshot();
    assert_eq!(snapshot.strokes.len(), 2);
    assert_eq!(snapshot.history_index, 0);
    // Only the visible prefix is rendered; "#b" rides along for later redo.
    assert_eq!(colors(history.visible_strokes()), vec!["#a"]);
}

#[test]
fn clear_resets_and_is_not_undoable() {
    let mut history = History::new();
    history.add_stroke(dummy_stroke("#a"));
    history.add_stroke(dummy_stroke("#b"));
    history.clear();

    assert_eq!(history.history_index(), -1);
    assert!(history.visible_strokes().is_empty());
    assert_eq!(history.undo(), None);
    assert_eq!(history.redo(), None);
}
