use geojson_editor_core::{
    CollapseSpec, EditorOptions, GeoJsonEditor, ManualClock, Position,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn editor_with_clock(text: &str) -> (GeoJsonEditor, ManualClock) {
    let clock = ManualClock::new(1_000);
    let mut editor = GeoJsonEditor::with_clock(EditorOptions::default(), clock.clone());
    if !text.is_empty() {
        editor.insert_text(text);
        editor.clear_history();
    }
    (editor, clock)
}

#[test]
fn test_rapid_typing_is_one_undo_step() {
    let (mut editor, clock) = editor_with_clock("");
    for ch in ["a", "b", "c"] {
        editor.insert_text(ch);
        clock.advance(100);
    }
    assert_eq!(editor.text(), "abc");

    assert!(editor.undo());
    assert_eq!(editor.text(), "");
    assert!(!editor.can_undo());

    assert!(editor.redo());
    assert_eq!(editor.text(), "abc");
    assert_eq!(editor.cursor(), Position::new(0, 3));
}

#[test]
fn test_edit_after_window_is_separate_step() {
    let (mut editor, clock) = editor_with_clock("");
    editor.insert_text("a");
    clock.advance(100);
    editor.insert_text("b");
    clock.advance(600);
    editor.insert_text("c");

    assert!(editor.undo());
    assert_eq!(editor.text(), "ab");
    assert!(editor.undo());
    assert_eq!(editor.text(), "");
}

#[test]
fn test_kind_change_breaks_group() {
    let (mut editor, clock) = editor_with_clock("");
    editor.insert_text("ab");
    clock.advance(10);
    editor.delete_backward();
    clock.advance(10);
    editor.insert_text("c");
    assert_eq!(editor.text(), "ac");

    editor.undo();
    assert_eq!(editor.text(), "a");
    editor.undo();
    assert_eq!(editor.text(), "ab");
    editor.undo();
    assert_eq!(editor.text(), "");
}

#[test]
fn test_newlines_never_group() {
    let (mut editor, _clock) = editor_with_clock("x");
    editor.insert_newline();
    editor.insert_newline();
    assert_eq!(editor.line_count(), 3);
    editor.undo();
    assert_eq!(editor.line_count(), 2);
}

#[test]
fn test_new_edit_clears_redo() {
    let (mut editor, clock) = editor_with_clock("");
    editor.insert_text("a");
    editor.undo();
    assert!(editor.can_redo());
    clock.advance(1_000);
    editor.insert_text("b");
    assert!(!editor.can_redo());
}

#[test]
fn test_history_cap_evicts_oldest() {
    let clock = ManualClock::new(0);
    let options = EditorOptions {
        history_limit: 3,
        ..EditorOptions::default()
    };
    let mut editor = GeoJsonEditor::with_clock(options, clock.clone());
    for _ in 0..5 {
        editor.insert_newline();
    }
    let mut steps = 0;
    while editor.undo() {
        steps += 1;
    }
    assert_eq!(steps, 3);
    assert_eq!(editor.line_count(), 3);
}

#[test]
fn test_remove_at_then_undo_restores_hidden_membership() {
    let clock = ManualClock::new(0);
    let mut editor = GeoJsonEditor::with_clock(EditorOptions::default(), clock);
    let features: Vec<_> = (0..3)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [i, i]},
                "properties": {"i": i}
            })
        })
        .collect();
    editor.set(json!(features), &CollapseSpec::None).unwrap();
    let before_text = editor.text();

    let hidden_key = editor.feature_ranges()[1].feature_key.clone();
    editor.toggle_feature_visibility(&hidden_key);

    editor.remove_at(1, &CollapseSpec::None).unwrap();
    assert!(editor.hidden_features().is_empty());
    assert_eq!(editor.get_all().len(), 2);

    assert!(editor.undo());
    assert_eq!(editor.text(), before_text);
    assert_eq!(editor.hidden_features(), vec![hidden_key]);
}

#[test]
fn test_clear_history_keeps_buffer() {
    let (mut editor, _clock) = editor_with_clock("");
    editor.insert_text("abc");
    editor.clear_history();
    assert!(!editor.can_undo());
    assert_eq!(editor.text(), "abc");
}
