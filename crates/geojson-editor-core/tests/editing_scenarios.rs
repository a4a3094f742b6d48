use geojson_editor_core::{
    ArrowKey, CollapseSpec, EditorOptions, GeoJsonEditor, HomeEnd, ManualClock, Modifiers,
    Position, ScrollMetrics, Selection,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const LINE_FEATURE: &str = r##"{
  "type": "Feature",
  "geometry": {
    "type": "LineString",
    "coordinates": [
      [0, 0],
      [1, 1]
    ]
  },
  "properties": {
    "stroke": "#ff0000",
    "visible": true
  }
}"##;

fn editor(text: &str) -> GeoJsonEditor {
    GeoJsonEditor::from_text(text, EditorOptions::default())
}

fn coordinates_id(editor: &GeoJsonEditor) -> geojson_editor_core::NodeId {
    editor
        .nodes()
        .iter()
        .find(|n| n.key == "coordinates")
        .map(|n| n.id)
        .unwrap()
}

#[test]
fn test_insert_newline_in_single_line_object() {
    let mut ed = editor(r#"{"a": 1}"#);
    ed.set_cursor(Position::new(0, 4));
    ed.insert_newline();
    assert_eq!(ed.line_count(), 2);
    assert_eq!(ed.cursor(), Position::new(1, 0));
}

#[test]
fn test_auto_collapse_does_nothing_on_invalid_json() {
    let text = "{\n  \"type\": \"Feature\",\n  \"geometry\": {\n    \"type\": \"LineString\",\n    \"coordinates\": [1 2, 3]\n  },\n  \"properties\": {}\n}";
    let mut ed = editor(text);
    assert_eq!(ed.auto_collapse_coordinates(), 0);
    assert_eq!(ed.collapsed_nodes().len(), 0);

    let mut ok = editor(LINE_FEATURE);
    assert_eq!(ok.auto_collapse_coordinates(), 1);
    assert_eq!(ok.collapsed_nodes(), vec![coordinates_id(&ok)]);
}

#[test]
fn test_toggle_collapse_is_an_involution() {
    let mut ed = editor(LINE_FEATURE);
    let id = coordinates_id(&ed);
    let before = ed.collapsed_nodes();
    assert!(ed.toggle_collapse(id));
    assert!(ed.is_collapsed(id));
    assert!(ed.toggle_collapse(id));
    assert_eq!(ed.collapsed_nodes(), before);
}

#[test]
fn test_toggle_collapse_unknown_id_is_noop() {
    let mut ed = editor(LINE_FEATURE);
    let id = coordinates_id(&ed);
    ed.select_all();
    ed.handle_cut();
    assert!(!ed.toggle_collapse(id));
    assert!(ed.collapsed_nodes().is_empty());
}

#[test]
fn test_collapsed_lines_leave_visible_projection() {
    let mut ed = editor(LINE_FEATURE);
    let total = ed.line_count();
    ed.toggle_collapse(coordinates_id(&ed));

    let visible: Vec<usize> = ed.visible_lines().iter().map(|v| v.buffer_index).collect();
    assert_eq!(visible.len(), total - 2);
    assert!(!visible.contains(&5) && !visible.contains(&6));
    assert!(visible.contains(&4) && visible.contains(&7));

    assert_eq!(ed.to_visible_index(7), Some(5));
    ed.collapse_all();
    assert_eq!(ed.visible_lines().len(), 2);
    ed.expand_all();
    assert_eq!(ed.visible_lines().len(), total);
}

#[test]
fn test_cursor_skips_collapsed_range() {
    let mut ed = editor(LINE_FEATURE);
    ed.toggle_collapse(coordinates_id(&ed));

    // `[` of coordinates is at column 19 of line 4, `]` at column 4 of line 7.
    ed.set_cursor(Position::new(4, 19));
    ed.handle_arrow_key(ArrowKey::Right, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(7, 5));

    ed.handle_arrow_key(ArrowKey::Left, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(4, 19));

    ed.set_cursor(Position::new(4, 2));
    ed.handle_arrow_key(ArrowKey::Down, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(7, 2));
    ed.handle_arrow_key(ArrowKey::Up, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(4, 2));
}

#[test]
fn test_set_cursor_into_hidden_line_snaps_out() {
    let mut ed = editor(LINE_FEATURE);
    ed.toggle_collapse(coordinates_id(&ed));
    ed.set_cursor(Position::new(5, 3));
    assert_eq!(ed.cursor(), Position::new(4, 19));
}

#[test]
fn test_shift_selection_and_collapse_to_edge() {
    let mut ed = editor("hello world");
    ed.set_cursor(Position::new(0, 0));
    ed.handle_arrow_key(ArrowKey::Right, Modifiers { shift: true, word: true, document: false });
    assert_eq!(
        ed.selection(),
        Some(Selection::new(Position::new(0, 0), Position::new(0, 5)))
    );
    assert_eq!(ed.handle_copy(), "hello");

    ed.handle_arrow_key(ArrowKey::Left, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(0, 0));
    assert_eq!(ed.selection(), None);

    ed.handle_home_end(HomeEnd::End, Modifiers::shift());
    ed.handle_arrow_key(ArrowKey::Right, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(0, 11));
    assert_eq!(ed.selection(), None);
}

#[test]
fn test_select_all_spans_document() {
    let mut ed = editor("ab\ncde");
    ed.select_all();
    assert_eq!(
        ed.selection().unwrap().normalized(),
        (Position::new(0, 0), Position::new(1, 3))
    );
    assert_eq!(ed.handle_copy(), "ab\ncde");
}

#[test]
fn test_edges_are_noops() {
    let mut ed = editor("ab\ncd");
    ed.set_cursor(Position::new(0, 0));
    ed.handle_arrow_key(ArrowKey::Left, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(0, 0));

    ed.handle_home_end(HomeEnd::End, Modifiers::document());
    assert_eq!(ed.cursor(), Position::new(1, 2));
    ed.handle_arrow_key(ArrowKey::Right, Modifiers::default());
    assert_eq!(ed.cursor(), Position::new(1, 2));
}

#[test]
fn test_line_meta_carries_inline_controls_and_buttons() {
    let mut ed = editor(LINE_FEATURE);
    let meta = ed.line_meta();
    assert!(meta[0].visibility_button.is_some());
    assert!(meta[4].collapse_button.is_some());
    assert_eq!(meta[10].colors[0].value, "#ff0000");
    assert!(meta[11].booleans[0].value);

    assert!(ed.toggle_inline_boolean(11, 0));
    assert_eq!(ed.lines()[11], "    \"visible\": false");
    assert!(ed.update_inline_color(10, 0, "blue"));
    assert_eq!(ed.line_meta()[10].colors[0].value, "blue");
}

#[test]
fn test_invalid_json_keeps_editing_and_collapse_state() {
    let clock = ManualClock::new(0);
    let mut ed = GeoJsonEditor::with_clock(EditorOptions::default(), clock.clone());
    ed.set(serde_json::from_str::<Value>(LINE_FEATURE).unwrap(), &CollapseSpec::default())
        .unwrap();
    assert_eq!(ed.collapsed_nodes().len(), 1);

    // Break the JSON without touching brackets.
    ed.set_cursor(Position::new(1, 2));
    ed.insert_text("x");
    assert_eq!(ed.collapsed_nodes().len(), 1);

    clock.advance(200);
    ed.poll();
    let event = ed.last_event().unwrap();
    assert!(!event.is_change());
    assert!(ed.lines()[1].starts_with("  x\"type\""));

    // Editing continues.
    ed.handle_arrow_key(ArrowKey::Left, Modifiers::default());
    ed.delete_forward();
    clock.advance(200);
    ed.poll();
    assert!(ed.last_event().unwrap().is_change());
}

#[test]
fn test_emission_is_debounced() {
    let clock = ManualClock::new(0);
    let mut ed = GeoJsonEditor::with_clock(EditorOptions::default(), clock.clone());
    let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let sink = count.clone();
    ed.subscribe(move |_| {
        sink.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    for ch in ["{", "}"] {
        ed.insert_text(ch);
        clock.advance(50);
        ed.poll();
    }
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(ed.has_pending_emit());

    clock.advance(150);
    ed.poll();
    assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(!ed.has_pending_emit());
}

#[test]
fn test_render_block_holds_frames() {
    let mut ed = editor("a");
    ed.take_frame();
    ed.set_render_blocked(true);
    ed.insert_text("b");
    assert!(!ed.poll());
    assert!(!ed.take_frame());
    ed.set_render_blocked(false);
    assert!(ed.poll());
    assert!(ed.take_frame());
    assert!(!ed.take_frame());
}

#[test]
fn test_viewport_slice_is_bounded() {
    let features: Vec<Value> = (0..500)
        .map(|i| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [i, i]},
                "properties": {"i": i}
            })
        })
        .collect();
    let mut ed = GeoJsonEditor::new(EditorOptions::default());
    ed.set(json!(features), &CollapseSpec::None).unwrap();
    assert!(ed.visible_lines().len() > 4_000);

    let viewport = ed.viewport(ScrollMetrics {
        scroll_top: 20_000.0,
        line_height: 20.0,
        viewport_height: 600.0,
    });
    assert_eq!(viewport.window.start, 990);
    assert_eq!(viewport.window.end, 1040);
    assert_eq!(viewport.lines.len(), 50);
    assert_eq!(viewport.lines[0].buffer_index, 990);
}

#[test]
fn test_cursor_visible_position_accounts_for_collapse() {
    let mut ed = editor(LINE_FEATURE);
    ed.toggle_collapse(coordinates_id(&ed));
    ed.set_cursor(Position::new(8, 3));
    let pos = ed.cursor_visible_position().unwrap();
    assert_eq!(pos.row, 6);
    assert_eq!(pos.column, 3);
    assert_eq!(pos.display_column, 3);
}

#[test]
fn test_collapsed_set_reads_empty_while_unbalanced() {
    let mut ed = GeoJsonEditor::new(EditorOptions::default());
    ed.set(serde_json::from_str::<Value>(LINE_FEATURE).unwrap(), &CollapseSpec::default())
        .unwrap();
    let id = coordinates_id(&ed);

    ed.set_cursor(Position::new(0, 0));
    ed.delete_forward();
    assert!(ed.nodes().is_empty());
    assert!(ed.collapsed_nodes().is_empty());
    assert!(!ed.is_collapsed(id));
    assert_eq!(ed.visible_lines().len(), ed.line_count());

    ed.insert_text("{");
    assert_eq!(ed.collapsed_nodes(), vec![id]);
    assert!(ed.is_collapsed(id));
}
