use geojson_editor_core::{
    ArrowKey, CollapseSpec, EditorOptions, GeoJsonEditor, ManualClock, Modifiers, Position,
};
use serde_json::json;

fn main() {
    let clock = ManualClock::new(0);
    let mut editor = GeoJsonEditor::with_clock(EditorOptions::default(), clock.clone());
    editor.subscribe(|event| match event.document() {
        Some(doc) => println!("change: {} features", doc["features"].as_array().map_or(0, Vec::len)),
        None => println!("error: {:?}", event.error().map(|e| &e.message)),
    });

    editor
        .set(
            json!([
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}, "properties": {"stroke": "red"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [2, 2]}, "properties": {}}
            ]),
            &CollapseSpec::default(),
        )
        .unwrap();

    // Only the LineString coordinates span several lines, so one node is collapsed.
    assert_eq!(editor.collapsed_nodes().len(), 1);
    for line in editor.visible_lines() {
        let marker = if line.meta.is_collapsed { "+" } else { " " };
        println!("{marker} {:>3} {}", line.buffer_index, line.content);
    }

    // Hide the point from the emitted document.
    let point = editor.feature_ranges()[1].feature_key.clone();
    editor.toggle_feature_visibility(&point);
    clock.advance(200);
    editor.poll();

    // Typing garbage keeps the buffer editable and reports an error.
    editor.set_cursor(Position::new(1, 2));
    editor.insert_text("?");
    clock.advance(200);
    editor.poll();

    editor.handle_arrow_key(ArrowKey::Left, Modifiers::default());
    editor.delete_forward();
    clock.advance(200);
    editor.poll();
}
