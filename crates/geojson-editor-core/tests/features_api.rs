use geojson_editor_core::{CollapseSpec, EditorEvent, EditorOptions, FeatureError, GeoJsonEditor};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn point(name: &str, x: f64, y: f64) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [x, y]},
        "properties": {"name": name}
    })
}

fn line(name: &str) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1], [2, 0]]},
        "properties": {"name": name}
    })
}

fn names(features: &[Value]) -> Vec<String> {
    features
        .iter()
        .map(|f| f["properties"]["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn editor_with(features: Vec<Value>) -> GeoJsonEditor {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    editor.set(Value::Array(features), &CollapseSpec::None).unwrap();
    editor
}

#[test]
fn test_set_accepts_all_input_shapes() {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());

    editor.set(point("a", 0.0, 0.0), &CollapseSpec::None).unwrap();
    assert_eq!(names(&editor.get_all()), vec!["a"]);

    editor
        .set(json!([point("a", 0.0, 0.0), point("b", 1.0, 1.0)]), &CollapseSpec::None)
        .unwrap();
    assert_eq!(names(&editor.get_all()), vec!["a", "b"]);

    let collection = json!({"type": "FeatureCollection", "features": [point("c", 2.0, 2.0)]});
    editor.set(collection, &CollapseSpec::None).unwrap();
    assert_eq!(names(&editor.get_all()), vec!["c"]);
}

#[test]
fn test_set_with_invalid_geometry_type_fails_atomically() {
    let mut editor = editor_with(vec![point("keep", 0.0, 0.0)]);
    let before = editor.text();

    let err = editor
        .set(
            json!([
                point("ok", 1.0, 1.0),
                {"type": "Feature", "geometry": {"type": "InvalidType", "coordinates": [0, 0]}, "properties": {}}
            ]),
            &CollapseSpec::default(),
        )
        .unwrap_err();

    assert!(err.to_string().contains("Invalid geometry type"));
    assert!(matches!(err, FeatureError::InvalidFeature { index: 1, .. }));
    assert_eq!(editor.text(), before);
}

#[test]
fn test_unsupported_input_is_rejected() {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    let err = editor
        .set(json!({"type": "Point", "coordinates": [0, 0]}), &CollapseSpec::None)
        .unwrap_err();
    assert!(matches!(err, FeatureError::UnsupportedInput(_)));
    assert!(!editor.can_undo());
}

#[test]
fn test_add_and_insert_at_with_negative_index() {
    let mut editor = editor_with(vec![point("a", 0.0, 0.0), point("c", 2.0, 2.0)]);
    editor.add(point("d", 3.0, 3.0), &CollapseSpec::None).unwrap();
    editor.insert_at(point("b", 1.0, 1.0), -2, &CollapseSpec::None).unwrap();
    assert_eq!(names(&editor.get_all()), vec!["a", "b", "c", "d"]);

    editor.insert_at(point("z", 9.0, 9.0), 100, &CollapseSpec::None).unwrap();
    editor.insert_at(point("first", 9.0, 9.0), -100, &CollapseSpec::None).unwrap();
    assert_eq!(names(&editor.get_all()), vec!["first", "a", "b", "c", "d", "z"]);
}

#[test]
fn test_get_and_remove_at_negative_indices() {
    let mut editor = editor_with(vec![
        point("a", 0.0, 0.0),
        point("b", 1.0, 1.0),
        point("c", 2.0, 2.0),
    ]);

    assert_eq!(editor.get(-1), editor.get(2));
    assert_eq!(editor.get(3), None);
    assert_eq!(editor.get(-4), None);

    let removed = editor.remove_at(-1, &CollapseSpec::None).unwrap();
    assert_eq!(removed, Some(point("c", 2.0, 2.0)));
    assert_eq!(names(&editor.get_all()), vec!["a", "b"]);

    let before = editor.text();
    assert_eq!(editor.remove_at(5, &CollapseSpec::None).unwrap(), None);
    assert_eq!(editor.text(), before);
}

#[test]
fn test_writes_require_parseable_buffer() {
    let mut editor = GeoJsonEditor::from_text("{\"type\": ", EditorOptions::default());
    assert!(matches!(
        editor.add(point("a", 0.0, 0.0), &CollapseSpec::None),
        Err(FeatureError::InvalidDocument(_))
    ));
    assert!(matches!(
        editor.remove_at(0, &CollapseSpec::None),
        Err(FeatureError::InvalidDocument(_))
    ));
    assert_eq!(editor.get(0), None);
    assert!(editor.get_all().is_empty());
}

#[test]
fn test_default_collapse_targets_outermost_coordinates() {
    let polygon = json!({
        "type": "Feature",
        "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]},
        "properties": {}
    });
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    editor
        .set(json!([polygon, line("l")]), &CollapseSpec::default())
        .unwrap();

    let collapsed = editor.collapsed_nodes();
    assert_eq!(collapsed.len(), 2);
    for id in collapsed {
        let node = editor.nodes().iter().find(|n| n.id == id).unwrap();
        assert_eq!(node.key, "coordinates");
        assert_eq!(node.depth, 2);
    }
}

#[test]
fn test_root_and_per_feature_collapse() {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    editor
        .set(json!([line("a"), line("b")]), &CollapseSpec::Root)
        .unwrap();
    assert_eq!(editor.collapsed_nodes().len(), 2);
    assert_eq!(editor.visible_lines().len(), 4);

    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    let spec = CollapseSpec::per_feature(|feature, _| {
        if feature["properties"]["name"] == "b" {
            vec!["geometry".to_string()]
        } else {
            Vec::new()
        }
    });
    editor.set(json!([line("a"), line("b")]), &spec).unwrap();
    let collapsed = editor.collapsed_nodes();
    assert_eq!(collapsed.len(), 1);
    let node = editor.nodes().iter().find(|n| n.id == collapsed[0]).unwrap();
    assert_eq!(node.key, "geometry");
    assert_eq!(node.occurrence, 1);
}

#[test]
fn test_hidden_feature_is_excluded_from_emit() {
    let mut editor = editor_with(vec![
        point("a", 0.0, 0.0),
        point("b", 1.0, 1.0),
        point("c", 2.0, 2.0),
    ]);
    let key = editor.feature_ranges()[0].feature_key.clone();
    assert!(editor.toggle_feature_visibility(&key));

    let event = editor.emit();
    let features = event.document().unwrap()["features"].as_array().unwrap().clone();
    assert_eq!(features.len(), 2);
    assert_eq!(names(&features), vec!["b", "c"]);

    // The buffer still holds all three.
    assert_eq!(editor.get_all().len(), 3);
}

#[test]
fn test_remove_all_clears_collapse_and_visibility() {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    editor.set(json!([line("a"), line("b")]), &CollapseSpec::default()).unwrap();
    let key = editor.feature_ranges()[1].feature_key.clone();
    editor.toggle_feature_visibility(&key);

    editor.remove_all();
    assert_eq!(editor.text(), "");
    assert!(editor.collapsed_nodes().is_empty());
    assert!(editor.hidden_features().is_empty());
    assert!(editor.get_all().is_empty());

    assert!(editor.undo());
    assert_eq!(editor.get_all().len(), 2);
    assert!(editor.is_feature_hidden(&key));
}

#[test]
fn test_emit_dispatches_to_subscribers() {
    use std::sync::{Arc, Mutex};

    let mut editor = editor_with(vec![point("a", 0.0, 0.0)]);
    let seen: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    editor.subscribe(move |event| sink.lock().unwrap().push(event.is_change()));

    editor.emit();
    editor.set_cursor(geojson_editor_core::Position::new(0, 0));
    editor.insert_text("oops");
    let event = editor.emit();

    assert!(matches!(event, EditorEvent::Error(_)));
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    assert_eq!(editor.last_event(), Some(&event));
}

#[test]
fn test_save_and_open() {
    let mut editor = editor_with(vec![point("a", 0.0, 0.0), point("b", 1.0, 1.0)]);
    let key = editor.feature_ranges()[1].feature_key.clone();
    editor.toggle_feature_visibility(&key);

    let saved = editor.save(None).unwrap();
    assert_eq!(saved.file_name, "features.geojson");
    let parsed: Value = serde_json::from_str(&saved.content).unwrap();
    assert_eq!(parsed["type"], "FeatureCollection");
    assert_eq!(names(parsed["features"].as_array().unwrap()), vec!["a"]);
    assert_eq!(editor.save(Some("out.json")).unwrap().file_name, "out.json");

    let mut other = GeoJsonEditor::new(EditorOptions::default());
    assert_eq!(other.open(&saved.content).unwrap(), 1);
    assert_eq!(names(&other.get_all()), vec!["a"]);

    assert!(matches!(other.open("not json"), Err(FeatureError::Parse(_))));
    assert!(matches!(other.open("42"), Err(FeatureError::UnsupportedInput(_))));
}

#[test]
fn test_collapse_spec_replaces_previous_collapse_state() {
    let mut editor = GeoJsonEditor::new(EditorOptions::default());
    editor.set(line("a"), &CollapseSpec::default()).unwrap();
    assert_eq!(editor.collapsed_nodes().len(), 1);

    editor.set(line("b"), &CollapseSpec::Keys(vec![])).unwrap();
    assert!(editor.collapsed_nodes().is_empty());

    editor.set(line("c"), &CollapseSpec::keys(["properties"])).unwrap();
    let collapsed = editor.collapsed_nodes();
    assert_eq!(collapsed.len(), 1);
    let node = editor.nodes().iter().find(|n| n.id == collapsed[0]).unwrap();
    assert_eq!(node.key, "properties");

    // `None` keeps what is there.
    editor.add(line("d"), &CollapseSpec::None).unwrap();
    assert_eq!(editor.collapsed_nodes(), collapsed);
}

#[test]
fn test_identical_features_keep_their_own_visibility() {
    let twins = || vec![point("twin", 0.0, 0.0), point("twin", 0.0, 0.0)];

    // Removing the hidden twin leaves the other one visible.
    let mut editor = editor_with(twins());
    let first = editor.feature_ranges()[0].feature_key.clone();
    assert_ne!(first, editor.feature_ranges()[1].feature_key);
    editor.toggle_feature_visibility(&first);
    editor.remove_at(0, &CollapseSpec::None).unwrap();
    assert!(editor.hidden_features().is_empty());
    let event = editor.emit();
    assert_eq!(event.document().unwrap()["features"].as_array().unwrap().len(), 1);

    // Removing the visible twin keeps the survivor hidden.
    let mut editor = editor_with(twins());
    let second = editor.feature_ranges()[1].feature_key.clone();
    editor.toggle_feature_visibility(&second);
    editor.remove_at(0, &CollapseSpec::None).unwrap();
    assert_eq!(editor.hidden_features().len(), 1);
    let event = editor.emit();
    assert_eq!(event.document().unwrap()["features"].as_array().unwrap().len(), 0);

    // Inserting a twin in front shifts the hidden state along with the feature.
    let mut editor = editor_with(vec![point("twin", 0.0, 0.0)]);
    let only = editor.feature_ranges()[0].feature_key.clone();
    editor.toggle_feature_visibility(&only);
    editor
        .insert_at(point("twin", 0.0, 0.0), 0, &CollapseSpec::None)
        .unwrap();
    let hidden: Vec<bool> = editor
        .feature_ranges()
        .iter()
        .map(|r| editor.is_feature_hidden(&r.feature_key))
        .collect();
    assert_eq!(hidden, vec![false, true]);
}
