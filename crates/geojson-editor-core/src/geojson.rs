//! GeoJSON feature validation and input normalization.

use crate::error::FeatureError;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Geometry types with a `coordinates` member.
pub const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
];

/// Geometry type holding other geometries.
pub const GEOMETRY_COLLECTION: &str = "GeometryCollection";

/// A validation problem with a path like `features[2].geometry.type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Location of the problem.
    pub path: String,
    /// Human-readable message.
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Nesting depth of position arrays per geometry type (0 = a single position).
fn position_depth(geometry_type: &str) -> Option<usize> {
    match geometry_type {
        "Point" => Some(0),
        "MultiPoint" | "LineString" => Some(1),
        "MultiLineString" | "Polygon" => Some(2),
        "MultiPolygon" => Some(3),
        _ => None,
    }
}

fn validate_position(value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    match value.as_array() {
        Some(items) if items.len() >= 2 && items.iter().all(Value::is_number) => {}
        _ => errors.push(ValidationError::new(
            path,
            format!("Invalid position: {value} (expected at least two numbers)"),
        )),
    }
}

fn validate_coordinates(value: &Value, depth: usize, path: &str, errors: &mut Vec<ValidationError>) {
    if depth == 0 {
        validate_position(value, path, errors);
        return;
    }
    let Some(items) = value.as_array() else {
        errors.push(ValidationError::new(path, "Coordinates must be an array"));
        return;
    };
    for (i, item) in items.iter().enumerate() {
        validate_coordinates(item, depth - 1, &format!("{path}[{i}]"), errors);
    }
}

fn validate_geometry(geometry: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(object) = geometry.as_object() else {
        errors.push(ValidationError::new(
            path,
            "Geometry must be an object or null",
        ));
        return;
    };

    let type_path = format!("{path}.type");
    let geometry_type = match object.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            errors.push(ValidationError::new(
                type_path,
                format!("Invalid geometry type: {other}"),
            ));
            return;
        }
        None => {
            errors.push(ValidationError::new(type_path, "Missing geometry type"));
            return;
        }
    };

    if geometry_type == GEOMETRY_COLLECTION {
        match object.get("geometries").and_then(Value::as_array) {
            Some(members) => {
                for (i, member) in members.iter().enumerate() {
                    validate_geometry(member, &format!("{path}.geometries[{i}]"), errors);
                }
            }
            None => errors.push(ValidationError::new(
                format!("{path}.geometries"),
                "GeometryCollection must have a geometries array",
            )),
        }
        return;
    }

    let Some(depth) = position_depth(geometry_type) else {
        errors.push(ValidationError::new(
            type_path,
            format!("Invalid geometry type: \"{geometry_type}\""),
        ));
        return;
    };

    let coords_path = format!("{path}.coordinates");
    match object.get("coordinates") {
        Some(coords @ Value::Array(_)) => validate_coordinates(coords, depth, &coords_path, errors),
        Some(_) => errors.push(ValidationError::new(
            coords_path,
            "Coordinates must be an array",
        )),
        None => errors.push(ValidationError::new(coords_path, "Missing coordinates")),
    }
}

/// Validate one feature. `path` prefixes every reported path (e.g. `features[0]`).
pub fn validate_feature(feature: &Value, path: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let Some(object) = feature.as_object() else {
        errors.push(ValidationError::new(path, "Feature must be an object"));
        return errors;
    };

    match object.get("type") {
        Some(Value::String(t)) if t == "Feature" => {}
        Some(other) => errors.push(ValidationError::new(
            format!("{path}.type"),
            format!("Invalid feature type: {other} (expected \"Feature\")"),
        )),
        None => errors.push(ValidationError::new(
            format!("{path}.type"),
            "Missing feature type",
        )),
    }

    let geometry_path = format!("{path}.geometry");
    match object.get("geometry") {
        Some(Value::Null) => {}
        Some(geometry) => validate_geometry(geometry, &geometry_path, &mut errors),
        None => errors.push(ValidationError::new(geometry_path, "Missing geometry")),
    }

    let properties_path = format!("{path}.properties");
    match object.get("properties") {
        Some(Value::Null | Value::Object(_)) => {}
        Some(_) => errors.push(ValidationError::new(
            properties_path,
            "Properties must be an object or null",
        )),
        None => errors.push(ValidationError::new(properties_path, "Missing properties")),
    }

    errors
}

/// Validate a feature list, collecting every problem.
pub fn validate_features(features: &[Value]) -> Vec<ValidationError> {
    features
        .iter()
        .enumerate()
        .flat_map(|(i, feature)| validate_feature(feature, &format!("features[{i}]")))
        .collect()
}

/// Validate a feature list, failing on the first invalid element.
pub fn ensure_valid(features: &[Value]) -> Result<(), FeatureError> {
    for (index, feature) in features.iter().enumerate() {
        if let Some(first) = validate_feature(feature, &format!("features[{index}]")).first() {
            return Err(FeatureError::InvalidFeature {
                index,
                message: first.to_string(),
            });
        }
    }
    Ok(())
}

/// Normalize a feature, a feature array or a feature collection into a feature list.
pub fn normalize_input(input: Value) -> Result<Vec<Value>, FeatureError> {
    match input {
        Value::Array(items) => Ok(items),
        Value::Object(mut object) => match object.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => match object.remove("features") {
                Some(Value::Array(items)) => Ok(items),
                _ => Err(FeatureError::UnsupportedInput(
                    "FeatureCollection without a features array".to_string(),
                )),
            },
            Some("Feature") => Ok(vec![Value::Object(object)]),
            Some(other) => Err(FeatureError::UnsupportedInput(format!(
                "object of type \"{other}\""
            ))),
            None => Err(FeatureError::UnsupportedInput(
                "object without a type".to_string(),
            )),
        },
        other => Err(FeatureError::UnsupportedInput(format!(
            "{} value",
            json_kind(&other)
        ))),
    }
}

fn is_feature_object(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("Feature")
}

fn all_features(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(is_feature_object)
}

/// Whether a value is a Feature, a non-empty Feature array or a FeatureCollection whose
/// `features` are all Features.
pub fn is_recognized_shape(value: &Value) -> bool {
    match value {
        Value::Array(items) => all_features(items),
        Value::Object(_) => match value.get("type").and_then(Value::as_str) {
            Some("Feature") => true,
            Some("FeatureCollection") => value
                .get("features")
                .and_then(Value::as_array)
                .is_some_and(|items| all_features(items)),
            _ => false,
        },
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Wrap features in a `FeatureCollection`.
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
