// Export preparation: turn edited features into plain GeoJSON that other
// tools can read. Internal `_` keys never leave the editor; the user's
// attributes are folded into a single `Notes` string next to the style.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::console::LogSink;
use crate::geojson_features::{Feature, FeatureCollection, INTERNAL_KEY_PREFIX, STYLE_KEY};
use crate::models::StyleOptions;

const DEFAULT_EXPORT_NAME: &str = "export";

#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("No features to export. Please import data first.")]
    NothingToExport,
}

/// Export-ready copy of a feature: properties become `style` plus `Notes`.
pub fn prepare_feature(feature: &Feature) -> Feature {
    let style = match feature.properties.get(STYLE_KEY) {
        Some(Value::Object(style)) if !style.is_empty() => Value::Object(style.clone()),
        _ => serde_json::to_value(StyleOptions::default()).unwrap_or(Value::Null),
    };

    let notes = feature
        .properties
        .iter()
        .filter(|(key, _)| !key.starts_with(INTERNAL_KEY_PREFIX))
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut properties = Map::new();
    properties.insert("style".to_string(), style);
    if !notes.trim().is_empty() {
        properties.insert("Notes".to_string(), Value::String(notes.trim().to_string()));
    }

    Feature {
        tag: feature.tag,
        id: feature.id.clone(),
        geometry: feature.geometry.clone(),
        properties,
    }
}

pub fn prepare_export(
    features: &[Feature],
    log: &dyn LogSink,
) -> Result<FeatureCollection, ExportError> {
    if features.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    log.log(&format!("Exporting {} features", features.len()));

    let prepared: Vec<Feature> = features.iter().map(prepare_feature).collect();
    log.log(&format!("Processed {} features for export", prepared.len()));
    Ok(FeatureCollection::new(prepared))
}

/// `parcels.zip` becomes `parcels.geojson`, or `parcels_selection.geojson`
/// when only the selection is exported.
pub fn export_file_name(file_name: Option<&str>, selection_only: bool) -> String {
    let base = file_name
        .and_then(|name| name.split('.').next())
        .filter(|base| !base.is_empty())
        .unwrap_or(DEFAULT_EXPORT_NAME);

    if selection_only {
        format!("{}_selection.geojson", base)
    } else {
        format!("{}.geojson", base)
    }
}

/// Copy of `feature` without any internal `_` property.
pub fn strip_internal_properties(feature: &Feature) -> Feature {
    let mut stripped = feature.clone();
    stripped
        .properties
        .retain(|key, _| !key.starts_with(INTERNAL_KEY_PREFIX));
    stripped
}

// Matches how a browser prints a value inside a template string.
fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e21 => {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
