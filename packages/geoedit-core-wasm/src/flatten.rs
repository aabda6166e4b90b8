use serde_json::{json, Value};

use crate::console::LogSink;
use crate::geojson_features::{
    Feature, FeatureCollection, FeatureId, Geometry, GeometryField, PARENT_ID_KEY, PART_INDEX_KEY,
};
use crate::simplify::describe_id;

/// Whether the UI should treat a feature as made of several parts.
///
/// Multi* kinds and geometry collections always are. A polygon counts as
/// multipart as soon as it has holes, even though [`flatten`] will not split
/// it. Malformed geometry falls back to a coordinate nesting check.
pub fn is_multipart(feature: &Feature) -> bool {
    match &feature.geometry {
        Some(GeometryField::Typed(geometry)) => match geometry {
            Geometry::MultiPoint { .. }
            | Geometry::MultiLineString { .. }
            | Geometry::MultiPolygon { .. }
            | Geometry::GeometryCollection { .. } => true,
            Geometry::Polygon { coordinates } => coordinates.len() > 1,
            // Nesting depth is fixed by the kind, the heuristic never matches
            Geometry::Point { .. } | Geometry::LineString { .. } => false,
        },
        Some(GeometryField::Raw(value)) => raw_is_multipart(value),
        None => false,
    }
}

fn raw_is_multipart(value: &Value) -> bool {
    let type_name = value.get("type").and_then(Value::as_str).unwrap_or_default();
    if type_name.starts_with("Multi") || type_name == "GeometryCollection" {
        return true;
    }

    let Some(coordinates) = value.get("coordinates").and_then(Value::as_array) else {
        return false;
    };

    if type_name == "Polygon" {
        return coordinates.len() > 1;
    }

    // Best effort: more than one entry, each an array of arrays
    coordinates.len() > 1
        && coordinates[0]
            .as_array()
            .and_then(|first| first.first())
            .is_some_and(Value::is_array)
}

/// Split a multipart feature into one feature per part.
///
/// Only MultiPoint, MultiLineString and MultiPolygon are decomposed. Every
/// other feature, including polygons with holes and geometry collections that
/// [`is_multipart`] reports as multipart, comes back as a single-element vec.
pub fn flatten(feature: &Feature, log: &dyn LogSink) -> Vec<Feature> {
    if !is_multipart(feature) {
        return vec![feature.clone()];
    }

    log.log(&format!("Flattening multi-part feature: {}", describe_id(feature)));

    match &feature.geometry {
        Some(GeometryField::Typed(Geometry::MultiPoint { coordinates })) => {
            let parts = coordinates.iter().map(|point| Geometry::Point {
                coordinates: point.clone(),
            });
            make_parts(feature, parts)
        }
        Some(GeometryField::Typed(Geometry::MultiLineString { coordinates })) => {
            let parts = coordinates.iter().map(|line| Geometry::LineString {
                coordinates: line.clone(),
            });
            make_parts(feature, parts)
        }
        Some(GeometryField::Typed(Geometry::MultiPolygon { coordinates })) => {
            let parts = coordinates.iter().map(|rings| Geometry::Polygon {
                coordinates: rings.clone(),
            });
            make_parts(feature, parts)
        }
        Some(GeometryField::Typed(other)) => {
            log.warn(&format!("Unsupported multi-part geometry type: {}", other.type_name()));
            vec![feature.clone()]
        }
        Some(GeometryField::Raw(value)) => flatten_raw(feature, value, log),
        None => vec![feature.clone()],
    }
}

// Malformed geometry that still names a Multi* kind is split entry by entry;
// each part is re-parsed and stays raw if it is still malformed.
fn flatten_raw(feature: &Feature, value: &Value, log: &dyn LogSink) -> Vec<Feature> {
    let Some(coordinates) = value.get("coordinates").and_then(Value::as_array) else {
        log.warn("Invalid coordinates array in multi-part feature");
        return vec![feature.clone()];
    };

    let type_name = value.get("type").and_then(Value::as_str).unwrap_or_default();
    let Some(single_type) = singular_kind(type_name) else {
        log.warn(&format!("Unsupported multi-part geometry type: {}", type_name));
        return vec![feature.clone()];
    };

    coordinates
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let part = GeometryField::from_json(json!({
                "type": single_type,
                "coordinates": entry
            }));
            make_part(feature, index, part)
        })
        .collect()
}

fn singular_kind(type_name: &str) -> Option<&'static str> {
    match type_name {
        "MultiPoint" => Some("Point"),
        "MultiLineString" => Some("LineString"),
        "MultiPolygon" => Some("Polygon"),
        _ => None,
    }
}

fn make_parts(parent: &Feature, parts: impl Iterator<Item = Geometry>) -> Vec<Feature> {
    parts
        .enumerate()
        .map(|(index, geometry)| make_part(parent, index, geometry.into()))
        .collect()
}

fn make_part(parent: &Feature, index: usize, geometry: GeometryField) -> Feature {
    let mut properties = parent.properties.clone();
    properties.insert(PARENT_ID_KEY.to_string(), parent.id_value());
    properties.insert(PART_INDEX_KEY.to_string(), Value::from(index));

    Feature {
        tag: parent.tag,
        id: Some(FeatureId::Text(format!("{}-part-{}", part_label(parent), index + 1))),
        geometry: Some(geometry),
        properties,
    }
}

// Missing, empty and zero ids all label parts as "feature-part-N"
fn part_label(feature: &Feature) -> String {
    match &feature.id {
        Some(FeatureId::Text(text)) if !text.is_empty() => text.clone(),
        Some(FeatureId::Number(number)) if number.as_f64() != Some(0.0) => number.to_string(),
        _ => "feature".to_string(),
    }
}

/// Flatten every feature of a collection, keeping the relative order.
pub fn flatten_collection(collection: &FeatureCollection, log: &dyn LogSink) -> FeatureCollection {
    log.log("Flattening multi-part features in collection");

    let mut flattened = Vec::with_capacity(collection.features.len());
    let mut multipart_count = 0;

    for feature in &collection.features {
        if is_multipart(feature) {
            multipart_count += 1;
            flattened.extend(flatten(feature, log));
        } else {
            flattened.push(feature.clone());
        }
    }

    log.log(&format!(
        "Flattened {} multi-part features into {} individual features",
        multipart_count,
        flattened.len()
    ));

    FeatureCollection::new(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{MemorySink, NullSink};

    fn feature(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    fn two_part_multipolygon() -> Feature {
        feature(json!({
            "type": "Feature",
            "id": "parcel-9",
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                    [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                ]
            },
            "properties": { "owner": "county" }
        }))
    }

    #[test]
    fn detects_multipart_kinds() {
        let multi = two_part_multipolygon();
        let line = feature(json!({
            "type": "Feature",
            "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
            "properties": {}
        }));
        let point = feature(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [0, 0] },
            "properties": {}
        }));
        let collection = feature(json!({
            "type": "Feature",
            "geometry": { "type": "GeometryCollection", "geometries": [] },
            "properties": {}
        }));
        let missing = feature(json!({ "type": "Feature", "geometry": null, "properties": {} }));

        assert!(is_multipart(&multi));
        assert!(is_multipart(&collection));
        assert!(!is_multipart(&line));
        assert!(!is_multipart(&point));
        assert!(!is_multipart(&missing));
    }

    #[test]
    fn multipolygon_splits_into_parts_with_lineage() {
        let original = two_part_multipolygon();
        let before = original.clone();
        let collection = FeatureCollection::new(vec![original]);

        let flattened = flatten_collection(&collection, &NullSink);

        assert_eq!(collection.features[0], before);
        assert_eq!(flattened.features.len(), 2);
        for (index, part) in flattened.features.iter().enumerate() {
            assert_eq!(part.id, Some(FeatureId::Text(format!("parcel-9-part-{}", index + 1))));
            assert_eq!(part.properties[PARENT_ID_KEY], json!("parcel-9"));
            assert_eq!(part.properties[PART_INDEX_KEY], json!(index));
            assert_eq!(part.properties["owner"], json!("county"));
            assert_eq!(part.geometry_type(), Some("Polygon"));
        }
        assert_eq!(
            flattened.features[1].typed_geometry(),
            Some(&Geometry::Polygon {
                coordinates: vec![vec![
                    vec![5.0, 5.0],
                    vec![6.0, 5.0],
                    vec![6.0, 6.0],
                    vec![5.0, 5.0]
                ]]
            })
        );
    }

    #[test]
    fn multipoint_and_multilinestring_split() {
        let points = feature(json!({
            "type": "Feature",
            "id": 4,
            "geometry": { "type": "MultiPoint", "coordinates": [[0, 0], [1, 1], [2, 2]] },
            "properties": {}
        }));
        let lines = feature(json!({
            "type": "Feature",
            "id": "roads",
            "geometry": {
                "type": "MultiLineString",
                "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]
            },
            "properties": {}
        }));

        let point_parts = flatten(&points, &NullSink);
        assert_eq!(point_parts.len(), 3);
        assert_eq!(point_parts[2].id, Some(FeatureId::from("4-part-3")));
        assert_eq!(point_parts[2].properties[PARENT_ID_KEY], json!(4));
        assert_eq!(
            point_parts[2].typed_geometry(),
            Some(&Geometry::Point { coordinates: vec![2.0, 2.0] })
        );

        let line_parts = flatten(&lines, &NullSink);
        assert_eq!(line_parts.len(), 2);
        assert!(line_parts.iter().all(|part| part.geometry_type() == Some("LineString")));
    }

    #[test]
    fn single_part_feature_is_returned_as_is() {
        let line = feature(json!({
            "type": "Feature",
            "id": "l1",
            "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
            "properties": { "kind": "trail" }
        }));
        assert_eq!(flatten(&line, &NullSink), vec![line]);
    }

    #[test]
    fn polygon_with_holes_is_multipart_but_not_split() {
        let holed = feature(json!({
            "type": "Feature",
            "id": "lake",
            "geometry": {
                "type": "Polygon",
                "coordinates": [
                    [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                    [[4, 4], [6, 4], [6, 6], [4, 4]]
                ]
            },
            "properties": {}
        }));
        let sink = MemorySink::new();

        assert!(is_multipart(&holed));
        assert_eq!(flatten(&holed, &sink), vec![holed.clone()]);
        assert_eq!(sink.warnings(), vec!["Unsupported multi-part geometry type: Polygon"]);
    }

    #[test]
    fn geometry_collection_passes_through() {
        let collection = feature(json!({
            "type": "Feature",
            "id": "gc",
            "geometry": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Point", "coordinates": [0, 0] },
                    { "type": "LineString", "coordinates": [[0, 0], [1, 1]] }
                ]
            },
            "properties": {}
        }));
        assert_eq!(flatten(&collection, &NullSink), vec![collection]);
    }

    #[test]
    fn missing_id_uses_feature_label_and_null_parent() {
        let anonymous = feature(json!({
            "type": "Feature",
            "geometry": { "type": "MultiPoint", "coordinates": [[0, 0], [1, 1]] },
            "properties": {}
        }));
        let parts = flatten(&anonymous, &NullSink);
        assert_eq!(parts[0].id, Some(FeatureId::from("feature-part-1")));
        assert_eq!(parts[1].id, Some(FeatureId::from("feature-part-2")));
        assert_eq!(parts[0].properties[PARENT_ID_KEY], Value::Null);
    }

    #[test]
    fn malformed_multipart_is_returned_unchanged() {
        let broken = feature(json!({
            "type": "Feature",
            "id": "bad",
            "geometry": { "type": "MultiLineString", "coordinates": "oops" },
            "properties": {}
        }));
        let sink = MemorySink::new();

        assert!(is_multipart(&broken));
        assert_eq!(flatten(&broken, &sink), vec![broken.clone()]);
        assert_eq!(sink.warnings(), vec!["Invalid coordinates array in multi-part feature"]);
    }

    #[test]
    fn raw_multipart_with_array_coordinates_is_split() {
        // Third part has the wrong nesting, so the whole geometry is raw
        let uneven = feature(json!({
            "type": "Feature",
            "id": "mixed",
            "geometry": { "type": "MultiPoint", "coordinates": [[0, 0], [1, 1], [[2, 2]]] },
            "properties": {}
        }));

        let parts = flatten(&uneven, &NullSink);

        assert_eq!(parts.len(), 3);
        assert_eq!(
            parts[0].typed_geometry(),
            Some(&Geometry::Point { coordinates: vec![0.0, 0.0] })
        );
        assert_eq!(
            parts[2].geometry,
            Some(GeometryField::Raw(json!({ "type": "Point", "coordinates": [[2, 2]] })))
        );
    }

    #[test]
    fn nesting_heuristic_flags_but_does_not_split() {
        let too_deep = feature(json!({
            "type": "Feature",
            "id": "deep",
            "geometry": {
                "type": "LineString",
                "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3]]]
            },
            "properties": {}
        }));

        assert!(is_multipart(&too_deep));
        assert_eq!(flatten(&too_deep, &NullSink), vec![too_deep.clone()]);
    }

    #[test]
    fn collection_order_is_preserved() {
        let first = feature(json!({
            "type": "Feature",
            "id": "a",
            "geometry": { "type": "Point", "coordinates": [0, 0] },
            "properties": {}
        }));
        let last = feature(json!({
            "type": "Feature",
            "id": "z",
            "geometry": { "type": "Point", "coordinates": [9, 9] },
            "properties": {}
        }));
        let collection = FeatureCollection::new(vec![first, two_part_multipolygon(), last]);
        let sink = MemorySink::new();

        let flattened = flatten_collection(&collection, &sink);

        let ids: Vec<String> = flattened
            .features
            .iter()
            .map(|f| f.id.as_ref().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "parcel-9-part-1", "parcel-9-part-2", "z"]);
        assert_eq!(
            sink.lines().last().map(String::as_str),
            Some("log: Flattened 1 multi-part features into 4 individual features")
        );
    }
}
