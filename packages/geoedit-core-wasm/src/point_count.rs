use crate::geojson_features::{Feature, Geometry};

/// Number of vertices in a feature's geometry.
///
/// Collections, malformed geometry and missing geometry count as zero.
pub fn count_feature_points(feature: &Feature) -> usize {
    match feature.typed_geometry() {
        Some(geometry) => count_geometry_points(geometry),
        None => 0,
    }
}

pub fn count_geometry_points(geometry: &Geometry) -> usize {
    match geometry {
        Geometry::Point { .. } => 1,
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
            coordinates.len()
        }
        // Exterior ring plus holes for polygons
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            coordinates.iter().map(Vec::len).sum()
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .flat_map(|polygon| polygon.iter())
            .map(Vec::len)
            .sum(),
        Geometry::GeometryCollection { .. } => 0,
    }
}

pub fn count_total_points(features: &[Feature]) -> usize {
    features.iter().map(count_feature_points).sum()
}

/// Percentage of vertices removed, rounded to the nearest integer.
pub fn point_reduction_percent(original: usize, simplified: usize) -> i64 {
    if original == 0 {
        return 0;
    }
    let percent = (1.0 - simplified as f64 / original as f64) * 100.0;
    // Halves round towards positive infinity, also for growth
    (percent + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(geometry: serde_json::Value) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {}
        }))
        .unwrap()
    }

    #[test]
    fn counts_each_kind() {
        let point = feature(json!({ "type": "Point", "coordinates": [1, 2] }));
        let multi_point = feature(json!({
            "type": "MultiPoint",
            "coordinates": [[1, 2], [3, 4], [5, 6]]
        }));
        let line = feature(json!({ "type": "LineString", "coordinates": [[0, 0], [1, 1]] }));
        let multi_line = feature(json!({
            "type": "MultiLineString",
            "coordinates": [[[0, 0], [1, 1]], [[2, 2], [3, 3], [4, 4]]]
        }));
        let polygon = feature(json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[2, 2], [3, 2], [3, 3], [2, 2]]
            ]
        }));
        let multi_polygon = feature(json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                [
                    [[5, 5], [6, 5], [6, 6], [5, 6], [5, 5]],
                    [[5.2, 5.2], [5.4, 5.2], [5.4, 5.4], [5.2, 5.2]]
                ]
            ]
        }));

        assert_eq!(count_feature_points(&point), 1);
        assert_eq!(count_feature_points(&multi_point), 3);
        assert_eq!(count_feature_points(&line), 2);
        assert_eq!(count_feature_points(&multi_line), 5);
        assert_eq!(count_feature_points(&polygon), 9);
        assert_eq!(count_feature_points(&multi_polygon), 13);
    }

    #[test]
    fn unknown_or_missing_geometry_counts_zero() {
        let missing = feature(serde_json::Value::Null);
        let malformed = feature(json!({ "type": "LineString", "coordinates": 12 }));
        let collection = feature(json!({
            "type": "GeometryCollection",
            "geometries": [{ "type": "Point", "coordinates": [0, 0] }]
        }));

        assert_eq!(count_feature_points(&missing), 0);
        assert_eq!(count_feature_points(&malformed), 0);
        assert_eq!(count_feature_points(&collection), 0);
    }

    #[test]
    fn total_is_zero_for_empty_and_additive() {
        assert_eq!(count_total_points(&[]), 0);

        let a = vec![
            feature(json!({ "type": "Point", "coordinates": [1, 2] })),
            feature(json!({ "type": "LineString", "coordinates": [[0, 0], [1, 1], [2, 2]] })),
        ];
        let b = vec![feature(json!({ "type": "MultiPoint", "coordinates": [[1, 2], [3, 4]] }))];
        let joined: Vec<Feature> = a.iter().chain(b.iter()).cloned().collect();

        assert_eq!(count_total_points(&joined), count_total_points(&a) + count_total_points(&b));
        assert_eq!(count_total_points(&joined), 6);
    }

    #[test]
    fn reduction_percent_rounds_and_handles_zero() {
        assert_eq!(point_reduction_percent(0, 0), 0);
        assert_eq!(point_reduction_percent(200, 50), 75);
        assert_eq!(point_reduction_percent(3, 2), 33);
        assert_eq!(point_reduction_percent(10, 10), 0);
        assert_eq!(point_reduction_percent(8, 7), 13);
        assert_eq!(point_reduction_percent(8, 9), -12);
    }
}
