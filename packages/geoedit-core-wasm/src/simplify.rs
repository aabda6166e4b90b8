//! Ramer-Douglas-Peucker simplification for GeoJSON lines and polygons.
//!
//! Every function returns new coordinates; inputs are never modified. Results
//! that would break a geometry's validity floor (2 positions for a line,
//! 4 for a polygon ring) fall back to the original coordinates.

use serde_json::Value;

use crate::console::LogSink;
use crate::geojson_features::{
    Feature, Geometry, GeometryField, Position, PREVIEW_KEY, SIMPLIFIED_AT_KEY, SIMPLIFIED_KEY,
};
use crate::models::SimplifyOptions;

const MIN_LINE_POSITIONS: usize = 2;
const MIN_RING_POSITIONS: usize = 4;

/// Douglas-Peucker polyline simplification.
///
/// Keeps the first and last position and every position that lies farther
/// than `tolerance` from the chord of the range it was found in. Ties on the
/// maximum distance go to the lowest index.
///
/// Ranges are processed from an explicit stack rather than by recursion, so
/// very long inputs cannot exhaust the call stack. A negative or NaN tolerance
/// behaves like zero. Positions with fewer than two ordinates make the input
/// come back unchanged.
pub fn douglas_peucker(points: &[Position], tolerance: f64) -> Vec<Position> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let Some(planar) = planar_points(points) else {
        return points.to_vec();
    };
    let tolerance = tolerance.max(0.0);

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut pending = vec![(0usize, last)];
    while let Some((start, end)) = pending.pop() {
        if end - start < 2 {
            continue;
        }
        let (split, max_distance) = farthest_point(&planar, start, end);
        if max_distance > tolerance {
            keep[split] = true;
            pending.push((split, end));
            pending.push((start, split));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then(|| point.clone()))
        .collect()
}

// Interior point of `start..=end` with the largest distance to the chord.
// Returns `(start, 0.0)` when every interior point lies on it.
fn farthest_point(points: &[(f64, f64)], start: usize, end: usize) -> (usize, f64) {
    let first = points[start];
    let last = points[end];
    let mut max_distance = 0.0;
    let mut index = start;

    for (i, point) in points.iter().enumerate().take(end).skip(start + 1) {
        let distance = perpendicular_distance(*point, first, last);
        if distance > max_distance {
            max_distance = distance;
            index = i;
        }
    }

    (index, max_distance)
}

/// Distance from `point` to the infinite line through `start` and `end`,
/// or to `start` itself when the two coincide.
pub fn perpendicular_distance(point: (f64, f64), start: (f64, f64), end: (f64, f64)) -> f64 {
    let (x, y) = point;
    let (x1, y1) = start;
    let (x2, y2) = end;

    if x1 == x2 && y1 == y2 {
        return ((x - x1).powi(2) + (y - y1).powi(2)).sqrt();
    }

    let numerator = ((y2 - y1) * x - (x2 - x1) * y + x2 * y1 - y2 * x1).abs();
    let denominator = ((y2 - y1).powi(2) + (x2 - x1).powi(2)).sqrt();
    numerator / denominator
}

fn planar_points(points: &[Position]) -> Option<Vec<(f64, f64)>> {
    points
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

pub fn simplify_line_string(coordinates: &[Position], tolerance: f64) -> Vec<Position> {
    let simplified = douglas_peucker(coordinates, tolerance);
    if simplified.len() < MIN_LINE_POSITIONS {
        return coordinates.to_vec();
    }
    simplified
}

/// Simplify each ring on its own. A ring that would drop below four positions
/// keeps its original form; a ring whose ends no longer meet is closed again.
pub fn simplify_polygon(rings: &[Vec<Position>], tolerance: f64) -> Vec<Vec<Position>> {
    rings.iter().map(|ring| simplify_ring(ring, tolerance)).collect()
}

fn simplify_ring(ring: &[Position], tolerance: f64) -> Vec<Position> {
    let mut simplified = douglas_peucker(ring, tolerance);
    if simplified.len() < MIN_RING_POSITIONS {
        return ring.to_vec();
    }
    if !ends_meet(&simplified) {
        let first = simplified[0].clone();
        simplified.push(first);
    }
    simplified
}

// Exact comparison on x and y
fn ends_meet(ring: &[Position]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first.get(0) == last.get(0) && first.get(1) == last.get(1),
        _ => false,
    }
}

pub fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Geometry {
    match geometry {
        Geometry::LineString { coordinates } => Geometry::LineString {
            coordinates: simplify_line_string(coordinates, tolerance),
        },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: simplify_polygon(coordinates, tolerance),
        },
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: coordinates
                .iter()
                .map(|line| simplify_line_string(line, tolerance))
                .collect(),
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .map(|polygon| simplify_polygon(polygon, tolerance))
                .collect(),
        },
        // Nothing to simplify for discrete points
        Geometry::Point { .. }
        | Geometry::MultiPoint { .. }
        | Geometry::GeometryCollection { .. } => geometry.clone(),
    }
}

/// Simplified copy of `feature`, stamped with `_simplified` and the current
/// time in `_simplifiedAt`.
pub fn simplify_feature(feature: &Feature, tolerance: f64) -> Feature {
    simplify_feature_at(feature, tolerance, now_millis())
}

/// Same as [`simplify_feature`] with an explicit timestamp (ms since epoch).
pub fn simplify_feature_at(feature: &Feature, tolerance: f64, simplified_at: i64) -> Feature {
    let Some(field) = &feature.geometry else {
        return feature.clone();
    };

    let geometry = match field {
        GeometryField::Typed(geometry) => {
            GeometryField::Typed(simplify_geometry(geometry, tolerance))
        }
        GeometryField::Raw(value) => GeometryField::Raw(value.clone()),
    };

    let mut properties = feature.properties.clone();
    properties.insert(SIMPLIFIED_KEY.to_string(), Value::Bool(true));
    properties.insert(SIMPLIFIED_AT_KEY.to_string(), Value::from(simplified_at));

    Feature {
        tag: feature.tag,
        id: feature.id.clone(),
        geometry: Some(geometry),
        properties,
    }
}

/// Kinds the editor offers to simplify.
pub fn is_simplifiable(feature: &Feature) -> bool {
    matches!(
        feature.typed_geometry(),
        Some(
            Geometry::LineString { .. }
                | Geometry::Polygon { .. }
                | Geometry::MultiLineString { .. }
                | Geometry::MultiPolygon { .. }
        )
    )
}

/// Simplify every simplifiable feature of a batch; everything else is passed
/// through as is. With `options.preview` the results carry `_isPreview`.
pub fn simplify_features(
    features: &[Feature],
    options: &SimplifyOptions,
    log: &dyn LogSink,
) -> Vec<Feature> {
    let simplified_at = now_millis();
    let mut simplified_count = 0;

    let result: Vec<Feature> = features
        .iter()
        .map(|feature| {
            if !is_simplifiable(feature) {
                if let Some(GeometryField::Raw(_)) = &feature.geometry {
                    log.warn(&format!(
                        "Skipping simplification of feature {} with malformed geometry",
                        describe_id(feature)
                    ));
                }
                return feature.clone();
            }
            simplified_count += 1;
            let mut simplified = simplify_feature_at(feature, options.tolerance, simplified_at);
            if options.preview {
                simplified.properties.insert(PREVIEW_KEY.to_string(), Value::Bool(true));
            }
            simplified
        })
        .collect();

    log.log(&format!(
        "Simplified {} features, {} features were unchanged.",
        simplified_count,
        features.len() - simplified_count
    ));
    result
}

pub(crate) fn describe_id(feature: &Feature) -> String {
    feature
        .id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "<no id>".to_string())
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn now_millis() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
