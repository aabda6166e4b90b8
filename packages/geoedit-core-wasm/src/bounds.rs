// Extent of a feature set, used to fit the map view to freshly loaded data.

use geo::BoundingRect;
use geo_types::{
    coord, Coord, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon, Rect,
};

use crate::geojson_features::{Feature, Geometry, Position};
use crate::models::Extent;

/// Bounding box over every well-formed geometry, or `None` when there is
/// nothing finite to fit (empty input, only malformed geometry, NaNs).
pub fn collection_extent(features: &[Feature]) -> Option<Extent> {
    features
        .iter()
        .filter_map(Feature::typed_geometry)
        .filter_map(|geometry| to_geo(geometry).bounding_rect())
        .filter(is_finite)
        .map(|rect| Extent {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
        .reduce(|acc, next| Extent {
            min_x: acc.min_x.min(next.min_x),
            min_y: acc.min_y.min(next.min_y),
            max_x: acc.max_x.max(next.max_x),
            max_y: acc.max_y.max(next.max_y),
        })
}

fn is_finite(rect: &Rect<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()
}

/// Planar view of a geometry; the z ordinate and too-short positions are
/// dropped.
pub fn to_geo(geometry: &Geometry) -> geo_types::Geometry<f64> {
    match geometry {
        Geometry::Point { coordinates } => match to_coord(coordinates) {
            Some(c) => Point(c).into(),
            None => MultiPoint::<f64>(vec![]).into(),
        },
        Geometry::MultiPoint { coordinates } => {
            MultiPoint(coordinates.iter().filter_map(to_coord).map(Point).collect()).into()
        }
        Geometry::LineString { coordinates } => to_line(coordinates).into(),
        Geometry::MultiLineString { coordinates } => {
            MultiLineString(coordinates.iter().map(|line| to_line(line)).collect()).into()
        }
        Geometry::Polygon { coordinates } => to_polygon(coordinates).into(),
        Geometry::MultiPolygon { coordinates } => {
            MultiPolygon(coordinates.iter().map(|rings| to_polygon(rings)).collect()).into()
        }
        Geometry::GeometryCollection { geometries } => geo_types::Geometry::GeometryCollection(
            GeometryCollection(geometries.iter().map(to_geo).collect()),
        ),
    }
}

fn to_coord(position: &Position) -> Option<Coord<f64>> {
    match position.as_slice() {
        [x, y, ..] => Some(coord! { x: *x, y: *y }),
        _ => None,
    }
}

fn to_line(positions: &[Position]) -> LineString<f64> {
    LineString::new(positions.iter().filter_map(to_coord).collect())
}

fn to_polygon(rings: &[Vec<Position>]) -> Polygon<f64> {
    let mut rings = rings.iter().map(|ring| to_line(ring));
    let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
    Polygon::new(exterior, rings.collect())
}
