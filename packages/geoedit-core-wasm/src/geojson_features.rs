use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

// Reserved property keys synthesized by the core. Anything starting with '_'
// is internal and gets stripped on export.
pub const PARENT_ID_KEY: &str = "_parentId";
pub const PART_INDEX_KEY: &str = "_partIndex";
pub const SIMPLIFIED_KEY: &str = "_simplified";
pub const SIMPLIFIED_AT_KEY: &str = "_simplifiedAt";
pub const STYLE_KEY: &str = "_style";
pub const PREVIEW_KEY: &str = "_isPreview";
pub const INTERNAL_KEY_PREFIX: char = '_';

/// `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

/// A GeoJSON geometry. Nesting depth of `coordinates` is fixed by the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    // First ring is the exterior, the rest are holes
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

/// What sits in a feature's `geometry` slot.
///
/// Decoders occasionally emit geometry objects that do not fit [`Geometry`]
/// (coordinates that are not arrays, unknown kinds, wrong nesting). Those are
/// kept verbatim as `Raw` so every operation can hand them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryField {
    Typed(Geometry),
    Raw(Value),
}

impl GeometryField {
    /// Parse a JSON geometry object, falling back to `Raw` when it is malformed.
    pub fn from_json(value: Value) -> Self {
        match serde_json::from_value::<Geometry>(value.clone()) {
            Ok(geometry) => GeometryField::Typed(geometry),
            Err(_) => GeometryField::Raw(value),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        match self {
            GeometryField::Typed(geometry) => Some(geometry.type_name()),
            GeometryField::Raw(value) => value.get("type").and_then(Value::as_str),
        }
    }

    pub fn as_typed(&self) -> Option<&Geometry> {
        match self {
            GeometryField::Typed(geometry) => Some(geometry),
            GeometryField::Raw(_) => None,
        }
    }
}

impl From<Geometry> for GeometryField {
    fn from(geometry: Geometry) -> Self {
        GeometryField::Typed(geometry)
    }
}

/// Feature ids are caller assigned and may be strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Text(String),
    Number(Number),
}

impl FeatureId {
    pub fn to_value(&self) -> Value {
        match self {
            FeatureId::Text(text) => Value::String(text.clone()),
            FeatureId::Number(number) => Value::Number(number.clone()),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Text(text) => write!(f, "{}", text),
            FeatureId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(text: &str) -> Self {
        FeatureId::Text(text.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(text: String) -> Self {
        FeatureId::Text(text)
    }
}

impl From<u64> for FeatureId {
    fn from(number: u64) -> Self {
        FeatureId::Number(Number::from(number))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub geometry: Option<GeometryField>,
    #[serde(default, deserialize_with = "nullable_properties")]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(id: Option<FeatureId>, geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id,
            geometry: Some(GeometryField::Typed(geometry)),
            properties,
        }
    }

    /// The typed geometry, if present and well formed.
    pub fn typed_geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref().and_then(GeometryField::as_typed)
    }

    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref().and_then(GeometryField::type_name)
    }

    /// The id as a JSON value, `null` when absent.
    pub fn id_value(&self) -> Value {
        self.id.as_ref().map(FeatureId::to_value).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: CollectionTag,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }
}

// GeoJSON allows `"properties": null`
fn nullable_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
