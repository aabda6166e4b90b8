// Normalization of shapefile decoder output into the collection the editor
// works on. Decoding the .shp/.dbf binaries happens outside of this crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::console::LogSink;
use crate::geojson_features::{Feature, FeatureCollection, FeatureId};

#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("The shapefile could not be converted to a valid GeoJSON structure: {0}")]
    InvalidStructure(String),
    #[error("No valid layers found in the shapefile")]
    NoLayers,
    #[error("No valid features found in any layer of the shapefile")]
    NoFeaturesInLayers,
    #[error("The shapefile contains no features")]
    NoFeatures,
}

/// A decoder returns a single collection, or one collection per layer when
/// the archive holds several shapefiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedShapefile {
    Layers(Vec<FeatureCollection>),
    Single(FeatureCollection),
}

pub fn parse_decoded(json: &str) -> Result<DecodedShapefile, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::InvalidStructure(e.to_string()))
}

/// Pick the usable layer and make sure every feature carries an id.
pub fn normalize_decoded(
    decoded: DecodedShapefile,
    log: &dyn LogSink,
) -> Result<FeatureCollection, ImportError> {
    let layer = match decoded {
        DecodedShapefile::Layers(layers) => {
            log.log(&format!("Found multiple layers ({}) in shapefile", layers.len()));
            if layers.is_empty() {
                return Err(ImportError::NoLayers);
            }
            let (index, layer) = layers
                .into_iter()
                .enumerate()
                .find(|(_, layer)| !layer.features.is_empty())
                .ok_or(ImportError::NoFeaturesInLayers)?;
            log.log(&format!("Using layer {} with {} features", index, layer.features.len()));
            layer
        }
        DecodedShapefile::Single(layer) => {
            log.log(&format!("Processing single layer with {} features", layer.features.len()));
            if layer.features.is_empty() {
                return Err(ImportError::NoFeatures);
            }
            layer
        }
    };

    let features: Vec<Feature> = layer
        .features
        .into_iter()
        .enumerate()
        .map(|(index, mut feature)| {
            if !has_usable_id(&feature) {
                feature.id = Some(FeatureId::Text(format!("feature-{}", index)));
            }
            feature
        })
        .collect();

    log.log(&format!("Processed {} features successfully", features.len()));
    Ok(FeatureCollection::new(features))
}

// Empty strings and zero are replaced along with missing ids
fn has_usable_id(feature: &Feature) -> bool {
    match &feature.id {
        Some(FeatureId::Text(text)) => !text.is_empty(),
        Some(FeatureId::Number(number)) => number.as_f64() != Some(0.0),
        None => false,
    }
}

/// Coarse geometry family used for grouping and styling in the feature list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Point,
    Line,
    Polygon,
    Other,
}

pub fn feature_kind(feature: &Feature) -> FeatureKind {
    let Some(type_name) = feature.geometry_type() else {
        return FeatureKind::Other;
    };
    let type_name = type_name.to_lowercase();

    if type_name.contains("point") {
        FeatureKind::Point
    } else if type_name.contains("line") {
        FeatureKind::Line
    } else if type_name.contains("polygon") {
        FeatureKind::Polygon
    } else {
        FeatureKind::Other
    }
}
