// JSON string front end for the geometry operations. The wasm exports in
// lib.rs are thin wrappers around these so the same paths run in native tests.

use serde::Deserialize;
use thiserror::Error;

use crate::bounds::collection_extent;
use crate::console::LogSink;
use crate::export::{prepare_export, ExportError};
use crate::flatten::{flatten_collection, is_multipart};
use crate::geojson_features::{Feature, FeatureCollection, GeometryField};
use crate::import::{normalize_decoded, parse_decoded, ImportError};
use crate::models::SimplifyOptions;
use crate::point_count::count_total_points;
use crate::session::SessionError;
use crate::simplify::{simplify_features, simplify_geometry};

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Failed to parse JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Feature lists arrive either as a bare array, wrapped in a collection, or
/// as one feature on its own.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeatureInput {
    Collection(FeatureCollection),
    Features(Vec<Feature>),
    Single(Feature),
}

impl FeatureInput {
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            FeatureInput::Collection(collection) => collection.features,
            FeatureInput::Features(features) => features,
            FeatureInput::Single(feature) => vec![feature],
        }
    }
}

pub fn parse_features(json: &str) -> Result<Vec<Feature>, BindingError> {
    let input: FeatureInput = serde_json::from_str(json)?;
    Ok(input.into_features())
}

pub fn flatten_feature_collection(json: &str, log: &dyn LogSink) -> Result<String, BindingError> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    let flattened = flatten_collection(&collection, log);
    Ok(serde_json::to_string(&flattened)?)
}

pub fn is_multipart_feature(json: &str) -> Result<bool, BindingError> {
    let feature: Feature = serde_json::from_str(json)?;
    Ok(is_multipart(&feature))
}

/// Simplify every feature in `features_json`. Blank options fall back to the
/// defaults.
pub fn simplify_features_json(
    features_json: &str,
    options_json: &str,
    log: &dyn LogSink,
) -> Result<String, BindingError> {
    let features = parse_features(features_json)?;
    let options = if options_json.trim().is_empty() {
        SimplifyOptions::default()
    } else {
        serde_json::from_str(options_json)?
    };

    let simplified = simplify_features(&features, &options, log);
    Ok(serde_json::to_string(&simplified)?)
}

/// Simplify a bare geometry object. Geometry that does not parse as one of
/// the known kinds is echoed back unchanged.
pub fn simplify_geometry_json(geometry_json: &str, tolerance: f64) -> Result<String, BindingError> {
    let value: serde_json::Value = serde_json::from_str(geometry_json)?;
    match GeometryField::from_json(value) {
        GeometryField::Typed(geometry) => {
            let simplified = simplify_geometry(&geometry, tolerance);
            Ok(serde_json::to_string(&simplified)?)
        }
        GeometryField::Raw(raw) => Ok(serde_json::to_string(&raw)?),
    }
}

pub fn count_points(json: &str) -> Result<usize, BindingError> {
    Ok(count_total_points(&parse_features(json)?))
}

/// Normalize shapefile decoder output. The result is not flattened.
pub fn normalize_shapefile_output(json: &str, log: &dyn LogSink) -> Result<String, BindingError> {
    let decoded = parse_decoded(json)?;
    let collection = normalize_decoded(decoded, log)?;
    Ok(serde_json::to_string(&collection)?)
}

pub fn prepare_geojson_export(json: &str, log: &dyn LogSink) -> Result<String, BindingError> {
    let features = parse_features(json)?;
    let collection = prepare_export(&features, log)?;
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// `[minX, minY, maxX, maxY]`, or `None` when nothing can be fitted.
pub fn feature_extent(json: &str) -> Result<Option<[f64; 4]>, BindingError> {
    let features = parse_features(json)?;
    Ok(collection_extent(&features).map(|extent| extent.to_bbox()))
}
