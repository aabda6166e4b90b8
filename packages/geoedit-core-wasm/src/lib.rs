use wasm_bindgen::prelude::*;
use serde_wasm_bindgen::to_value;

// Create a console module for logging
pub mod console;
// Import our geojson features module
pub mod geojson_features;
// Import our models
pub mod models;
// Import our point counting helpers
pub mod point_count;
// Import our Douglas-Peucker simplification module
pub mod simplify;
// Import our multi-part flattening module
pub mod flatten;
// Import shapefile output normalization
pub mod import;
// Import the editing session state
pub mod session;
// Import GeoJSON export preparation
pub mod export;
// Import our extent helpers
pub mod bounds;
// JSON string front end shared by the wasm exports and native tests
pub mod json_api;
// Import the JS session wrapper
mod session_js;

pub use console::{ConsoleSink, LogSink, MemorySink, NullSink};
pub use geojson_features::{Feature, FeatureCollection, FeatureId, Geometry, GeometryField};
pub use models::{SimplifyOptions, StyleOptions};
pub use session::{EditMode, FeatureSession};
pub use session_js::WasmFeatureSession;

use console::ConsoleSink as Console;
use json_api::BindingError;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("GeoEdit WASM module initialized successfully");
    });
}

fn to_js_error(err: BindingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// Split multi-part features of a FeatureCollection into single-part features
#[wasm_bindgen]
pub fn flatten_feature_collection(collection_json: &str) -> Result<String, JsValue> {
    json_api::flatten_feature_collection(collection_json, &Console).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn is_multipart_feature(feature_json: &str) -> Result<bool, JsValue> {
    json_api::is_multipart_feature(feature_json).map_err(to_js_error)
}

// Simplify features with Douglas-Peucker. `options_json` may be empty.
#[wasm_bindgen]
pub fn simplify_features(features_json: &str, options_json: &str) -> Result<String, JsValue> {
    json_api::simplify_features_json(features_json, options_json, &Console).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn simplify_geometry_json(geometry_json: &str, tolerance: f64) -> Result<String, JsValue> {
    json_api::simplify_geometry_json(geometry_json, tolerance).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn count_points(features_json: &str) -> Result<usize, JsValue> {
    json_api::count_points(features_json).map_err(to_js_error)
}

// Normalize shpjs-style decoder output (one collection or one per layer)
#[wasm_bindgen]
pub fn normalize_shapefile_output(decoded_json: &str) -> Result<String, JsValue> {
    json_api::normalize_shapefile_output(decoded_json, &Console).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn prepare_geojson_export(features_json: &str) -> Result<String, JsValue> {
    json_api::prepare_geojson_export(features_json, &Console).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn export_file_name(file_name: Option<String>, selection_only: bool) -> String {
    export::export_file_name(file_name.as_deref(), selection_only)
}

// Bounding box of the features as [minX, minY, maxX, maxY], or null
#[wasm_bindgen]
pub fn feature_extent(features_json: &str) -> Result<JsValue, JsValue> {
    let extent = json_api::feature_extent(features_json).map_err(to_js_error)?;
    extent_to_js(extent)
}

// serde_wasm_bindgen turns `None` into undefined, the viewer checks for null
pub(crate) fn extent_to_js(extent: Option<[f64; 4]>) -> Result<JsValue, JsValue> {
    match extent {
        Some(bbox) => Ok(to_value(&bbox)?),
        None => Ok(JsValue::NULL),
    }
}

// Geometry family ("point", "line", "polygon" or "other") used by the feature list
#[wasm_bindgen]
pub fn feature_kind(feature_json: &str) -> Result<JsValue, JsValue> {
    let feature: Feature = serde_json::from_str(feature_json)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse feature: {}", e)))?;
    Ok(to_value(&import::feature_kind(&feature))?)
}
