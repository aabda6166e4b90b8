use serde::Serialize;
use serde_json::Value;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

use crate::bounds::collection_extent;
use crate::console::ConsoleSink;
use crate::geojson_features::{Feature, FeatureCollection};
use crate::import::parse_decoded;
use crate::json_api::{parse_features, BindingError};
use crate::models::StyleOptions;
use crate::session::FeatureSession;
use crate::extent_to_js;

fn js_error(err: impl Into<BindingError>) -> JsValue {
    JsValue::from_str(&err.into().to_string())
}

fn parse_feature(json: &str) -> Result<Feature, JsValue> {
    serde_json::from_str(json).map_err(js_error)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload {
    file_name: String,
    geojson: String,
}

/// Editing session handle for the viewer. Features cross the boundary as
/// GeoJSON strings; reports and rows come back as plain JS objects.
#[wasm_bindgen]
pub struct WasmFeatureSession {
    inner: FeatureSession,
}

#[wasm_bindgen]
impl WasmFeatureSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmFeatureSession {
        WasmFeatureSession {
            inner: FeatureSession::new(Box::new(ConsoleSink)),
        }
    }

    /// Load decoder output and return the number of canonical features.
    pub fn load(
        &mut self,
        decoded_json: &str,
        file_name: Option<String>,
    ) -> Result<usize, JsValue> {
        let decoded = parse_decoded(decoded_json).map_err(js_error)?;
        self.inner.load(decoded, file_name).map_err(js_error)
    }

    /// Canonical features as a FeatureCollection string.
    pub fn features(&self) -> Result<String, JsValue> {
        to_json(&FeatureCollection::new(self.inner.features().to_vec()))
    }

    pub fn set_features(&mut self, features_json: &str) -> Result<(), JsValue> {
        let features = parse_features(features_json).map_err(js_error)?;
        self.inner.set_features(features);
        Ok(())
    }

    pub fn selected(&self) -> Result<String, JsValue> {
        to_json(&self.inner.selected())
    }

    pub fn preview(&self) -> Result<String, JsValue> {
        to_json(&self.inner.preview())
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> Result<JsValue, JsValue> {
        Ok(to_value(&self.inner.mode())?)
    }

    #[wasm_bindgen(getter, js_name = selectedCount)]
    pub fn selected_count(&self) -> usize {
        self.inner.selected().len()
    }

    pub fn select(&mut self, feature_json: &str) -> Result<(), JsValue> {
        self.inner.select(parse_feature(feature_json)?);
        Ok(())
    }

    pub fn deselect(&mut self, feature_json: &str) -> Result<(), JsValue> {
        self.inner.deselect(&parse_feature(feature_json)?);
        Ok(())
    }

    pub fn toggle(&mut self, feature_json: &str) -> Result<(), JsValue> {
        self.inner.toggle(parse_feature(feature_json)?);
        Ok(())
    }

    pub fn is_selected(&self, feature_json: &str) -> Result<bool, JsValue> {
        Ok(self.inner.is_selected(&parse_feature(feature_json)?))
    }

    pub fn clear_selection(&mut self) {
        self.inner.clear_selection();
    }

    pub fn select_all(&mut self) {
        self.inner.select_all();
    }

    pub fn delete_selected(&mut self) -> usize {
        self.inner.delete_selected()
    }

    /// `value_json` is any JSON value; a bare string that is not valid JSON
    /// is stored as text.
    pub fn set_property(&mut self, name: &str, value_json: &str) -> Result<usize, JsValue> {
        let value = serde_json::from_str(value_json)
            .unwrap_or_else(|_| Value::String(value_json.to_string()));
        self.inner.set_property(name, value).map_err(js_error)
    }

    pub fn delete_property(&mut self, name: &str) -> usize {
        self.inner.delete_property(name)
    }

    pub fn property_rows(&self) -> Result<JsValue, JsValue> {
        Ok(to_value(&self.inner.property_rows())?)
    }

    pub fn apply_style(&mut self, style_json: &str) -> Result<usize, JsValue> {
        let style: StyleOptions = serde_json::from_str(style_json).map_err(js_error)?;
        Ok(self.inner.apply_style(&style))
    }

    pub fn enter_simplify_mode(&mut self) {
        self.inner.enter_simplify_mode();
    }

    pub fn exit_simplify_mode(&mut self) {
        self.inner.exit_simplify_mode();
    }

    pub fn preview_simplification(&mut self, tolerance: f64) -> Result<String, JsValue> {
        to_json(&self.inner.preview_simplification(tolerance))
    }

    pub fn simplification_stats(&self, tolerance: f64) -> Result<JsValue, JsValue> {
        Ok(to_value(&self.inner.simplification_stats(tolerance))?)
    }

    pub fn apply_simplification(&mut self, tolerance: f64) -> Result<JsValue, JsValue> {
        let report = self.inner.apply_simplification(tolerance);
        Ok(to_value(&report)?)
    }

    /// Returns `{ fileName, geojson }` ready for a download link.
    pub fn export(&self) -> Result<JsValue, JsValue> {
        let (file_name, collection) = self.inner.export().map_err(js_error)?;
        let geojson = serde_json::to_string_pretty(&collection).map_err(js_error)?;
        Ok(to_value(&ExportPayload { file_name, geojson })?)
    }

    /// Bounding box of the canonical features, or `null` when empty.
    pub fn extent(&self) -> Result<JsValue, JsValue> {
        let extent = collection_extent(self.inner.features()).map(|extent| extent.to_bbox());
        extent_to_js(extent)
    }
}

impl Default for WasmFeatureSession {
    fn default() -> Self {
        Self::new()
    }
}
