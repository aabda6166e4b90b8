//! Editing session: the non-visual state behind the viewer's panels.
//!
//! A session owns the canonical (flattened) features, the collection as it
//! was imported, the current selection, preview features and the edit mode.
//! Every operation builds fresh vectors instead of editing features in place,
//! so features handed out earlier stay valid snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::console::{LogSink, NullSink};
use crate::export::{export_file_name, prepare_export, ExportError};
use crate::flatten::flatten_collection;
use crate::geojson_features::{Feature, FeatureCollection, FeatureId, PREVIEW_KEY, STYLE_KEY};
use crate::import::{normalize_decoded, DecodedShapefile, ImportError};
use crate::models::{PropertyRow, SimplificationStats, SimplifyReport, StyleOptions};
use crate::point_count::{count_feature_points, count_total_points, point_reduction_percent};
use crate::simplify::{is_simplifiable, now_millis, simplify_feature_at};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Property name cannot be empty")]
    EmptyPropertyName,
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditMode {
    #[default]
    Normal,
    Simplifying,
}

pub struct FeatureSession {
    features: Vec<Feature>,
    original: Option<FeatureCollection>,
    selected: Vec<Feature>,
    preview: Vec<Feature>,
    mode: EditMode,
    file_name: Option<String>,
    log: Box<dyn LogSink>,
}

impl Default for FeatureSession {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl FeatureSession {
    pub fn new(log: Box<dyn LogSink>) -> Self {
        Self {
            features: Vec::new(),
            original: None,
            selected: Vec::new(),
            preview: Vec::new(),
            mode: EditMode::Normal,
            file_name: None,
            log,
        }
    }

    /// Replace the session contents with freshly decoded shapefile data.
    ///
    /// The normalized collection is kept as the original data; the canonical
    /// features are its flattened form.
    pub fn load(
        &mut self,
        decoded: DecodedShapefile,
        file_name: Option<String>,
    ) -> Result<usize, SessionError> {
        let normalized = normalize_decoded(decoded, self.log.as_ref())?;
        let flattened = flatten_collection(&normalized, self.log.as_ref());
        self.log.log(&format!(
            "Flattened collection: original features: {}, flattened features: {}",
            normalized.features.len(),
            flattened.features.len()
        ));

        self.features = flattened.features;
        self.original = Some(normalized);
        self.selected.clear();
        self.preview.clear();
        self.mode = EditMode::Normal;
        self.file_name = file_name;
        Ok(self.features.len())
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn set_features(&mut self, features: Vec<Feature>) {
        self.features = features;
    }

    pub fn original(&self) -> Option<&FeatureCollection> {
        self.original.as_ref()
    }

    pub fn selected(&self) -> &[Feature] {
        &self.selected
    }

    pub fn preview(&self) -> &[Feature] {
        &self.preview
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    // --- selection ---------------------------------------------------------

    /// A feature counts as selected when a selected entry has the same id or
    /// the same geometry.
    pub fn is_selected(&self, feature: &Feature) -> bool {
        self.selected
            .iter()
            .any(|selected| selected.id == feature.id || selected.geometry == feature.geometry)
    }

    pub fn select(&mut self, feature: Feature) {
        if !self.is_selected(&feature) {
            self.selected = self.selected.iter().cloned().chain(Some(feature)).collect();
        }
    }

    /// Drop the selected entries matching both id and geometry.
    pub fn deselect(&mut self, feature: &Feature) {
        self.selected = self
            .selected
            .iter()
            .filter(|selected| selected.id != feature.id || selected.geometry != feature.geometry)
            .cloned()
            .collect();
    }

    pub fn toggle(&mut self, feature: Feature) {
        if self.is_selected(&feature) {
            self.deselect(&feature);
        } else {
            self.select(feature);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = Vec::new();
    }

    pub fn select_all(&mut self) {
        self.selected = self.features.clone();
    }

    pub fn set_selected(&mut self, features: Vec<Feature>) {
        self.selected = features;
    }

    fn selected_ids(&self) -> Vec<Option<FeatureId>> {
        self.selected.iter().map(|feature| feature.id.clone()).collect()
    }

    // --- bulk edits --------------------------------------------------------

    /// Remove every canonical feature whose id is selected.
    pub fn delete_selected(&mut self) -> usize {
        if self.selected.is_empty() {
            return 0;
        }
        let ids = self.selected_ids();
        let before = self.features.len();
        self.features = self
            .features
            .iter()
            .filter(|feature| !ids.contains(&feature.id))
            .cloned()
            .collect();
        self.clear_selection();
        before - self.features.len()
    }

    pub fn set_property(&mut self, name: &str, value: Value) -> Result<usize, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyPropertyName);
        }
        Ok(self.update_selected(|feature| {
            feature.properties.insert(name.to_string(), value.clone());
        }))
    }

    pub fn delete_property(&mut self, name: &str) -> usize {
        self.update_selected(|feature| {
            feature.properties.remove(name);
        })
    }

    pub fn apply_style(&mut self, style: &StyleOptions) -> usize {
        let style = serde_json::to_value(style).unwrap_or(Value::Null);
        self.update_selected(|feature| {
            feature.properties.insert(STYLE_KEY.to_string(), style.clone());
        })
    }

    // Applies `edit` to copies of the selected canonical features and points
    // the selection at the updated copies.
    fn update_selected<F>(&mut self, edit: F) -> usize
    where
        F: Fn(&mut Feature),
    {
        let ids = self.selected_ids();
        let mut updated = 0;

        self.features = self
            .features
            .iter()
            .map(|feature| {
                if !ids.contains(&feature.id) {
                    return feature.clone();
                }
                let mut copy = feature.clone();
                edit(&mut copy);
                updated += 1;
                copy
            })
            .collect();

        self.selected = self
            .selected
            .iter()
            .map(|selected| {
                self.features
                    .iter()
                    .find(|feature| feature.id == selected.id)
                    .cloned()
                    .unwrap_or_else(|| selected.clone())
            })
            .collect();

        updated
    }

    /// One row per property name found in the selection, sorted by name.
    pub fn property_rows(&self) -> Vec<PropertyRow> {
        let mut names: Vec<&String> = Vec::new();
        for feature in &self.selected {
            for key in feature.properties.keys() {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }

        let mut rows: Vec<PropertyRow> = names
            .into_iter()
            .map(|name| {
                let mut values = self
                    .selected
                    .iter()
                    .map(|feature| feature.properties.get(name).cloned().unwrap_or(Value::Null));
                let first = values.next().unwrap_or(Value::Null);
                let mixed = values.any(|value| value != first);
                PropertyRow {
                    name: name.clone(),
                    value: if mixed { Value::Null } else { first },
                    mixed,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }

    // --- simplification ----------------------------------------------------

    pub fn enter_simplify_mode(&mut self) {
        self.mode = EditMode::Simplifying;
    }

    pub fn exit_simplify_mode(&mut self) {
        self.mode = EditMode::Normal;
        self.preview = Vec::new();
    }

    /// Rebuild the preview for the current selection. Only runs in
    /// simplify mode.
    pub fn preview_simplification(&mut self, tolerance: f64) -> &[Feature] {
        if self.mode != EditMode::Simplifying || self.selected.is_empty() {
            return &self.preview;
        }

        let simplified_at = now_millis();
        self.preview = self
            .selected
            .iter()
            .filter(|feature| is_simplifiable(feature))
            .map(|feature| {
                let mut preview = simplify_feature_at(feature, tolerance, simplified_at);
                preview.properties.insert(PREVIEW_KEY.to_string(), Value::Bool(true));
                preview
            })
            .collect();

        self.log.log(&format!(
            "Preview updated: {} Original points: {} Preview points: {}",
            self.preview.len(),
            self.simplifiable_point_count(),
            count_total_points(&self.preview)
        ));
        &self.preview
    }

    /// Point counts for the simplifiable part of the selection before and
    /// after simplifying at `tolerance`. Session state is left alone.
    pub fn simplification_stats(&self, tolerance: f64) -> SimplificationStats {
        let simplified: Vec<Feature> = self
            .selected
            .iter()
            .filter(|feature| is_simplifiable(feature))
            .map(|feature| simplify_feature_at(feature, tolerance, 0))
            .collect();
        let original_points = self.simplifiable_point_count();
        let preview_points = count_total_points(&simplified);
        SimplificationStats {
            original_points,
            preview_points,
            reduction_percent: point_reduction_percent(original_points, preview_points),
        }
    }

    fn simplifiable_point_count(&self) -> usize {
        let simplifiable: Vec<Feature> = self
            .selected
            .iter()
            .filter(|feature| is_simplifiable(feature))
            .cloned()
            .collect();
        count_total_points(&simplifiable)
    }

    /// Commit simplification of the selected lines and polygons.
    ///
    /// Simplified features replace their canonical counterpart (matched by
    /// id) and take their place in the selection. Other selected features
    /// stay selected and unchanged. Leaves simplify mode.
    pub fn apply_simplification(&mut self, tolerance: f64) -> SimplifyReport {
        let mut report = SimplifyReport::default();
        if self.selected.is_empty() {
            return report;
        }

        let simplified_at = now_millis();
        let mut features = self.features.clone();
        let mut selection = Vec::with_capacity(self.selected.len());

        for feature in &self.selected {
            let position = features.iter().position(|candidate| candidate.id == feature.id);
            match position {
                Some(index) if is_simplifiable(feature) => {
                    let simplified = simplify_feature_at(feature, tolerance, simplified_at);
                    report.original_points += count_feature_points(feature);
                    report.simplified_points += count_feature_points(&simplified);
                    features[index] = simplified.clone();
                    selection.push(simplified);
                    report.simplified += 1;
                }
                _ => {
                    selection.push(feature.clone());
                    report.unchanged += 1;
                }
            }
        }

        self.features = features;
        self.selected = selection;
        self.exit_simplify_mode();

        self.log.log(&format!(
            "Simplified {} features, {} features were unchanged.",
            report.simplified, report.unchanged
        ));
        report
    }

    // --- export ------------------------------------------------------------

    /// Features an export would contain: the selection when there is one,
    /// otherwise the imported original data, otherwise the canonical features.
    pub fn export_source(&self) -> &[Feature] {
        if !self.selected.is_empty() {
            return &self.selected;
        }
        match &self.original {
            Some(original) if !original.features.is_empty() => &original.features,
            _ => &self.features,
        }
    }

    pub fn export(&self) -> Result<(String, FeatureCollection), SessionError> {
        let collection = prepare_export(self.export_source(), self.log.as_ref())?;
        let file_name = export_file_name(self.file_name(), !self.selected.is_empty());
        Ok((file_name, collection))
    }
}
