// This is the models module containing shared data structures
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Initial value of the editor's tolerance slider
pub const DEFAULT_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimplifyOptions {
    pub tolerance: f64,
    // Preview results are flagged with `_isPreview`
    pub preview: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            preview: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillPattern {
    Solid,
    Hatch,
    Dots,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleOptions {
    pub color: String,
    pub line_width: f64,
    pub opacity: f64,
    pub fill_pattern: Option<FillPattern>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            color: "#3388ff".to_string(),
            line_width: 2.0,
            opacity: 80.0,
            fill_pattern: Some(FillPattern::Solid),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyReport {
    pub simplified: usize,
    pub unchanged: usize,
    pub original_points: usize,
    pub simplified_points: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplificationStats {
    pub original_points: usize,
    pub preview_points: usize,
    pub reduction_percent: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub name: String,
    // Null when the selected features disagree
    pub value: Value,
    pub mixed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// GeoJSON bbox order: `[minX, minY, maxX, maxY]`.
    pub fn to_bbox(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simplify_options_fill_missing_fields() {
        let options: SimplifyOptions = serde_json::from_value(json!({ "preview": true })).unwrap();
        assert_eq!(options.tolerance, DEFAULT_TOLERANCE);
        assert!(options.preview);
    }

    #[test]
    fn style_options_use_camel_case() {
        let style = StyleOptions::default();
        assert_eq!(
            serde_json::to_value(&style).unwrap(),
            json!({ "color": "#3388ff", "lineWidth": 2.0, "opacity": 80.0, "fillPattern": "solid" })
        );
    }
}
