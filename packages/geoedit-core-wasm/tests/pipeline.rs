// End to end: decoder output through import, flattening, editing,
// simplification and export, driven only through the public API.

use geoedit_core_wasm::import::parse_decoded;
use geoedit_core_wasm::json_api;
use geoedit_core_wasm::point_count::count_total_points;
use geoedit_core_wasm::{EditMode, FeatureId, FeatureSession, NullSink};
use serde_json::{json, Value};

fn shapefile_layers() -> String {
    json!([
        { "type": "FeatureCollection", "features": [] },
        {
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiLineString",
                        "coordinates": [
                            [[0, 0], [1, 0.01], [2, 0], [3, 5], [4, 0]],
                            [[10, 10], [11, 10.02], [12, 10]]
                        ]
                    },
                    "properties": { "name": "Road A", "lanes": 2 }
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [
                            [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                            [[2, 2], [3, 2], [3, 3], [2, 2]]
                        ]
                    },
                    "properties": { "name": "Park" }
                }
            ]
        }
    ])
    .to_string()
}

#[test]
fn import_edit_simplify_export() {
    let mut session = FeatureSession::default();
    let loaded = session
        .load(parse_decoded(&shapefile_layers()).unwrap(), Some("roads.zip".to_string()))
        .unwrap();

    // Two road parts plus the holed polygon, which is kept whole
    assert_eq!(loaded, 3);
    let ids: Vec<Option<FeatureId>> = session.features().iter().map(|f| f.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            Some("feature-0-part-1".into()),
            Some("feature-0-part-2".into()),
            Some("feature-1".into())
        ]
    );

    let road = session.features()[0].clone();
    session.select(road);
    session.set_property("surface", json!("asphalt")).unwrap();

    session.enter_simplify_mode();
    assert_eq!(session.mode(), EditMode::Simplifying);
    let report = session.apply_simplification(0.1);
    assert_eq!(report.simplified, 1);
    assert_eq!(report.original_points, 5);
    assert_eq!(report.simplified_points, 4);
    assert_eq!(session.mode(), EditMode::Normal);

    let simplified = &session.features()[0];
    assert_eq!(simplified.properties["surface"], json!("asphalt"));
    assert_eq!(simplified.properties["_parentId"], json!("feature-0"));
    assert_eq!(count_total_points(session.features()), 4 + 3 + 9);

    let (file_name, collection) = session.export().unwrap();
    assert_eq!(file_name, "roads_selection.geojson");
    assert_eq!(collection.features.len(), 1);
    let notes = collection.features[0].properties["Notes"].as_str().unwrap();
    assert_eq!(notes, "name: Road A\nlanes: 2\nsurface: asphalt");

    session.clear_selection();
    let (file_name, collection) = session.export().unwrap();
    assert_eq!(file_name, "roads.geojson");
    // Whole-file export uses the imported, unflattened data
    assert_eq!(collection.features.len(), 2);
}

#[test]
fn json_front_end_matches_session_flattening() {
    let normalized = json_api::normalize_shapefile_output(&shapefile_layers(), &NullSink).unwrap();
    let flattened = json_api::flatten_feature_collection(&normalized, &NullSink).unwrap();
    let flattened: Value = serde_json::from_str(&flattened).unwrap();

    let mut session = FeatureSession::default();
    session.load(parse_decoded(&shapefile_layers()).unwrap(), None).unwrap();

    let expected = json!({
        "type": "FeatureCollection",
        "features": serde_json::to_value(session.features()).unwrap()
    });
    assert_eq!(flattened, expected);
    assert_eq!(json_api::count_points(&normalized).unwrap(), 8 + 9);
}
