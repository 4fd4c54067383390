//! `GeoJSON` reader for datasets exported from the SPC shapefiles.

use std::path::Path;

use geojson::GeoJson;
use tornado_track_tornado_models::RawTornadoRecord;

use crate::AcquisitionError;
use crate::attributes::parse_record;
use crate::progress::ProgressCallback;

/// Reads a `FeatureCollection` in feature order.
///
/// Features with a null geometry keep their attributes and get no geometry.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if the file cannot be read or parsed, is not
/// a `FeatureCollection`, or a feature lacks a required attribute.
pub fn read_records(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<Vec<RawTornadoRecord>, AcquisitionError> {
    let geojson_error = |message: String| AcquisitionError::GeoJson {
        path: path.display().to_string(),
        message,
    };

    let text = std::fs::read_to_string(path).map_err(|e| AcquisitionError::io(path, e))?;
    let parsed: GeoJson = text.parse().map_err(|e: geojson::Error| geojson_error(e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = parsed else {
        return Err(geojson_error("expected a FeatureCollection".to_string()));
    };

    progress.set_total(collection.features.len() as u64);

    let empty = serde_json::Map::new();
    let mut records = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature
            .geometry
            .map(geo::Geometry::<f64>::try_from)
            .transpose()
            .map_err(|e| geojson_error(format!("feature {index}: {e}")))?;
        let attrs = feature.properties.as_ref().unwrap_or(&empty);

        records.push(parse_record(attrs, geometry, path, index)?);
        progress.inc(1);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use geo::Geometry;

    use super::*;
    use crate::progress::NullProgress;
    use crate::scratch::ScratchDir;

    const TRACKS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"om": 73, "yr": 1974, "mo": 4, "dy": 3, "date": "1974-04-03",
                    "time": "16:30:00", "st": "OH", "mag": 5, "inj": 1150, "fat": 34,
                    "len": 31.3, "wid": 533},
                "geometry": {"type": "LineString", "coordinates": [[-84.05, 39.63], [-83.6, 39.8]]}
            },
            {
                "type": "Feature",
                "properties": {"om": 74, "yr": 1974, "mo": 4, "dy": 3, "date": "1974-04-03",
                    "time": "17:05:00", "st": "OH", "mag": 2, "inj": 0, "fat": 0,
                    "len": 1.0, "wid": 50},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn reads_features_in_order() {
        let scratch = ScratchDir::create().unwrap();
        let path = scratch.path().join("tracks.geojson");
        std::fs::write(&path, TRACKS).unwrap();

        let records = read_records(&path, &NullProgress).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].om, 73);
        assert!(matches!(records[0].geometry, Some(Geometry::LineString(_))));
        assert_eq!(records[1].om, 74);
        assert_eq!(records[1].geometry, None);
    }

    #[test]
    fn rejects_bare_geometry() {
        let scratch = ScratchDir::create().unwrap();
        let path = scratch.path().join("point.geojson");
        std::fs::write(&path, r#"{"type": "Point", "coordinates": [-84.0, 39.6]}"#).unwrap();

        let err = read_records(&path, &NullProgress).unwrap_err();
        assert!(matches!(err, AcquisitionError::GeoJson { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err =
            read_records(Path::new("/nonexistent/tracks.geojson"), &NullProgress).unwrap_err();
        assert!(matches!(err, AcquisitionError::Io { .. }));
    }
}
