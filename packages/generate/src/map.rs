//! `GeoJSON` layers for the bubble map and the damage footprints.

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use tornado_track_analysis::ComputationError;
use tornado_track_analysis::projection::LambertConformalConic;
use tornado_track_analysis_models::CaseStudyReport;
use tornado_track_tornado_models::TornadoEvent;

/// Bubble radius per square-root casualty, in map units chosen by the
/// renderer.
pub const BUBBLE_RADIUS_SCALE: f64 = 1.0;

/// Bubble radius for a casualty count. Area grows linearly with
/// casualties.
#[must_use]
pub fn bubble_radius(casualties: u32) -> f64 {
    f64::from(casualties).sqrt() * BUBBLE_RADIUS_SCALE
}

fn feature(geometry: geo::Geometry<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// One bubble per event in `state` with casualties, placed at the track's
/// start, plus a `caseStudy` marker feature for the labelled event.
#[must_use]
pub fn bubble_map(
    events: &[TornadoEvent],
    state: &str,
    case: &CaseStudyReport,
) -> FeatureCollection {
    let mut features = Vec::new();
    let mut marker = None;

    for event in events
        .iter()
        .filter(|e| e.state.eq_ignore_ascii_case(state) && e.casualties > 0)
    {
        let Some((lon, lat)) = event.start_lon_lat() else {
            continue;
        };
        let point = geo::Geometry::Point(geo::Point::new(lon, lat));

        let mut properties = JsonObject::new();
        properties.insert("event".to_string(), JsonValue::from(event.key.to_string()));
        properties.insert("casualties".to_string(), JsonValue::from(event.casualties));
        properties.insert(
            "radius".to_string(),
            JsonValue::from(bubble_radius(event.casualties)),
        );
        properties.insert("caseStudy".to_string(), JsonValue::from(false));
        features.push(feature(point.clone(), properties));

        if event.key == case.key {
            let mut properties = JsonObject::new();
            properties.insert("event".to_string(), JsonValue::from(event.key.to_string()));
            properties.insert("label".to_string(), JsonValue::from(case.label.clone()));
            properties.insert("caseStudy".to_string(), JsonValue::from(true));
            marker = Some(feature(point, properties));
        }
    }

    if let Some(marker) = marker {
        features.push(marker);
    } else {
        log::warn!(
            "Case study {} has no casualties in {state}; bubble map has no marker",
            case.label
        );
    }

    collection(features)
}

/// Footprints of every event in `state`, un-projected back to lon/lat.
/// Events without a footprint are skipped.
///
/// # Errors
///
/// Returns [`ComputationError::InvalidProjection`] if a footprint cannot
/// be un-projected.
pub fn footprint_collection(
    events: &[TornadoEvent],
    projection: &LambertConformalConic,
    state: &str,
) -> Result<FeatureCollection, ComputationError> {
    let mut features = Vec::new();
    for event in events.iter().filter(|e| e.state.eq_ignore_ascii_case(state)) {
        let Some(footprint) = event.footprint.as_ref() else {
            continue;
        };
        if footprint.polygon.0.is_empty() {
            continue;
        }
        let polygon = geo::Geometry::MultiPolygon(footprint.polygon.clone());
        let geometry = projection.unproject_geometry(&polygon)?;

        let mut properties = JsonObject::new();
        properties.insert("event".to_string(), JsonValue::from(event.key.to_string()));
        properties.insert(
            "magnitude".to_string(),
            JsonValue::from(event.magnitude.to_string()),
        );
        properties.insert("widthM".to_string(), JsonValue::from(event.width_m));
        properties.insert("areaM2".to_string(), JsonValue::from(event.area_m2));
        properties.insert(
            "energyDissipation".to_string(),
            JsonValue::from(event.energy_dissipation),
        );
        features.push(feature(geometry, properties));
    }

    Ok(collection(features))
}
