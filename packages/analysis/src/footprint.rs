//! Damage-path footprints: each track projected to metres and buffered by
//! half its width with round caps and joins.

use geo::{Buffer, Geometry, MultiPolygon};
use tornado_track_tornado_models::{Footprint, TornadoEvent};

use crate::ComputationError;
use crate::projection::LambertConformalConic;

/// Projects a lon/lat track and buffers it by `width_m / 2`.
///
/// # Errors
///
/// Returns [`ComputationError::InvalidProjection`] if the track cannot be
/// projected.
pub fn footprint(
    geometry: &Geometry<f64>,
    width_m: f64,
    projection: &LambertConformalConic,
) -> Result<Footprint, ComputationError> {
    let track = projection.project_geometry(geometry)?;
    let polygon: MultiPolygon<f64> = track.buffer(width_m / 2.0);
    Ok(Footprint { track, polygon })
}

/// Attaches a footprint to every event.
///
/// # Errors
///
/// Returns [`ComputationError::InvalidProjection`] if any track cannot be
/// projected.
pub fn build_footprints(
    events: &mut [TornadoEvent],
    projection: &LambertConformalConic,
) -> Result<(), ComputationError> {
    log::info!("Buffering {} tracks", events.len());

    let mut empty = 0usize;
    for event in events.iter_mut() {
        let built = footprint(&event.geometry, event.width_m, projection)?;
        if built.polygon.0.is_empty() {
            log::debug!("Footprint for {} is empty", event.key);
            empty += 1;
        }
        event.footprint = Some(built);
    }

    if empty > 0 {
        log::warn!("{empty} tracks produced an empty footprint");
    }
    Ok(())
}
