//! Record-wide totals.

use geo::Geometry;
use tornado_track_analysis_models::{MagnitudeSummary, RecordSummary};
use tornado_track_tornado_models::{Magnitude, TornadoEvent};

/// Per-rating counts, casualties and energy dissipation, EF0 first.
#[must_use]
pub fn summarize_by_magnitude(events: &[TornadoEvent]) -> Vec<MagnitudeSummary> {
    Magnitude::all()
        .iter()
        .map(|magnitude| {
            let mut summary = MagnitudeSummary {
                magnitude: *magnitude,
                count: 0,
                imputed: 0,
                casualties: 0,
                total_energy_dissipation: 0.0,
                mean_energy_dissipation: 0.0,
            };
            for event in events.iter().filter(|e| e.magnitude == *magnitude) {
                summary.count += 1;
                summary.imputed += u64::from(event.magnitude_imputed);
                summary.casualties += u64::from(event.casualties);
                summary.total_energy_dissipation += event.energy_dissipation;
            }
            if summary.count > 0 {
                #[allow(clippy::cast_precision_loss)]
                let count = summary.count as f64;
                summary.mean_energy_dissipation = summary.total_energy_dissipation / count;
            }
            summary
        })
        .collect()
}

/// Overview of the whole record.
#[must_use]
pub fn summarize_record(events: &[TornadoEvent]) -> RecordSummary {
    let by_magnitude = summarize_by_magnitude(events);

    RecordSummary {
        events: events.len() as u64,
        first_year: events.iter().map(|e| e.key.year).min(),
        last_year: events.iter().map(|e| e.key.year).max(),
        imputed_magnitudes: by_magnitude.iter().map(|s| s.imputed).sum(),
        point_geometries: events
            .iter()
            .filter(|e| matches!(e.geometry, Geometry::Point(_)))
            .count() as u64,
        by_magnitude,
    }
}
