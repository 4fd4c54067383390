#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cleaning, derived metrics and case-study comparison for the tornado
//! record.
//!
//! The stages run in a fixed order over one in-memory batch:
//!
//! 1. [`reconcile`] fills missing track geometries with initial points.
//! 2. [`impute`] resolves unrated magnitudes.
//! 3. [`derive`] converts units, imputes zero lengths/widths, normalizes
//!    widths across the 1995 convention change and computes area,
//!    casualties and [`energy`] dissipation.
//! 4. [`footprint`] projects tracks with [`projection`] and buffers them.
//! 5. [`compare`] isolates the case study and ranks it; [`summary`]
//!    totals the record.

pub mod compare;
pub mod derive;
pub mod energy;
pub mod footprint;
pub mod impute;
pub mod projection;
pub mod reconcile;
pub mod summary;

use thiserror::Error;
use tornado_track_analysis_models::{AnalysisReport, CaseStudyFilter, Metric};
use tornado_track_tornado_models::{EventKey, RawTornadoRecord, TornadoEvent};

use crate::energy::EnergyModel;
use crate::reconcile::JoinStrategy;

/// The input data violates a precondition of the pipeline.
#[derive(Debug, Error)]
pub enum DataIntegrityError {
    /// The path and point datasets cannot be paired positionally.
    #[error("Path dataset has {paths} records but point dataset has {points}")]
    LengthMismatch {
        /// Records in the path dataset.
        paths: usize,
        /// Records in the point dataset.
        points: usize,
    },

    /// Positional pairing lines up two different tornadoes.
    #[error(
        "Record {index} is {path_key} in the path dataset but {point_key} in the point dataset"
    )]
    KeyMismatch {
        /// Position of the mismatched pair.
        index: usize,
        /// Key on the path side.
        path_key: EventKey,
        /// Key on the point side.
        point_key: EventKey,
    },

    /// A key-based join found the same tornado twice.
    #[error("Duplicate event {key} in the {dataset} dataset")]
    DuplicateKey {
        /// The repeated key.
        key: EventKey,
        /// Which dataset contained the duplicate.
        dataset: &'static str,
    },

    /// Neither the path nor the point dataset has a geometry for an event.
    #[error("Event {key} has no usable geometry")]
    MissingGeometry {
        /// The event without geometry.
        key: EventKey,
    },

    /// A rating outside 0-5 that is not the unrated marker.
    #[error("Event {key} has magnitude {rating}; expected 0-5 or -9")]
    MagnitudeOutOfRange {
        /// The offending event.
        key: EventKey,
        /// The raw rating.
        rating: i32,
    },

    /// A negative or non-finite length or width.
    #[error("Event {key} has invalid {field}: {value}")]
    InvalidMeasurement {
        /// The offending event.
        key: EventKey,
        /// Which measurement.
        field: &'static str,
        /// The raw value.
        value: f64,
    },

    /// Date/time fields that do not form a valid local timestamp.
    #[error("Event {key} has invalid timestamp: {value}")]
    InvalidTimestamp {
        /// The offending event.
        key: EventKey,
        /// The assembled date/time text.
        value: String,
    },

    /// The case-study filter selected nothing.
    #[error("No event matches case study {label}")]
    CaseStudyNotFound {
        /// Label of the filter.
        label: String,
    },

    /// The case-study filter selected more than one event.
    #[error("{count} events match case study {label}; expected exactly one")]
    CaseStudyAmbiguous {
        /// Label of the filter.
        label: String,
        /// Number of matches.
        count: usize,
    },
}

/// A derived quantity is undefined for the given data.
#[derive(Debug, Error)]
pub enum ComputationError {
    /// Zero-value imputation needs at least one positive value.
    #[error("No positive {field} in the dataset to impute zeros with")]
    NoPositiveValue {
        /// Which field.
        field: &'static str,
    },

    /// A percentage over an empty population.
    #[error("Cannot rank against an empty population")]
    EmptyPopulation,

    /// A metric came out NaN or infinite.
    #[error("Event {key} has a non-finite {metric}")]
    NonFiniteMetric {
        /// The offending event.
        key: EventKey,
        /// Which metric.
        metric: Metric,
    },

    /// A count metric does not fit its integer type.
    #[error("Event {key} overflows {metric}")]
    MetricOverflow {
        /// The offending event.
        key: EventKey,
        /// Which metric.
        metric: Metric,
    },

    /// Projection parameters that do not define a cone.
    #[error("Invalid projection parameters: {message}")]
    InvalidProjection {
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input data violates a pipeline precondition.
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// A derived quantity is undefined.
    #[error("Computation error: {0}")]
    Computation(#[from] ComputationError),
}

/// Runs reconciliation, imputation and derivation over the two raw
/// datasets, producing enriched events without footprints.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the datasets cannot be paired, a record
/// fails validation, or a derived field is undefined.
pub fn prepare_events(
    paths: Vec<RawTornadoRecord>,
    points: Vec<RawTornadoRecord>,
    strategy: JoinStrategy,
    model: &EnergyModel,
) -> Result<Vec<TornadoEvent>, AnalysisError> {
    log::info!(
        "Reconciling {} path records with {} point records ({strategy:?})",
        paths.len(),
        points.len()
    );
    let records = reconcile::reconcile_geometries(paths, points, strategy)?;

    let rated = impute::impute_magnitudes(records)?;
    let imputed = rated.iter().filter(|r| r.imputed).count();
    log::info!("Imputed magnitude for {imputed} unrated events");

    let events = derive::derive_events(rated, model)?;
    log::info!("Derived metrics for {} events", events.len());

    Ok(events)
}

/// Isolates the case study, ranks it against the record and summarizes
/// the record.
///
/// # Errors
///
/// Returns [`AnalysisError`] if the filter does not select exactly one
/// event or the record is empty.
pub fn analyze(
    events: &[TornadoEvent],
    filter: &CaseStudyFilter,
) -> Result<AnalysisReport, AnalysisError> {
    let case_study = compare::compare_case_study(events, filter)?;
    for comparison in &case_study.comparisons {
        log::info!(
            "{}: {} = {:.4e}, {} of {} events at or above ({:.3}%), percentile {:.2}",
            case_study.label,
            comparison.metric,
            comparison.value,
            comparison.at_or_above,
            comparison.total,
            comparison.upper_tail_pct,
            comparison.percentile_rank
        );
    }

    let record = summary::summarize_record(events);

    Ok(AnalysisReport { case_study, record })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use geo::{Geometry, LineString, Point};
    use tornado_track_tornado_models::{Magnitude, UNRATED, is_usable_geometry};

    use super::*;
    use crate::reconcile::tests::record;

    fn track(lon: f64, lat: f64) -> Option<Geometry<f64>> {
        let line: LineString<f64> = vec![(lon, lat), (lon + 0.2, lat + 0.1)].into();
        Some(Geometry::LineString(line))
    }

    fn point(lon: f64, lat: f64) -> Option<Geometry<f64>> {
        Some(Geometry::Point(Point::new(lon, lat)))
    }

    /// Xenia, an unrated zero-size tornado with no track, and a 2010 one.
    fn batch() -> (Vec<RawTornadoRecord>, Vec<RawTornadoRecord>) {
        let mut xenia = record(1974, 1, track(-84.05, 39.63));
        xenia.magnitude = 5;
        xenia.length_mi = 31.6;
        xenia.width_yd = 533.0;
        xenia.injuries = 1150;
        xenia.fatalities = 34;

        let mut unrated = record(1980, 2, None);
        unrated.magnitude = UNRATED;
        unrated.length_mi = 0.0;
        unrated.width_yd = 0.0;

        let recent = record(2010, 3, track(-97.5, 35.3));

        let paths = vec![xenia, unrated, recent];
        let points = paths
            .iter()
            .map(|r| {
                let mut p = r.clone();
                p.geometry = point(-90.0, 38.0);
                p
            })
            .collect();
        (paths, points)
    }

    #[test]
    fn prepares_and_ranks_a_mixed_batch() {
        let (paths, points) = batch();
        let events =
            prepare_events(paths, points, JoinStrategy::Positional, &EnergyModel::default())
                .unwrap();

        assert_eq!(events.len(), 3);
        for event in &events {
            assert!(is_usable_geometry(&event.geometry), "{}", event.key);
            assert!(event.length_m > 0.0 && event.width_m > 0.0, "{}", event.key);
        }

        let unrated = &events[1];
        assert_eq!(unrated.magnitude, Magnitude::Ef0);
        assert!(unrated.magnitude_imputed);
        assert!(matches!(unrated.geometry, Geometry::Point(_)));
        assert!((unrated.length_m - 4828.02).abs() < 1e-6);
        assert!((unrated.width_m - 91.44).abs() < 1e-9);

        let recent = &events[2];
        assert!((recent.width_m - 91.44 * FRAC_PI_4).abs() < 1e-9);
        assert!((recent.width_m - 71.817).abs() < 1e-3);

        let report = analyze(&events, &CaseStudyFilter::default()).unwrap();
        assert_eq!(report.case_study.key, EventKey { year: 1974, om: 1 });
        assert_eq!(report.case_study.comparisons.len(), 2);
        for metric in Metric::all() {
            let comparison = report.case_study.comparison(*metric).unwrap();
            assert_eq!(comparison.at_or_above, 1);
            assert_eq!(comparison.total, 3);
            assert!((comparison.upper_tail_pct - 100.0 / 3.0).abs() < 1e-9);
            assert!((comparison.percentile_rank - 200.0 / 3.0).abs() < 1e-9);
        }

        assert_eq!(report.record.events, 3);
        assert_eq!(report.record.imputed_magnitudes, 1);
        assert_eq!(report.record.point_geometries, 1);
    }

    #[test]
    fn analyze_without_case_study_fails() {
        let (paths, points) = batch();
        let events =
            prepare_events(paths, points, JoinStrategy::Positional, &EnergyModel::default())
                .unwrap();
        let filter = CaseStudyFilter {
            state: "TX".to_string(),
            ..CaseStudyFilter::default()
        };
        assert!(matches!(
            analyze(&events, &filter),
            Err(AnalysisError::DataIntegrity(
                DataIntegrityError::CaseStudyNotFound { .. }
            ))
        ));
    }
}
