#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Plot-ready exports of the analysed record.
//!
//! Nothing is rendered here. The scatter series goes out as CSV, the
//! bubble map and footprints as `GeoJSON` `FeatureCollection`s, and the
//! analysis report as JSON. A renderer supplies the log-log axes and the
//! state basemap.

pub mod map;
pub mod scatter;

use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use geojson::FeatureCollection;
use serde::Serialize;
use tornado_track_analysis::ComputationError;
use tornado_track_analysis::projection::LambertConformalConic;
use tornado_track_analysis_models::AnalysisReport;
use tornado_track_tornado_models::TornadoEvent;

pub use map::{bubble_map, footprint_collection};
pub use scatter::{ScatterRow, scatter_series, write_scatter_csv};

/// Errors that can occur while writing exports.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// I/O error on an output file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A footprint could not be un-projected.
    #[error("Projection error: {0}")]
    Projection(#[from] ComputationError),
}

impl GenerateError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

fn write_pretty_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), GenerateError> {
    let file = std::fs::File::create(path).map_err(|e| GenerateError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| GenerateError::io(path, e))
}

/// Writes a `FeatureCollection` as pretty-printed `GeoJSON`.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> Result<(), GenerateError> {
    write_pretty_json(collection, path)?;
    log::info!(
        "Wrote {} features to {}",
        collection.features.len(),
        path.display()
    );
    Ok(())
}

/// Writes the analysis report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
pub fn write_report_json(report: &AnalysisReport, path: &Path) -> Result<(), GenerateError> {
    write_pretty_json(report, path)?;
    log::info!("Wrote report to {}", path.display());
    Ok(())
}

/// Paths of every file [`export_all`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    /// `scatter_<state>.csv`
    pub scatter: PathBuf,
    /// `bubbles_<state>.geojson`
    pub bubbles: PathBuf,
    /// `footprints_<state>.geojson`
    pub footprints: PathBuf,
    /// `report.json`
    pub report: PathBuf,
}

/// Writes all exports for the case study's state into `out_dir`,
/// creating it if needed.
///
/// # Errors
///
/// Returns [`GenerateError`] if the directory or any file cannot be
/// written, or a footprint cannot be un-projected.
pub fn export_all(
    events: &[TornadoEvent],
    report: &AnalysisReport,
    projection: &LambertConformalConic,
    out_dir: &Path,
) -> Result<ExportedFiles, GenerateError> {
    std::fs::create_dir_all(out_dir).map_err(|e| GenerateError::io(out_dir, e))?;

    let case = &report.case_study;
    let state = case.state.to_ascii_uppercase();

    let files = ExportedFiles {
        scatter: out_dir.join(format!("scatter_{state}.csv")),
        bubbles: out_dir.join(format!("bubbles_{state}.geojson")),
        footprints: out_dir.join(format!("footprints_{state}.geojson")),
        report: out_dir.join("report.json"),
    };

    write_scatter_csv(&scatter_series(events, &state, case), &files.scatter)?;
    write_geojson(&bubble_map(events, &state, case), &files.bubbles)?;
    write_geojson(
        &footprint_collection(events, projection, &state)?,
        &files.footprints,
    )?;
    write_report_json(report, &files.report)?;

    Ok(files)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use geo::{Geometry, Point};
    use tornado_track_analysis_models::{
        CaseStudyReport, Metric, MetricComparison, RecordSummary,
    };
    use tornado_track_tornado_models::{EventKey, Magnitude};

    use tornado_track_analysis::projection::LccParameters;

    use super::*;

    pub(crate) fn event(
        om: i64,
        state: &str,
        energy_dissipation: f64,
        casualties: u32,
        date: &str,
    ) -> TornadoEvent {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        TornadoEvent {
            key: EventKey {
                year: chrono::Datelike::year(&date),
                om,
            },
            state: state.to_string(),
            timestamp: date.and_hms_opt(16, 30, 0).unwrap(),
            magnitude: Magnitude::Ef3,
            magnitude_imputed: false,
            length_m: 1000.0,
            width_m: 100.0,
            area_m2: 100_000.0,
            injuries: casualties,
            fatalities: 0,
            casualties,
            energy_dissipation,
            geometry: Geometry::Point(Point::new(-84.0, 39.6)),
            footprint: None,
        }
    }

    pub(crate) fn case_report(om: i64) -> CaseStudyReport {
        CaseStudyReport {
            label: "Xenia, OH".to_string(),
            key: EventKey { year: 1974, om },
            state: "OH".to_string(),
            date: NaiveDate::from_ymd_opt(1974, 4, 3).unwrap(),
            magnitude: Magnitude::Ef5,
            length_m: 50_372.0,
            width_m: 487.0,
            casualties: 1184,
            energy_dissipation: 1.0e9,
            comparisons: vec![MetricComparison {
                metric: Metric::EnergyDissipation,
                value: 1.0e9,
                at_or_above: 1,
                total: 4,
                upper_tail_pct: 25.0,
                percentile_rank: 75.0,
            }],
        }
    }

    #[test]
    fn exports_every_artifact() {
        let out = std::env::temp_dir().join(format!("tornado_export_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&out);

        let events = vec![
            event(73, "OH", 1.0e9, 1184, "1974-04-03"),
            event(74, "OH", 2.0e7, 12, "1974-04-03"),
        ];
        let report = AnalysisReport {
            case_study: case_report(73),
            record: RecordSummary {
                events: 2,
                first_year: Some(1974),
                last_year: Some(1974),
                imputed_magnitudes: 0,
                point_geometries: 2,
                by_magnitude: vec![],
            },
        };

        let projection = LambertConformalConic::new(LccParameters::default()).unwrap();
        let files = export_all(&events, &report, &projection, &out).unwrap();
        assert_eq!(files.scatter, out.join("scatter_OH.csv"));
        assert!(files.bubbles.exists());
        assert!(files.footprints.exists());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.report).unwrap()).unwrap();
        assert_eq!(json["caseStudy"]["label"], "Xenia, OH");
        assert_eq!(json["caseStudy"]["comparisons"][0]["metric"], "energy_dissipation");
        assert_eq!(json["record"]["events"], 2);

        let _ = std::fs::remove_dir_all(&out);
    }
}
