#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case-study comparison and record summary types.
//!
//! These are the outputs of the analysis stage: how one named tornado
//! ranks against the whole record, and per-rating totals for the record
//! itself. All of them serialize to the report JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use tornado_track_tornado_models::{EventKey, Magnitude};

/// Predicate that isolates a single historical tornado.
///
/// All three of state, magnitude and date must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudyFilter {
    /// Display label for the event (e.g. "Xenia, OH").
    pub label: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Rating of the event.
    pub magnitude: Magnitude,
    /// Calendar date of the event.
    pub date: NaiveDate,
}

impl Default for CaseStudyFilter {
    fn default() -> Self {
        Self {
            label: "Xenia, OH".to_string(),
            state: "OH".to_string(),
            magnitude: Magnitude::Ef5,
            date: NaiveDate::from_ymd_opt(1974, 4, 3).unwrap_or_default(),
        }
    }
}

/// A per-event metric the case study is ranked on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Estimated energy dissipation.
    EnergyDissipation,
    /// Injuries plus fatalities.
    Casualties,
}

impl Metric {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::EnergyDissipation, Self::Casualties]
    }
}

/// Where the case study sits in the distribution of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    /// Which metric this comparison is for.
    pub metric: Metric,
    /// The case study's own value.
    pub value: f64,
    /// Number of events with a value at or above the case study's.
    pub at_or_above: u64,
    /// Total number of events in the record.
    pub total: u64,
    /// `at_or_above / total * 100`.
    pub upper_tail_pct: f64,
    /// `100 - upper_tail_pct`.
    pub percentile_rank: f64,
}

/// The isolated event and its rank against the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudyReport {
    /// Display label from the filter.
    pub label: String,
    /// Identity of the selected event.
    pub key: EventKey,
    /// State abbreviation.
    pub state: String,
    /// Calendar date.
    pub date: NaiveDate,
    /// Rating.
    pub magnitude: Magnitude,
    /// Path length in metres.
    pub length_m: f64,
    /// Path width in metres.
    pub width_m: f64,
    /// Injuries plus fatalities.
    pub casualties: u32,
    /// Estimated energy dissipation.
    pub energy_dissipation: f64,
    /// One entry per [`Metric`].
    pub comparisons: Vec<MetricComparison>,
}

impl CaseStudyReport {
    /// Returns the comparison for a given metric, if computed.
    #[must_use]
    pub fn comparison(&self, metric: Metric) -> Option<&MetricComparison> {
        self.comparisons.iter().find(|c| c.metric == metric)
    }
}

/// Totals for all events of one rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnitudeSummary {
    /// The rating.
    pub magnitude: Magnitude,
    /// Number of events.
    pub count: u64,
    /// Of which had their rating imputed.
    pub imputed: u64,
    /// Sum of casualties.
    pub casualties: u64,
    /// Sum of energy dissipation.
    pub total_energy_dissipation: f64,
    /// Mean energy dissipation (0 when `count` is 0).
    pub mean_energy_dissipation: f64,
}

/// Overview of the whole record after enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    /// Number of events.
    pub events: u64,
    /// Earliest year present.
    pub first_year: Option<i32>,
    /// Latest year present.
    pub last_year: Option<i32>,
    /// Events whose rating was imputed.
    pub imputed_magnitudes: u64,
    /// Events whose geometry fell back to the initial point.
    pub point_geometries: u64,
    /// Per-rating totals, EF0 first.
    pub by_magnitude: Vec<MagnitudeSummary>,
}

/// Everything the analysis stage reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// The case study and its ranks.
    pub case_study: CaseStudyReport,
    /// Record-wide summary.
    pub record: RecordSummary,
}
