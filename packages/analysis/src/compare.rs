//! Case-study isolation and upper-tail ranking.
//!
//! The rank of a value is reported as the share of the record at or above
//! it (`#(v >= threshold) / n * 100`), an upper-tail percentage rather than
//! a cumulative percentile. `percentile_rank` is its complement.

use tornado_track_analysis_models::{
    CaseStudyFilter, CaseStudyReport, Metric, MetricComparison,
};
use tornado_track_tornado_models::TornadoEvent;

use crate::{AnalysisError, ComputationError, DataIntegrityError};

/// Whether an event satisfies the filter (state, magnitude and date).
#[must_use]
pub fn matches_filter(event: &TornadoEvent, filter: &CaseStudyFilter) -> bool {
    event.state.eq_ignore_ascii_case(&filter.state)
        && event.magnitude == filter.magnitude
        && event.date() == filter.date
}

/// Returns the single event selected by the filter.
///
/// # Errors
///
/// Returns [`DataIntegrityError::CaseStudyNotFound`] if nothing matches and
/// [`DataIntegrityError::CaseStudyAmbiguous`] if more than one event does.
pub fn select_case_study<'a>(
    events: &'a [TornadoEvent],
    filter: &CaseStudyFilter,
) -> Result<&'a TornadoEvent, DataIntegrityError> {
    let matches: Vec<&TornadoEvent> = events
        .iter()
        .filter(|e| matches_filter(e, filter))
        .collect();

    match matches.as_slice() {
        [event] => Ok(*event),
        [] => Err(DataIntegrityError::CaseStudyNotFound {
            label: filter.label.clone(),
        }),
        many => Err(DataIntegrityError::CaseStudyAmbiguous {
            label: filter.label.clone(),
            count: many.len(),
        }),
    }
}

/// Value of a metric for one event.
#[must_use]
pub fn metric_value(event: &TornadoEvent, metric: Metric) -> f64 {
    match metric {
        Metric::EnergyDissipation => event.energy_dissipation,
        Metric::Casualties => f64::from(event.casualties),
    }
}

/// Percentage of `values` at or above `threshold`.
///
/// # Errors
///
/// Returns [`ComputationError::EmptyPopulation`] if `values` is empty.
pub fn upper_tail_percentage(values: &[f64], threshold: f64) -> Result<f64, ComputationError> {
    if values.is_empty() {
        return Err(ComputationError::EmptyPopulation);
    }
    let at_or_above = values.iter().filter(|v| **v >= threshold).count();
    #[allow(clippy::cast_precision_loss)]
    let pct = at_or_above as f64 / values.len() as f64 * 100.0;
    Ok(pct)
}

/// Ranks `value` against the metric over all events.
///
/// # Errors
///
/// Returns [`ComputationError::EmptyPopulation`] if `events` is empty.
pub fn compare_metric(
    events: &[TornadoEvent],
    metric: Metric,
    value: f64,
) -> Result<MetricComparison, ComputationError> {
    let values: Vec<f64> = events.iter().map(|e| metric_value(e, metric)).collect();
    let upper_tail_pct = upper_tail_percentage(&values, value)?;
    let at_or_above = values.iter().filter(|v| **v >= value).count();

    Ok(MetricComparison {
        metric,
        value,
        at_or_above: at_or_above as u64,
        total: values.len() as u64,
        upper_tail_pct,
        percentile_rank: 100.0 - upper_tail_pct,
    })
}

/// Selects the case study and ranks it on every [`Metric`].
///
/// # Errors
///
/// Returns [`AnalysisError`] if the filter does not select exactly one
/// event.
pub fn compare_case_study(
    events: &[TornadoEvent],
    filter: &CaseStudyFilter,
) -> Result<CaseStudyReport, AnalysisError> {
    let case = select_case_study(events, filter)?;
    log::info!(
        "Case study {}: {} on {} ({})",
        filter.label,
        case.key,
        case.timestamp,
        case.magnitude
    );

    let comparisons = Metric::all()
        .iter()
        .map(|metric| compare_metric(events, *metric, metric_value(case, *metric)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CaseStudyReport {
        label: filter.label.clone(),
        key: case.key,
        state: case.state.clone(),
        date: case.date(),
        magnitude: case.magnitude,
        length_m: case.length_m,
        width_m: case.width_m,
        casualties: case.casualties,
        energy_dissipation: case.energy_dissipation,
        comparisons,
    })
}
