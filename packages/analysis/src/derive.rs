//! Unit conversion and per-event derived fields.
//!
//! Lengths and widths are converted to metres, zeros are replaced by the
//! smallest positive value in the whole dataset (computed in a first pass,
//! applied in a second), and post-1994 widths are scaled by `pi/4` to undo
//! the switch from mean to maximum width reporting.

use std::f64::consts::FRAC_PI_4;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tornado_track_analysis_models::Metric;
use tornado_track_tornado_models::{
    EventKey, MAX_WIDTH_CONVENTION_YEAR, METERS_PER_MILE, METERS_PER_YARD, RawTornadoRecord,
    TornadoEvent,
};

use crate::energy::EnergyModel;
use crate::impute::RatedRecord;
use crate::{AnalysisError, ComputationError, DataIntegrityError};

/// Converts statute miles to metres.
#[must_use]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Converts yards to metres.
#[must_use]
pub fn yards_to_meters(yards: f64) -> f64 {
    yards * METERS_PER_YARD
}

/// Normalizes a width (m) reported in `year` to the mean-width convention.
#[must_use]
pub fn normalize_width(width_m: f64, year: i32) -> f64 {
    if year >= MAX_WIDTH_CONVENTION_YEAR {
        width_m * FRAC_PI_4
    } else {
        width_m
    }
}

/// Smallest strictly positive value in `values`.
///
/// # Errors
///
/// Returns [`ComputationError::NoPositiveValue`] if every value is zero.
pub fn min_positive(values: &[f64], field: &'static str) -> Result<f64, ComputationError> {
    values
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .reduce(f64::min)
        .ok_or(ComputationError::NoPositiveValue { field })
}

/// Replaces every zero in `values` with the dataset-wide minimum positive
/// value, returning how many were replaced.
///
/// # Errors
///
/// Returns [`ComputationError::NoPositiveValue`] if there are zeros but no
/// positive value to replace them with.
pub fn impute_zeros(values: &mut [f64], field: &'static str) -> Result<usize, ComputationError> {
    let zeros = values.iter().filter(|v| **v == 0.0).count();
    if zeros == 0 {
        return Ok(0);
    }

    let replacement = min_positive(values, field)?;
    for value in values.iter_mut().filter(|v| **v == 0.0) {
        *value = replacement;
    }

    log::info!("Replaced {zeros} zero {field} values with {replacement}");
    Ok(zeros)
}

/// Local timestamp of a record: year and month from their own fields, day
/// from the last two digits of the date text, and the recorded time of day.
/// The day falls back to `dy` when the date text has no usable trailing day,
/// as with `M/D/YYYY` text. No timezone conversion is applied.
///
/// # Errors
///
/// Returns [`DataIntegrityError::InvalidTimestamp`] if the fields do not
/// form a valid date and time.
pub fn local_timestamp(record: &RawTornadoRecord) -> Result<NaiveDateTime, DataIntegrityError> {
    let invalid = || DataIntegrityError::InvalidTimestamp {
        key: record.key(),
        value: format!(
            "{}-{:02}-{} {}",
            record.year, record.month, record.date, record.time
        ),
    };

    let date = day_from_date_text(&record.date)
        .and_then(|day| NaiveDate::from_ymd_opt(record.year, record.month, day))
        .or_else(|| NaiveDate::from_ymd_opt(record.year, record.month, record.day))
        .ok_or_else(invalid)?;

    let time_text = record.time.trim();
    let time = NaiveTime::parse_from_str(time_text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_text, "%H:%M"))
        .map_err(|_| invalid())?;

    Ok(date.and_time(time))
}

fn day_from_date_text(date: &str) -> Option<u32> {
    let date = date.trim();
    let tail = date.get(date.len().checked_sub(2)?..)?;
    tail.parse().ok()
}

/// Builds enriched events from rated records.
///
/// # Errors
///
/// Returns [`AnalysisError`] if a measurement is negative or non-finite,
/// a timestamp is invalid, a geometry is missing, zero imputation is
/// undefined, or a derived metric is non-finite.
pub fn derive_events(
    records: Vec<RatedRecord>,
    model: &EnergyModel,
) -> Result<Vec<TornadoEvent>, AnalysisError> {
    for rated in &records {
        check_measurement(rated.raw.key(), "length", rated.raw.length_mi)?;
        check_measurement(rated.raw.key(), "width", rated.raw.width_yd)?;
    }

    let mut lengths: Vec<f64> = records
        .iter()
        .map(|r| miles_to_meters(r.raw.length_mi))
        .collect();
    let mut widths: Vec<f64> = records
        .iter()
        .map(|r| yards_to_meters(r.raw.width_yd))
        .collect();

    impute_zeros(&mut lengths, "length")?;
    impute_zeros(&mut widths, "width")?;

    records
        .into_iter()
        .zip(lengths.into_iter().zip(widths))
        .map(|(rated, (length_m, width_m))| {
            let width_m = normalize_width(width_m, rated.raw.year);
            build_event(rated, length_m, width_m, model)
        })
        .collect()
}

fn check_measurement(
    key: EventKey,
    field: &'static str,
    value: f64,
) -> Result<(), DataIntegrityError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DataIntegrityError::InvalidMeasurement { key, field, value })
    }
}

fn build_event(
    rated: RatedRecord,
    length_m: f64,
    width_m: f64,
    model: &EnergyModel,
) -> Result<TornadoEvent, AnalysisError> {
    let key = rated.raw.key();
    let timestamp = local_timestamp(&rated.raw)?;
    let geometry = rated
        .raw
        .geometry
        .ok_or(DataIntegrityError::MissingGeometry { key })?;

    let area_m2 = length_m * width_m;
    let energy_dissipation = model.dissipation(rated.magnitude, area_m2);
    if !energy_dissipation.is_finite() {
        return Err(ComputationError::NonFiniteMetric {
            key,
            metric: Metric::EnergyDissipation,
        }
        .into());
    }

    let casualties = rated
        .raw
        .injuries
        .checked_add(rated.raw.fatalities)
        .ok_or(ComputationError::MetricOverflow {
            key,
            metric: Metric::Casualties,
        })?;

    Ok(TornadoEvent {
        key,
        state: rated.raw.state,
        timestamp,
        magnitude: rated.magnitude,
        magnitude_imputed: rated.imputed,
        length_m,
        width_m,
        area_m2,
        injuries: rated.raw.injuries,
        fatalities: rated.raw.fatalities,
        casualties,
        energy_dissipation,
        geometry,
        footprint: None,
    })
}
