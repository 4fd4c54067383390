#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tornado event types, magnitude ratings and unit constants.
//!
//! Records come in as [`RawTornadoRecord`]s exactly as the Storm Prediction
//! Center publishes them (statute miles, yards, `-9` for unrated events)
//! and leave the analysis pipeline as fully enriched [`TornadoEvent`]s in
//! metric units.

use chrono::{NaiveDate, NaiveDateTime};
use geo::{CoordsIter, Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Metres per statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Metres per yard.
pub const METERS_PER_YARD: f64 = 0.9144;

/// Raw magnitude value the SPC record uses for unrated tornadoes.
pub const UNRATED: i32 = -9;

/// Path length (statute miles) at or below which an unrated tornado is
/// assigned EF0 rather than EF1.
pub const UNRATED_LENGTH_THRESHOLD_MI: f64 = 5.0;

/// First year whose widths are reported as maximum rather than mean width.
pub const MAX_WIDTH_CONVENTION_YEAR: i32 = 1995;

/// Tornado intensity on the (E)F scale.
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
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Magnitude {
    /// 29-38 m/s
    Ef0 = 0,
    /// 38-49 m/s
    Ef1 = 1,
    /// 49-60 m/s
    Ef2 = 2,
    /// 60-74 m/s
    Ef3 = 3,
    /// 74-89 m/s
    Ef4 = 4,
    /// Over 89 m/s
    Ef5 = 5,
}

impl Magnitude {
    /// Returns the numeric rating (0-5).
    #[must_use]
    pub const fn rating(self) -> u8 {
        self as u8
    }

    /// Row index of this rating in rating-indexed tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Creates a magnitude from a numeric rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the rating is not in the range 0-5. In
    /// particular the unrated marker `-9` is rejected: it must be imputed
    /// before a record becomes an event.
    pub const fn from_rating(rating: i32) -> Result<Self, InvalidMagnitudeError> {
        match rating {
            0 => Ok(Self::Ef0),
            1 => Ok(Self::Ef1),
            2 => Ok(Self::Ef2),
            3 => Ok(Self::Ef3),
            4 => Ok(Self::Ef4),
            5 => Ok(Self::Ef5),
            _ => Err(InvalidMagnitudeError { rating }),
        }
    }

    /// Returns all ratings, weakest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Ef0,
            Self::Ef1,
            Self::Ef2,
            Self::Ef3,
            Self::Ef4,
            Self::Ef5,
        ]
    }
}

/// Error returned when a numeric rating does not map to a [`Magnitude`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMagnitudeError {
    /// The rejected rating.
    pub rating: i32,
}

impl std::fmt::Display for InvalidMagnitudeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid magnitude {}: expected 0-5", self.rating)
    }
}

impl std::error::Error for InvalidMagnitudeError {}

/// Identity of a tornado within the record.
///
/// The SPC tornado number (`om`) restarts every year, so it is only unique
/// together with the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    /// Year of occurrence.
    pub year: i32,
    /// Per-year tornado number.
    pub om: i64,
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.om)
    }
}

/// A tornado record as read from the source dataset, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTornadoRecord {
    /// Per-year tornado number.
    pub om: i64,
    /// Year of occurrence.
    pub year: i32,
    /// Month of occurrence (1-12).
    pub month: u32,
    /// Day-of-month field as stored (`dy`).
    pub day: u32,
    /// Calendar date text (`YYYY-MM-DD`).
    pub date: String,
    /// Local time-of-day text (`HH:MM:SS`).
    pub time: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Raw (E)F rating, `-9` when unrated.
    pub magnitude: i32,
    /// Path length in statute miles.
    pub length_mi: f64,
    /// Path width in yards.
    pub width_yd: f64,
    /// Number of injuries.
    pub injuries: u32,
    /// Number of fatalities.
    pub fatalities: u32,
    /// Touchdown latitude (`slat`).
    pub start_lat: Option<f64>,
    /// Touchdown longitude (`slon`).
    pub start_lon: Option<f64>,
    /// Lift-off latitude (`elat`).
    pub end_lat: Option<f64>,
    /// Lift-off longitude (`elon`).
    pub end_lon: Option<f64>,
    /// Track geometry in lon/lat, if the dataset provided one.
    pub geometry: Option<Geometry<f64>>,
}

impl RawTornadoRecord {
    /// Returns the identity of this record.
    #[must_use]
    pub const fn key(&self) -> EventKey {
        EventKey {
            year: self.year,
            om: self.om,
        }
    }

    /// Whether this record carries a geometry usable as a track or point.
    #[must_use]
    pub fn has_geometry(&self) -> bool {
        self.geometry.as_ref().is_some_and(is_usable_geometry)
    }

    /// Geometry rebuilt from the start/end attributes: a segment when both
    /// ends are known and differ, the start point when only it is known.
    /// The SPC record stores `0` for unknown coordinates.
    #[must_use]
    pub fn attribute_geometry(&self) -> Option<Geometry<f64>> {
        let start = known_position(self.start_lon, self.start_lat)?;
        match known_position(self.end_lon, self.end_lat) {
            Some(end) if end != start => Some(Geometry::LineString(vec![start, end].into())),
            _ => Some(Geometry::Point(start.into())),
        }
    }
}

fn known_position(lon: Option<f64>, lat: Option<f64>) -> Option<geo::Coord<f64>> {
    let (x, y) = (lon?, lat?);
    let known = x.is_finite()
        && y.is_finite()
        && x.abs() <= 180.0
        && y.abs() <= 90.0
        && (x != 0.0 || y != 0.0);
    known.then_some(geo::Coord { x, y })
}

/// Returns `true` if a geometry has something to buffer: a point, or a
/// line with at least two vertices.
#[must_use]
pub fn is_usable_geometry(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(p) => p.x().is_finite() && p.y().is_finite(),
        Geometry::LineString(ls) => ls.0.len() >= 2,
        Geometry::MultiLineString(mls) => mls.0.iter().any(|ls| ls.0.len() >= 2),
        Geometry::MultiPoint(mp) => !mp.0.is_empty(),
        other => other.coords_count() > 0,
    }
}

/// Projected track and its buffered footprint polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    /// Track geometry in projected metres.
    pub track: Geometry<f64>,
    /// Track buffered by half the path width, in projected metres.
    pub polygon: MultiPolygon<f64>,
}

/// A fully enriched tornado event in metric units.
#[derive(Debug, Clone, PartialEq)]
pub struct TornadoEvent {
    /// Identity within the record.
    pub key: EventKey,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Local civil time of touchdown, as recorded.
    pub timestamp: NaiveDateTime,
    /// Rating after imputation.
    pub magnitude: Magnitude,
    /// Whether the rating was imputed from an unrated record.
    pub magnitude_imputed: bool,
    /// Path length in metres.
    pub length_m: f64,
    /// Path width in metres, normalized to the pre-1995 convention.
    pub width_m: f64,
    /// Path area in square metres (`length_m * width_m`).
    pub area_m2: f64,
    /// Number of injuries.
    pub injuries: u32,
    /// Number of fatalities.
    pub fatalities: u32,
    /// Injuries plus fatalities.
    pub casualties: u32,
    /// Estimated energy dissipation.
    pub energy_dissipation: f64,
    /// Track (or fallback point) geometry in lon/lat.
    pub geometry: Geometry<f64>,
    /// Projected footprint, once spatial enrichment has run.
    pub footprint: Option<Footprint>,
}

impl TornadoEvent {
    /// Calendar date of the event.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// First coordinate of the track as `(lon, lat)`.
    #[must_use]
    pub fn start_lon_lat(&self) -> Option<(f64, f64)> {
        self.geometry.coords_iter().next().map(|c| (c.x, c.y))
    }
}
