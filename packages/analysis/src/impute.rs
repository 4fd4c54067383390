//! Resolution of unrated tornadoes.
//!
//! An unrated record (`mag = -9`) becomes EF0 when its path is at most
//! five statute miles long and EF1 otherwise. Nothing but the length is
//! consulted.

use tornado_track_tornado_models::{
    Magnitude, RawTornadoRecord, UNRATED, UNRATED_LENGTH_THRESHOLD_MI,
};

use crate::DataIntegrityError;

/// A raw record whose magnitude has been resolved to 0-5.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedRecord {
    /// The record as read (its `magnitude` field still holds the raw value).
    pub raw: RawTornadoRecord,
    /// The resolved rating.
    pub magnitude: Magnitude,
    /// Whether `magnitude` was imputed from an unrated record.
    pub imputed: bool,
}

/// Rating assigned to an unrated tornado with a path of `length_mi` miles.
#[must_use]
pub fn resolve_unrated(length_mi: f64) -> Magnitude {
    if length_mi <= UNRATED_LENGTH_THRESHOLD_MI {
        Magnitude::Ef0
    } else {
        Magnitude::Ef1
    }
}

/// Resolves every record's rating.
///
/// # Errors
///
/// Returns [`DataIntegrityError::MagnitudeOutOfRange`] for any rating that
/// is neither 0-5 nor the unrated marker.
pub fn impute_magnitudes(
    records: Vec<RawTornadoRecord>,
) -> Result<Vec<RatedRecord>, DataIntegrityError> {
    records
        .into_iter()
        .map(|raw| {
            if raw.magnitude == UNRATED {
                let magnitude = resolve_unrated(raw.length_mi);
                log::debug!(
                    "Unrated {} ({} mi) imputed as {magnitude}",
                    raw.key(),
                    raw.length_mi
                );
                return Ok(RatedRecord {
                    raw,
                    magnitude,
                    imputed: true,
                });
            }

            let magnitude = Magnitude::from_rating(raw.magnitude).map_err(|e| {
                DataIntegrityError::MagnitudeOutOfRange {
                    key: raw.key(),
                    rating: e.rating,
                }
            })?;
            Ok(RatedRecord {
                raw,
                magnitude,
                imputed: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::tests::record;

    fn unrated(length_mi: f64) -> RawTornadoRecord {
        let mut r = record(1990, 1, None);
        r.magnitude = UNRATED;
        r.length_mi = length_mi;
        r
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(resolve_unrated(5.0), Magnitude::Ef0);
        assert_eq!(resolve_unrated(5.0001), Magnitude::Ef1);
        assert_eq!(resolve_unrated(0.0), Magnitude::Ef0);
    }

    #[test]
    fn never_leaves_unrated() {
        let records = vec![unrated(1.0), unrated(12.0), record(1990, 3, None)];
        let rated = impute_magnitudes(records).unwrap();
        assert_eq!(rated[0].magnitude, Magnitude::Ef0);
        assert_eq!(rated[1].magnitude, Magnitude::Ef1);
        assert_eq!(rated[2].magnitude, Magnitude::Ef2);
        assert!(rated[0].imputed && rated[1].imputed && !rated[2].imputed);
    }

    #[test]
    fn ignores_width() {
        let mut wide = unrated(2.0);
        wide.width_yd = 2000.0;
        let rated = impute_magnitudes(vec![wide]).unwrap();
        assert_eq!(rated[0].magnitude, Magnitude::Ef0);
    }

    #[test]
    fn rejects_out_of_range_rating() {
        let mut bad = record(1990, 7, None);
        bad.magnitude = 6;
        let err = impute_magnitudes(vec![bad]).unwrap_err();
        assert!(matches!(
            err,
            DataIntegrityError::MagnitudeOutOfRange { rating: 6, .. }
        ));
    }
}
