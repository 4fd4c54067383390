//! Energy dissipation estimated from rating and path area.
//!
//! Each rating spreads its probability over six wind-speed bins. The
//! expected cubed wind speed of a rating (`EW3`) is the probability-weighted
//! sum of the cubed bin midpoints, and energy dissipation is `EW3` times the
//! path area. The `0.5 * rho` air-density factor is deliberately absent.

use tornado_track_tornado_models::Magnitude;

/// Lower wind-speed bound (m/s) of each bin, EF0 first.
pub const WIND_SPEED_THRESHOLDS: [f64; 6] = [29.06, 38.45, 49.62, 60.8, 74.21, 89.41];

/// Offset (m/s) from the last threshold to the midpoint of the open top bin.
pub const TOP_BIN_MIDPOINT_OFFSET: f64 = 7.5;

/// Probability of each wind-speed bin (columns) given a rating (rows).
pub const RATING_WIND_DISTRIBUTION: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.772, 0.228, 0.0, 0.0, 0.0, 0.0],
    [0.616, 0.268, 0.115, 0.0, 0.0, 0.0],
    [0.529, 0.271, 0.133, 0.067, 0.0, 0.0],
    [0.543, 0.238, 0.131, 0.056, 0.032, 0.0],
    [0.538, 0.223, 0.119, 0.07, 0.033, 0.017],
];

/// Rating-to-wind-speed model with the per-rating `EW3` precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    expected_cubed: [f64; 6],
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self::new(RATING_WIND_DISTRIBUTION, WIND_SPEED_THRESHOLDS)
    }
}

impl EnergyModel {
    /// Builds a model from a rating-by-bin distribution and bin thresholds.
    #[must_use]
    pub fn new(distribution: [[f64; 6]; 6], thresholds: [f64; 6]) -> Self {
        let midpoints = midpoint_speeds(&thresholds);

        let mut expected_cubed = [0.0; 6];
        for (ew3, row) in expected_cubed.iter_mut().zip(&distribution) {
            *ew3 = row
                .iter()
                .zip(&midpoints)
                .map(|(p, w)| p * w.powi(3))
                .sum();
        }

        Self { expected_cubed }
    }

    /// Expected cubed wind speed (`EW3`) for a rating.
    #[must_use]
    pub const fn expected_cubed_speed(&self, magnitude: Magnitude) -> f64 {
        self.expected_cubed[magnitude.index()]
    }

    /// Energy dissipation of a tornado of the given rating over `area_m2`.
    #[must_use]
    pub fn dissipation(&self, magnitude: Magnitude, area_m2: f64) -> f64 {
        self.expected_cubed_speed(magnitude) * area_m2
    }
}

/// Midpoint of each bin: halfway to the next threshold, or
/// [`TOP_BIN_MIDPOINT_OFFSET`] above the last one.
#[must_use]
pub fn midpoint_speeds(thresholds: &[f64; 6]) -> [f64; 6] {
    let mut midpoints = [0.0; 6];
    for (i, midpoint) in midpoints.iter_mut().enumerate() {
        *midpoint = thresholds.get(i + 1).map_or(
            thresholds[i] + TOP_BIN_MIDPOINT_OFFSET,
            |next| thresholds[i] + (next - thresholds[i]) / 2.0,
        );
    }
    midpoints
}
