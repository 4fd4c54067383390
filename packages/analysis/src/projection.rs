//! Two-parallel Lambert conformal conic projection backed by `proj4rs`.
//!
//! The defaults reproduce ESRI:102004, "USA Contiguous Lambert Conformal
//! Conic" on GRS80. Geographic coordinates use the same ellipsoid, so no
//! datum shift is involved.

use geo::{Coord, Geometry, MapCoords};
use proj4rs::proj::Proj;
use serde::Deserialize;

use crate::ComputationError;

/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub semi_major_axis: f64,
    /// Inverse flattening (`1/f`).
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    /// GRS 1980, as used by NAD83.
    pub const GRS80: Self = Self {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    /// Clarke 1866, as used by NAD27.
    pub const CLARKE_1866: Self = Self {
        semi_major_axis: 6_378_206.4,
        inverse_flattening: 294.978_698_2,
    };

    fn proj_terms(&self) -> String {
        format!("+a={} +rf={}", self.semi_major_axis, self.inverse_flattening)
    }
}

/// Parameters of a two-parallel Lambert conformal conic projection.
/// Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LccParameters {
    /// First standard parallel.
    pub standard_parallel_1: f64,
    /// Second standard parallel.
    pub standard_parallel_2: f64,
    /// Latitude of the projection origin.
    pub latitude_of_origin: f64,
    /// Central meridian.
    pub central_meridian: f64,
    /// False easting in metres.
    #[serde(default)]
    pub false_easting: f64,
    /// False northing in metres.
    #[serde(default)]
    pub false_northing: f64,
    /// Reference ellipsoid.
    #[serde(default = "default_ellipsoid")]
    pub ellipsoid: Ellipsoid,
}

const fn default_ellipsoid() -> Ellipsoid {
    Ellipsoid::GRS80
}

impl Default for LccParameters {
    fn default() -> Self {
        Self {
            standard_parallel_1: 33.0,
            standard_parallel_2: 45.0,
            latitude_of_origin: 39.0,
            central_meridian: -96.0,
            false_easting: 0.0,
            false_northing: 0.0,
            ellipsoid: Ellipsoid::GRS80,
        }
    }
}

impl LccParameters {
    /// PROJ definition of the projected system.
    #[must_use]
    pub fn proj_string(&self) -> String {
        format!(
            "+proj=lcc +lat_1={} +lat_2={} +lat_0={} +lon_0={} +x_0={} +y_0={} {} \
             +units=m +no_defs",
            self.standard_parallel_1,
            self.standard_parallel_2,
            self.latitude_of_origin,
            self.central_meridian,
            self.false_easting,
            self.false_northing,
            self.ellipsoid.proj_terms(),
        )
    }

    fn validate(&self) -> Result<(), ComputationError> {
        let invalid = |message: &str| ComputationError::InvalidProjection {
            message: message.to_string(),
        };

        let values = [
            self.standard_parallel_1,
            self.standard_parallel_2,
            self.latitude_of_origin,
            self.central_meridian,
            self.false_easting,
            self.false_northing,
            self.ellipsoid.semi_major_axis,
            self.ellipsoid.inverse_flattening,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("parameters must be finite"));
        }
        if self.ellipsoid.semi_major_axis <= 0.0 || self.ellipsoid.inverse_flattening <= 1.0 {
            return Err(invalid("ellipsoid must have a positive size and flattening"));
        }
        for lat in [self.standard_parallel_1, self.standard_parallel_2] {
            if lat.abs() >= 90.0 {
                return Err(invalid(
                    "standard parallels must lie strictly between the poles",
                ));
            }
        }
        if (self.standard_parallel_1 + self.standard_parallel_2).abs() < 1e-10 {
            return Err(invalid(
                "standard parallels must not be symmetric about the equator",
            ));
        }
        Ok(())
    }
}

/// A ready-to-use projection: the geographic and projected systems built
/// once from [`LccParameters`].
pub struct LambertConformalConic {
    params: LccParameters,
    geographic: Proj,
    projected: Proj,
}

impl std::fmt::Debug for LambertConformalConic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambertConformalConic")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn proj_error(e: impl std::fmt::Display) -> ComputationError {
    ComputationError::InvalidProjection {
        message: e.to_string(),
    }
}

impl LambertConformalConic {
    /// Builds a projection from its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::InvalidProjection`] if the standard
    /// parallels are symmetric about the equator, lie at a pole, any
    /// parameter is non-finite, or `proj4rs` rejects the definition.
    pub fn new(params: LccParameters) -> Result<Self, ComputationError> {
        params.validate()?;

        let geographic = Proj::from_proj_string(&format!(
            "+proj=longlat {} +no_defs",
            params.ellipsoid.proj_terms()
        ))
        .map_err(proj_error)?;
        let projected = Proj::from_proj_string(&params.proj_string()).map_err(proj_error)?;

        Ok(Self {
            params,
            geographic,
            projected,
        })
    }

    /// The parameters this projection was built from.
    #[must_use]
    pub const fn parameters(&self) -> &LccParameters {
        &self.params
    }

    /// Projects a lon/lat position (degrees) to easting/northing (metres).
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::InvalidProjection`] if the position
    /// cannot be projected.
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ComputationError> {
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        proj4rs::transform::transform(&self.geographic, &self.projected, &mut point)
            .map_err(proj_error)?;
        finite(point.0, point.1)
    }

    /// Recovers the lon/lat position (degrees) of an easting/northing.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::InvalidProjection`] if the position
    /// cannot be un-projected.
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ComputationError> {
        let mut point = (x, y, 0.0);
        proj4rs::transform::transform(&self.projected, &self.geographic, &mut point)
            .map_err(proj_error)?;
        finite(point.0.to_degrees(), point.1.to_degrees())
    }

    /// Projects every coordinate of a lon/lat geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::InvalidProjection`] if any coordinate
    /// cannot be projected.
    pub fn project_geometry(
        &self,
        geometry: &Geometry<f64>,
    ) -> Result<Geometry<f64>, ComputationError> {
        geometry.try_map_coords(|c| {
            let (x, y) = self.forward(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }

    /// Un-projects every coordinate of a projected geometry back to lon/lat.
    ///
    /// # Errors
    ///
    /// Returns [`ComputationError::InvalidProjection`] if any coordinate
    /// cannot be un-projected.
    pub fn unproject_geometry(
        &self,
        geometry: &Geometry<f64>,
    ) -> Result<Geometry<f64>, ComputationError> {
        geometry.try_map_coords(|c| {
            let (x, y) = self.inverse(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}

fn finite(x: f64, y: f64) -> Result<(f64, f64), ComputationError> {
    if x.is_finite() && y.is_finite() {
        Ok((x, y))
    } else {
        Err(proj_error(format!("non-finite result ({x}, {y})")))
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point};

    use super::*;

    fn usa_contiguous() -> LambertConformalConic {
        LambertConformalConic::new(LccParameters::default()).unwrap()
    }

    #[test]
    fn origin_projects_to_false_origin() {
        let (x, y) = usa_contiguous().forward(-96.0, 39.0).unwrap();
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6, "({x}, {y})");
    }

    #[test]
    fn default_definition_is_esri_102004() {
        assert_eq!(
            LccParameters::default().proj_string(),
            "+proj=lcc +lat_1=33 +lat_2=45 +lat_0=39 +lon_0=-96 +x_0=0 +y_0=0 \
             +a=6378137 +rf=298.257222101 +units=m +no_defs"
        );
    }

    // Snyder, Map Projections: A Working Manual, p. 296.
    #[test]
    fn matches_snyder_worked_example() {
        let lcc = LambertConformalConic::new(LccParameters {
            standard_parallel_1: 33.0,
            standard_parallel_2: 45.0,
            latitude_of_origin: 23.0,
            central_meridian: -96.0,
            false_easting: 0.0,
            false_northing: 0.0,
            ellipsoid: Ellipsoid::CLARKE_1866,
        })
        .unwrap();
        let (x, y) = lcc.forward(-75.0, 35.0).unwrap();
        assert!((x - 1_894_410.9).abs() < 1.0, "x = {x}");
        assert!((y - 1_564_649.5).abs() < 1.0, "y = {y}");
    }

    #[test]
    fn inverse_roundtrip() {
        let lcc = usa_contiguous();
        for (lon, lat) in [(-83.93, 39.68), (-120.5, 47.2), (-70.1, 25.3), (-96.0, 39.0)] {
            let (x, y) = lcc.forward(lon, lat).unwrap();
            let (lon2, lat2) = lcc.inverse(x, y).unwrap();
            assert!((lon - lon2).abs() < 1e-7, "{lon} vs {lon2}");
            assert!((lat - lat2).abs() < 1e-7, "{lat} vs {lat2}");
        }
    }

    #[test]
    fn projects_geometries() {
        let lcc = usa_contiguous();
        let line: LineString<f64> = vec![(-96.0, 39.0), (-95.0, 39.0)].into();
        let Geometry::LineString(projected) =
            lcc.project_geometry(&Geometry::LineString(line)).unwrap()
        else {
            panic!("geometry type changed");
        };
        assert!(projected.0[0].x.abs() < 1e-6);
        // One degree of longitude near 39N is roughly 86 km.
        assert!((projected.0[1].x - 86_000.0).abs() < 2_000.0);

        let projected = lcc
            .project_geometry(&Geometry::Point(Point::new(-84.0, 39.7)))
            .unwrap();
        let Geometry::Point(p) = lcc.unproject_geometry(&projected).unwrap() else {
            panic!("geometry type changed");
        };
        assert!((p.x() + 84.0).abs() < 1e-7 && (p.y() - 39.7).abs() < 1e-7);
    }

    #[test]
    fn rejects_symmetric_parallels() {
        let params = LccParameters {
            standard_parallel_1: 30.0,
            standard_parallel_2: -30.0,
            ..LccParameters::default()
        };
        assert!(LambertConformalConic::new(params).is_err());
    }
}
