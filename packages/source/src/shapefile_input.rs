//! Shapefile reader.

use std::path::Path;

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, Point};
use shapefile::Shape;
use tornado_track_tornado_models::RawTornadoRecord;

use crate::AcquisitionError;
use crate::attributes::parse_record;
use crate::progress::ProgressCallback;

/// Reads every feature of a shapefile (with its `.dbf` sidecar) in file
/// order.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if the file cannot be opened, a shape is
/// malformed, or a record lacks a required attribute.
pub fn read_records(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<Vec<RawTornadoRecord>, AcquisitionError> {
    let shapefile_error = |source| AcquisitionError::Shapefile {
        path: path.display().to_string(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(path).map_err(shapefile_error)?;

    let mut records = Vec::new();
    for (index, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, attrs) = item.map_err(shapefile_error)?;
        let geometry = shape_to_geometry(shape);
        records.push(parse_record(&attrs, geometry, path, index)?);

        progress.inc(1);
        if (index + 1) % 10_000 == 0 {
            log::debug!("  read {} features from {}", index + 1, path.display());
        }
    }

    Ok(records)
}

fn point_coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn lines(parts: Vec<Vec<Coord<f64>>>) -> Option<Geometry<f64>> {
    let mut lines: Vec<LineString<f64>> = parts.into_iter().map(LineString::new).collect();
    match lines.len() {
        0 => None,
        1 => lines.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(lines))),
    }
}

/// Converts a shape into a lon/lat geometry. Null shapes and shape kinds
/// the tornado datasets never use become `None`.
#[must_use]
pub fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    match shape {
        Shape::NullShape => None,
        Shape::Point(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointM(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::PointZ(p) => Some(Geometry::Point(Point::new(p.x, p.y))),
        Shape::Multipoint(mp) => Some(Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        ))),
        Shape::Polyline(line) => lines(
            line.parts()
                .iter()
                .map(|part| part.iter().map(|p| point_coord(p.x, p.y)).collect())
                .collect(),
        ),
        Shape::PolylineM(line) => lines(
            line.parts()
                .iter()
                .map(|part| part.iter().map(|p| point_coord(p.x, p.y)).collect())
                .collect(),
        ),
        Shape::PolylineZ(line) => lines(
            line.parts()
                .iter()
                .map(|part| part.iter().map(|p| point_coord(p.x, p.y)).collect())
                .collect(),
        ),
        other => {
            log::warn!("Ignoring unsupported shape type {}", other.shapetype());
            None
        }
    }
}
