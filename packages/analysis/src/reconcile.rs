//! Pairs each tornado's track geometry with its initial-point geometry.
//!
//! The SPC publishes tracks and touchdown points as two datasets with the
//! same rows in the same order. A tornado whose track is missing (or is a
//! single vertex) falls back to its touchdown point.

use std::collections::BTreeMap;

use serde::Deserialize;
use tornado_track_tornado_models::{EventKey, RawTornadoRecord, is_usable_geometry};

use crate::DataIntegrityError;

/// How the path and point datasets are matched up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// Pair by row position. Both datasets must be the same length and
    /// every pair must carry the same [`EventKey`].
    #[default]
    Positional,
    /// Pair by [`EventKey`]. Keys must be unique in the point dataset.
    Keyed,
}

/// Produces one record per tornado whose geometry is the path geometry
/// when usable and the point geometry otherwise.
///
/// # Errors
///
/// Returns [`DataIntegrityError`] if the datasets cannot be paired under
/// `strategy`, or if a tornado has no usable geometry in either.
pub fn reconcile_geometries(
    paths: Vec<RawTornadoRecord>,
    points: Vec<RawTornadoRecord>,
    strategy: JoinStrategy,
) -> Result<Vec<RawTornadoRecord>, DataIntegrityError> {
    let reconciled = match strategy {
        JoinStrategy::Positional => reconcile_positional(paths, points)?,
        JoinStrategy::Keyed => reconcile_keyed(paths, points)?,
    };

    let fallbacks = reconciled
        .iter()
        .filter(|r| {
            matches!(
                r.geometry,
                Some(geo::Geometry::Point(_) | geo::Geometry::MultiPoint(_))
            )
        })
        .count();
    log::info!(
        "Reconciled {} records ({fallbacks} use a point geometry)",
        reconciled.len()
    );

    Ok(reconciled)
}

fn reconcile_positional(
    paths: Vec<RawTornadoRecord>,
    points: Vec<RawTornadoRecord>,
) -> Result<Vec<RawTornadoRecord>, DataIntegrityError> {
    if paths.len() != points.len() {
        return Err(DataIntegrityError::LengthMismatch {
            paths: paths.len(),
            points: points.len(),
        });
    }

    paths
        .into_iter()
        .zip(points)
        .enumerate()
        .map(|(index, (path, point))| {
            if path.key() != point.key() {
                return Err(DataIntegrityError::KeyMismatch {
                    index,
                    path_key: path.key(),
                    point_key: point.key(),
                });
            }
            merge(path, Some(point))
        })
        .collect()
}

fn reconcile_keyed(
    paths: Vec<RawTornadoRecord>,
    points: Vec<RawTornadoRecord>,
) -> Result<Vec<RawTornadoRecord>, DataIntegrityError> {
    let mut by_key: BTreeMap<EventKey, RawTornadoRecord> = BTreeMap::new();
    for point in points {
        let key = point.key();
        if by_key.insert(key, point).is_some() {
            return Err(DataIntegrityError::DuplicateKey {
                key,
                dataset: "point",
            });
        }
    }

    let mut seen = std::collections::BTreeSet::new();
    let mut reconciled = Vec::with_capacity(paths.len());
    for path in paths {
        let key = path.key();
        if !seen.insert(key) {
            return Err(DataIntegrityError::DuplicateKey {
                key,
                dataset: "path",
            });
        }
        let point = by_key.remove(&key);
        if point.is_none() {
            log::debug!("No initial point for {key}");
        }
        reconciled.push(merge(path, point)?);
    }

    if !by_key.is_empty() {
        log::warn!(
            "{} initial points have no matching path record and were dropped",
            by_key.len()
        );
    }

    Ok(reconciled)
}

fn merge(
    mut path: RawTornadoRecord,
    point: Option<RawTornadoRecord>,
) -> Result<RawTornadoRecord, DataIntegrityError> {
    if path.has_geometry() {
        return Ok(path);
    }

    if let Some(fallback) = point.and_then(|p| p.geometry).filter(is_usable_geometry) {
        log::debug!("Using initial point for {}", path.key());
        path.geometry = Some(fallback);
        return Ok(path);
    }

    let fallback = path
        .attribute_geometry()
        .ok_or(DataIntegrityError::MissingGeometry { key: path.key() })?;
    log::debug!("Using start/end coordinates for {}", path.key());
    path.geometry = Some(fallback);
    Ok(path)
}
