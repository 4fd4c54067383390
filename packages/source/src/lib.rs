#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Acquisition of the SPC tornado track datasets.
//!
//! The Storm Prediction Center publishes the 1950-2017 tornado record as
//! two zipped shapefiles: one with the track of every tornado
//! (`aspath`) and one with its initial touchdown point (`initpoint`). This
//! crate downloads and extracts them into a scratch directory that is
//! removed when the [`RunContext`] is dropped, or reads pre-supplied
//! shapefiles or `GeoJSON` files, and turns every feature into a
//! [`RawTornadoRecord`].

pub mod archive;
pub mod attributes;
pub mod download;
pub mod geojson_input;
pub mod progress;
pub mod scratch;
pub mod shapefile_input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tornado_track_tornado_models::RawTornadoRecord;

use crate::progress::ProgressCallback;
use crate::scratch::ScratchDir;

/// Default URL of the zipped track shapefile.
pub const DEFAULT_PATHS_URL: &str =
    "https://www.spc.noaa.gov/gis/svrgis/zipped/1950-2017-torn-aspath.zip";

/// Default URL of the zipped initial-point shapefile.
pub const DEFAULT_POINTS_URL: &str =
    "https://www.spc.noaa.gov/gis/svrgis/zipped/1950-2017-torn-initpoint.zip";

/// Errors that can occur while acquiring the datasets.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error on a local file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Zip archive could not be read or extracted.
    #[error("Zip error in {path}: {source}")]
    Zip {
        /// Archive path.
        path: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// Shapefile could not be read.
    #[error("Shapefile error in {path}: {source}")]
    Shapefile {
        /// Shapefile path.
        path: String,
        /// Underlying shapefile error.
        source: shapefile::Error,
    },

    /// `GeoJSON` file could not be parsed.
    #[error("GeoJSON error in {path}: {message}")]
    GeoJson {
        /// File path.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// An extracted archive contained no `.shp` file.
    #[error("No shapefile found under {0}")]
    MissingShapefile(String),

    /// A feature is missing a required attribute or has an unreadable one.
    #[error("Feature {index} in {path}: attribute {field} {message}")]
    Attribute {
        /// File path.
        path: String,
        /// Zero-based feature index.
        index: usize,
        /// Attribute name.
        field: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The input path has an extension this crate cannot read.
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),
}

impl AcquisitionError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Where the two datasets come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSettings {
    /// URL of the zipped track shapefile.
    #[serde(default = "default_paths_url")]
    pub paths_url: String,
    /// URL of the zipped initial-point shapefile.
    #[serde(default = "default_points_url")]
    pub points_url: String,
    /// Pre-supplied datasets. When set, nothing is downloaded.
    #[serde(default)]
    pub local: Option<LocalDatasets>,
    /// Directory that keeps downloaded archives between runs. Without it,
    /// archives live in a scratch directory removed at the end of the run.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_paths_url() -> String {
    DEFAULT_PATHS_URL.to_string()
}

fn default_points_url() -> String {
    DEFAULT_POINTS_URL.to_string()
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            paths_url: default_paths_url(),
            points_url: default_points_url(),
            local: None,
            cache_dir: None,
        }
    }
}

/// Local dataset files (`.shp`, `.geojson`/`.json` or `.zip`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocalDatasets {
    /// Track dataset.
    pub paths: PathBuf,
    /// Initial-point dataset.
    pub points: PathBuf,
}

/// Both datasets, read in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TornadoDatasets {
    /// One record per tornado with its track geometry.
    pub paths: Vec<RawTornadoRecord>,
    /// One record per tornado with its initial-point geometry.
    pub points: Vec<RawTornadoRecord>,
}

/// Resolved input files for one run.
///
/// Owns the scratch directory holding downloaded and extracted files;
/// dropping the context removes it.
#[derive(Debug)]
pub struct RunContext {
    paths_file: PathBuf,
    points_file: PathBuf,
    _scratch: ScratchDir,
}

impl RunContext {
    /// Resolves the dataset files, downloading and extracting them if the
    /// settings do not point at local files.
    ///
    /// `progress_for` is called once per archive that has to be fetched,
    /// with the dataset name (`paths` or `points`), and the returned
    /// progress is finished when that archive is in place.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] if a download, extraction or file
    /// lookup fails. Any scratch files created so far are removed.
    pub async fn prepare<F>(
        settings: &SourceSettings,
        progress_for: F,
    ) -> Result<Self, AcquisitionError>
    where
        F: Fn(&str) -> Arc<dyn ProgressCallback>,
    {
        let scratch = ScratchDir::create()?;

        let (paths_input, points_input) = if let Some(local) = &settings.local {
            log::info!(
                "Using local datasets {} and {}",
                local.paths.display(),
                local.points.display()
            );
            (local.paths.clone(), local.points.clone())
        } else {
            let archive_dir = settings
                .cache_dir
                .clone()
                .unwrap_or_else(|| scratch.path().join("archives"));
            let paths_progress = progress_for("paths");
            let paths =
                download::fetch_archive(&settings.paths_url, &archive_dir, paths_progress.as_ref())
                    .await?;
            let points_progress = progress_for("points");
            let points = download::fetch_archive(
                &settings.points_url,
                &archive_dir,
                points_progress.as_ref(),
            )
            .await?;
            (paths, points)
        };

        let paths_file = resolve_dataset(&paths_input, &scratch.path().join("paths"))?;
        let points_file = resolve_dataset(&points_input, &scratch.path().join("points"))?;

        Ok(Self {
            paths_file,
            points_file,
            _scratch: scratch,
        })
    }

    /// The resolved track dataset file.
    #[must_use]
    pub fn paths_file(&self) -> &Path {
        &self.paths_file
    }

    /// The resolved initial-point dataset file.
    #[must_use]
    pub fn points_file(&self) -> &Path {
        &self.points_file
    }

    /// Reads both datasets into memory.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] if either file cannot be parsed.
    pub fn load(
        &self,
        progress: &dyn ProgressCallback,
    ) -> Result<TornadoDatasets, AcquisitionError> {
        progress.set_message("Reading track dataset".to_string());
        let paths = read_dataset(&self.paths_file, progress)?;
        progress.set_message("Reading initial-point dataset".to_string());
        let points = read_dataset(&self.points_file, progress)?;
        progress.finish(format!(
            "Read {} tracks and {} initial points",
            paths.len(),
            points.len()
        ));

        Ok(TornadoDatasets { paths, points })
    }
}

/// Turns an input path into a readable dataset file, extracting `.zip`
/// archives into `extract_dir`.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if extraction fails or the archive has no
/// shapefile.
pub fn resolve_dataset(input: &Path, extract_dir: &Path) -> Result<PathBuf, AcquisitionError> {
    match extension(input).as_deref() {
        Some("zip") => {
            archive::extract(input, extract_dir)?;
            archive::find_shapefile(extract_dir)
        }
        Some("shp" | "geojson" | "json") => Ok(input.to_path_buf()),
        _ => Err(AcquisitionError::UnsupportedFormat(
            input.display().to_string(),
        )),
    }
}

/// Reads one dataset, picking the reader by file extension.
///
/// # Errors
///
/// Returns [`AcquisitionError`] if the format is unsupported or the file
/// cannot be parsed.
pub fn read_dataset(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<Vec<RawTornadoRecord>, AcquisitionError> {
    let records = match extension(path).as_deref() {
        Some("shp") => shapefile_input::read_records(path, progress)?,
        Some("geojson" | "json") => geojson_input::read_records(path, progress)?,
        _ => {
            return Err(AcquisitionError::UnsupportedFormat(
                path.display().to_string(),
            ));
        }
    };
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}
