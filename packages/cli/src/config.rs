//! Pipeline configuration, read from TOML.
//!
//! The built-in defaults live in `config/default.toml` and are embedded at
//! compile time via [`include_str!`]. A user file replaces them; any key it
//! leaves out keeps its built-in value.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tornado_track_analysis::projection::LccParameters;
use tornado_track_analysis::reconcile::JoinStrategy;
use tornado_track_analysis_models::CaseStudyFilter;
use tornado_track_source::SourceSettings;

/// The embedded default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Config file path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or has the wrong shape.
    #[error("Invalid config {path}: {source}")]
    Toml {
        /// Config file path, or `<built-in>`.
        path: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },
}

/// Everything one pipeline run needs to know.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where the datasets come from.
    pub source: SourceSettings,
    /// How the two datasets are paired.
    pub join: JoinStrategy,
    /// Projection used for footprints.
    pub projection: LccParameters,
    /// Whether to build footprints at all.
    pub footprints: bool,
    /// The event to rank.
    pub case_study: CaseStudyFilter,
    /// Output directory for exports.
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceSettings::default(),
            join: JoinStrategy::default(),
            projection: LccParameters::default(),
            footprints: true,
            case_study: CaseStudyFilter::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is invalid.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        })
    }

    /// Loads `path` if given, else the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::from_toml(DEFAULT_CONFIG, "<built-in>");
        };

        log::info!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text, &path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tornado_track_tornado_models::Magnitude;

    use super::*;

    #[test]
    fn embedded_default_matches_code_default() {
        let config = PipelineConfig::load(None).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.case_study.magnitude, Magnitude::Ef5);
        assert_eq!(
            config.case_study.date,
            NaiveDate::from_ymd_opt(1974, 4, 3).unwrap()
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            join = "keyed"

            [case_study]
            label = "Jarrell, TX"
            state = "TX"
            magnitude = "EF5"
            date = "1997-05-27"

            [source.local]
            paths = "tracks.geojson"
            points = "points.geojson"
            "#,
            "test.toml",
        )
        .unwrap();

        assert_eq!(config.join, JoinStrategy::Keyed);
        assert_eq!(config.case_study.state, "TX");
        assert_eq!(config.projection, LccParameters::default());
        assert_eq!(
            config.source.local.map(|l| l.paths),
            Some(PathBuf::from("tracks.geojson"))
        );
        assert!(config.footprints);
    }

    #[test]
    fn rejects_unknown_magnitude() {
        let err = PipelineConfig::from_toml(
            r#"
            [case_study]
            label = "x"
            state = "OH"
            magnitude = "F6"
            date = "1974-04-03"
            "#,
            "bad.toml",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/tornado.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
