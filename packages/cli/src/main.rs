#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the tornado record case study.
//!
//! Uses `indicatif-log-bridge` (via [`tornado_track_cli_utils::init_logger`])
//! so download and read progress bars share the terminal with log lines.

mod config;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tornado_track_analysis_models::CaseStudyFilter;
use tornado_track_tornado_models::Magnitude;

use crate::config::PipelineConfig;

#[derive(Parser)]
#[command(
    name = "tornado_track",
    about = "Energy dissipation and casualty ranks of a historical tornado against the SPC record"
)]
struct Cli {
    /// TOML config file replacing the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and extract the SPC archives
    Fetch {
        /// Directory to keep the archives and extracted shapefiles in
        #[arg(long, default_value = "data")]
        dest: PathBuf,
    },
    /// Run the pipeline and print the case-study ranks
    Analyze {
        #[command(flatten)]
        case_study: CaseStudyArgs,
        /// Print the full report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline and write the scatter, map and report files
    Export {
        #[command(flatten)]
        case_study: CaseStudyArgs,
        /// Output directory (overrides `output_dir` from the config)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Overrides for the case-study filter.
#[derive(Args, Default)]
struct CaseStudyArgs {
    /// Display label for the event
    #[arg(long)]
    label: Option<String>,
    /// Two-letter state abbreviation (e.g. "OH")
    #[arg(long)]
    state: Option<String>,
    /// Rating, as a number (0-5) or "EF5"
    #[arg(long, value_parser = parse_magnitude)]
    magnitude: Option<Magnitude>,
    /// Date of the event (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl CaseStudyArgs {
    fn apply(self, filter: &mut CaseStudyFilter) {
        if let Some(label) = self.label {
            filter.label = label;
        }
        if let Some(state) = self.state {
            filter.state = state.to_ascii_uppercase();
        }
        if let Some(magnitude) = self.magnitude {
            filter.magnitude = magnitude;
        }
        if let Some(date) = self.date {
            filter.date = date;
        }
    }
}

fn parse_magnitude(value: &str) -> Result<Magnitude, String> {
    if let Ok(rating) = value.parse::<i32>() {
        return Magnitude::from_rating(rating).map_err(|e| e.to_string());
    }
    value
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| format!("invalid magnitude {value:?}: expected 0-5 or EF0-EF5"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tornado_track_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    let start = Instant::now();

    let command = cli.command.unwrap_or(Commands::Export {
        case_study: CaseStudyArgs::default(),
        out: None,
    });

    match command {
        Commands::Fetch { dest } => {
            let (paths, points) = pipeline::fetch(&config, &dest, &multi).await?;
            println!("paths  = {}", paths.display());
            println!("points = {}", points.display());
        }
        Commands::Analyze { case_study, json } => {
            case_study.apply(&mut config.case_study);
            let output = pipeline::run(&config, &multi).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output.report)?);
            } else {
                pipeline::print_report(&output.report);
            }
        }
        Commands::Export { case_study, out } => {
            case_study.apply(&mut config.case_study);
            let out_dir = out.unwrap_or_else(|| config.output_dir.clone());
            let files = pipeline::export(&config, &out_dir, &multi).await?;
            for path in [&files.scatter, &files.bubbles, &files.footprints, &files.report] {
                println!("{}", path.display());
            }
        }
    }

    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_accepts_number_or_name() {
        assert_eq!(parse_magnitude("5"), Ok(Magnitude::Ef5));
        assert_eq!(parse_magnitude("ef3"), Ok(Magnitude::Ef3));
        assert!(parse_magnitude("-9").is_err());
        assert!(parse_magnitude("F6").is_err());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let cli = Cli::try_parse_from([
            "tornado_track",
            "analyze",
            "--state",
            "ks",
            "--date",
            "1999-05-03",
        ])
        .unwrap();
        let Some(Commands::Analyze { case_study, json }) = cli.command else {
            panic!("expected analyze");
        };
        assert!(!json);

        let mut filter = CaseStudyFilter::default();
        case_study.apply(&mut filter);
        assert_eq!(filter.state, "KS");
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(1999, 5, 3).unwrap());
        assert_eq!(filter.label, "Xenia, OH");
        assert_eq!(filter.magnitude, Magnitude::Ef5);
    }

    #[test]
    fn no_subcommand_means_export() {
        let cli = Cli::try_parse_from(["tornado_track", "--config", "my.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
    }
}
