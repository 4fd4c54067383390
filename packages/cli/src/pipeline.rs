//! Pipeline orchestration: fetch, clean, transform, filter, present.

use std::path::{Path, PathBuf};

use tornado_track_analysis::energy::EnergyModel;
use tornado_track_analysis::footprint::build_footprints;
use tornado_track_analysis::projection::LambertConformalConic;
use tornado_track_analysis_models::AnalysisReport;
use tornado_track_cli_utils::{IndicatifProgress, MultiProgress};
use tornado_track_generate::ExportedFiles;
use tornado_track_source::{RunContext, download, resolve_dataset};
use tornado_track_tornado_models::TornadoEvent;

use crate::config::PipelineConfig;

/// Enriched events plus the case-study report.
pub struct PipelineOutput {
    /// Every event in the record.
    pub events: Vec<TornadoEvent>,
    /// Case-study ranks and record summary.
    pub report: AnalysisReport,
    /// Projection the footprints were built in.
    pub projection: LambertConformalConic,
}

/// Downloads both archives into `dest` and extracts each next to it.
/// Returns the two shapefile paths (tracks, initial points).
///
/// # Errors
///
/// Returns an error if a download or extraction fails.
pub async fn fetch(
    config: &PipelineConfig,
    dest: &Path,
    multi: &MultiProgress,
) -> Result<(PathBuf, PathBuf), Box<dyn std::error::Error>> {
    let mut resolved = Vec::with_capacity(2);
    for (name, url) in [
        ("paths", &config.source.paths_url),
        ("points", &config.source.points_url),
    ] {
        let progress = IndicatifProgress::download_bar(multi, &format!("Fetching {name}"));
        let archive = download::fetch_archive(url, dest, progress.as_ref()).await?;
        let shapefile = resolve_dataset(&archive, &dest.join(name))?;
        log::info!("{name}: {}", shapefile.display());
        resolved.push(shapefile);
    }

    let points = resolved.pop().unwrap_or_default();
    let paths = resolved.pop().unwrap_or_default();
    Ok((paths, points))
}

/// Runs every stage up to and including the case-study comparison.
///
/// # Errors
///
/// Returns an error if acquisition, validation or any computation fails.
pub async fn run(
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<PipelineOutput, Box<dyn std::error::Error>> {
    let projection = LambertConformalConic::new(config.projection)?;

    log::info!("Stage 1/5: acquiring datasets");
    let context = RunContext::prepare(&config.source, |name| {
        IndicatifProgress::download_bar(multi, &format!("Fetching {name}"))
    })
    .await?;

    let read_progress = IndicatifProgress::records_bar(multi, "Reading datasets");
    let datasets = context.load(read_progress.as_ref())?;
    drop(context);

    log::info!("Stage 2-3/5: reconciling and deriving metrics");
    let model = EnergyModel::default();
    let mut events = tornado_track_analysis::prepare_events(
        datasets.paths,
        datasets.points,
        config.join,
        &model,
    )?;

    if config.footprints {
        log::info!("Stage 4/5: projecting and buffering tracks");
        log::debug!("Projection: {}", projection.parameters().proj_string());
        build_footprints(&mut events, &projection)?;
    } else {
        log::info!("Stage 4/5: skipped (footprints disabled)");
    }

    log::info!("Stage 5/5: ranking {}", config.case_study.label);
    let report = tornado_track_analysis::analyze(&events, &config.case_study)?;

    Ok(PipelineOutput {
        events,
        report,
        projection,
    })
}

/// Runs the pipeline and writes every export into `out_dir`.
///
/// # Errors
///
/// Returns an error if the pipeline or any export fails.
pub async fn export(
    config: &PipelineConfig,
    out_dir: &Path,
    multi: &MultiProgress,
) -> Result<ExportedFiles, Box<dyn std::error::Error>> {
    let output = run(config, multi).await?;
    let files = tornado_track_generate::export_all(
        &output.events,
        &output.report,
        &output.projection,
        out_dir,
    )?;
    Ok(files)
}

/// Prints the case-study ranks and per-rating totals.
pub fn print_report(report: &AnalysisReport) {
    let case = &report.case_study;
    println!(
        "{} ({}, {}, {})",
        case.label, case.key, case.magnitude, case.date
    );
    println!(
        "{:<20} {:>14} {:>10} {:>12} {:>11}",
        "METRIC", "VALUE", "AT/ABOVE", "UPPER TAIL", "PERCENTILE"
    );
    println!("{}", "-".repeat(71));
    for c in &case.comparisons {
        println!(
            "{:<20} {:>14.4e} {:>10} {:>11.3}% {:>11.2}",
            c.metric.as_ref(),
            c.value,
            c.at_or_above,
            c.upper_tail_pct,
            c.percentile_rank
        );
    }

    println!();
    println!(
        "{:<6} {:>8} {:>8} {:>11} {:>14}",
        "RATING", "EVENTS", "IMPUTED", "CASUALTIES", "MEAN ED"
    );
    println!("{}", "-".repeat(51));
    for s in &report.record.by_magnitude {
        println!(
            "{:<6} {:>8} {:>8} {:>11} {:>14.4e}",
            s.magnitude.as_ref(),
            s.count,
            s.imputed,
            s.casualties,
            s.mean_energy_dissipation
        );
    }
}
