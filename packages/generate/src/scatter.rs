//! Energy dissipation vs. casualties scatter series.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tornado_track_analysis_models::CaseStudyReport;
use tornado_track_tornado_models::TornadoEvent;

use crate::GenerateError;

/// One point of the scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterRow {
    /// Event key, `<year>-<om>`.
    pub event: String,
    /// Calendar date.
    pub date: NaiveDate,
    /// Estimated energy dissipation (x axis, log scale).
    pub energy_dissipation: f64,
    /// Injuries plus fatalities (y axis, log scale).
    pub casualties: u32,
    /// Set on the case-study row only.
    pub label: Option<String>,
}

/// Events in `state` with at least one casualty and a positive energy
/// dissipation, in record order. Both axes are logarithmic, so anything
/// else cannot be plotted.
#[must_use]
pub fn scatter_series(
    events: &[TornadoEvent],
    state: &str,
    case: &CaseStudyReport,
) -> Vec<ScatterRow> {
    events
        .iter()
        .filter(|e| e.state.eq_ignore_ascii_case(state))
        .filter(|e| e.casualties > 0 && e.energy_dissipation > 0.0)
        .map(|e| ScatterRow {
            event: e.key.to_string(),
            date: e.date(),
            energy_dissipation: e.energy_dissipation,
            casualties: e.casualties,
            label: (e.key == case.key).then(|| case.label.clone()),
        })
        .collect()
}

/// Writes the series as CSV with a header row.
///
/// # Errors
///
/// Returns [`GenerateError`] if the file cannot be written.
pub fn write_scatter_csv(rows: &[ScatterRow], path: &Path) -> Result<(), GenerateError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| GenerateError::io(path, e))?;

    log::info!("Wrote {} scatter rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{case_report, event};

    #[test]
    fn keeps_in_state_events_with_casualties() {
        let events = vec![
            event(73, "OH", 1.0e9, 1184, "1974-04-03"),
            event(74, "OH", 5.0e6, 0, "1974-04-03"),
            event(75, "IN", 8.0e8, 40, "1974-04-03"),
            event(10, "OH", 2.0e7, 3, "1980-06-01"),
        ];
        let case = case_report(73);

        let rows = scatter_series(&events, "oh", &case);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event, "1974-73");
        assert_eq!(rows[0].label.as_deref(), Some("Xenia, OH"));
        assert_eq!(rows[1].event, "1980-10");
        assert_eq!(rows[1].label, None);
    }

    #[test]
    fn drops_non_positive_energy() {
        let events = vec![event(1, "OH", 0.0, 5, "1990-05-01")];
        assert!(scatter_series(&events, "OH", &case_report(73)).is_empty());
    }

    #[test]
    fn csv_has_header_and_label() {
        let dir = std::env::temp_dir().join(format!("tornado_scatter_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scatter_OH.csv");

        let events = vec![event(73, "OH", 1.5e9, 1184, "1974-04-03")];
        let rows = scatter_series(&events, "OH", &case_report(73));
        write_scatter_csv(&rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("event,date,energy_dissipation,casualties,label")
        );
        assert_eq!(
            lines.next(),
            Some("1974-73,1974-04-03,1500000000.0,1184,\"Xenia, OH\"")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
