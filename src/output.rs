//! Output formatting and persistence for port reports.
//!
//! Supports pretty-printing, staged JSON files, and CSV append.

use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;
use tracing::{debug, info};

use crate::error::Result;
use crate::render::artifact::StagedArtifact;
use crate::report::{PortReport, SummaryRow};

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &PortReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &PortReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes a report as pretty-printed JSON, replacing `path` only once the
/// whole document has been written.
pub fn write_json(path: impl AsRef<Path>, report: &PortReport) -> Result<()> {
    let mut artifact = StagedArtifact::new(path.as_ref())?;
    artifact.write_all(&serde_json::to_vec_pretty(report)?)?;
    artifact.commit()?;
    info!(path = %path.as_ref().display(), "Report JSON written");
    Ok(())
}

/// Appends a [`SummaryRow`] to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_summary_row(path: impl AsRef<Path>, row: &SummaryRow) -> Result<()> {
    let path = path.as_ref();
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV summary row");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(row)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertThresholds;
    use crate::records::VesselMovementRecord;
    use crate::report::ReportInputs;
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;

    fn sample_report() -> PortReport {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let movements: Vec<_> = (0..3)
            .map(|i| {
                let arrival = start + Duration::days(i);
                VesselMovementRecord::new(arrival, arrival + Duration::hours(20))
            })
            .collect();
        let inputs = ReportInputs {
            movements: &movements,
            containers: None,
            eoq: None,
        };
        PortReport::build(&inputs, &AlertThresholds::default()).unwrap()
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_report());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_report()).unwrap();
    }

    #[test]
    fn test_write_json_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_json(&path, &sample_report()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap())
            .unwrap();
        assert_eq!(value["vessel_count"], 3);
        assert_eq!(value["mean_turnaround_hours"], 20.0);
        assert!(value["dwell"].is_null());
    }

    #[test]
    fn test_append_summary_row_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let row = sample_report().summary_row();

        append_summary_row(&path, &row).unwrap();
        append_summary_row(&path, &row).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content
            .lines()
            .filter(|l| l.starts_with("generated_at"))
            .count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);
    }
}
