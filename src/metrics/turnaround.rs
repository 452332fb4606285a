//! Vessel turnaround time: hours between arrival and departure.

use std::collections::BTreeMap;

use tracing::{error, info};

use crate::error::{AnalysisError, Result};
use crate::metrics::utility::{mean, min_max};
use crate::records::VesselMovementRecord;

const OPERATION: &str = "compute_turnaround_time";
const UNKNOWN_TYPE: &str = "unknown";

/// Per-record turnaround in hours, failing on an empty dataset or any record
/// whose departure precedes its arrival.
pub(crate) fn turnaround_hours_for(
    records: &[VesselMovementRecord],
    operation: &'static str,
) -> Result<Vec<f64>> {
    if records.is_empty() {
        return Err(AnalysisError::validation(
            operation,
            "dataset contains no vessel movements",
        ));
    }

    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let hours = record.turnaround_hours();
            if hours < 0.0 {
                return Err(AnalysisError::validation(
                    operation,
                    format!(
                        "record {} departs at {} before arriving at {}",
                        idx + 1,
                        record.departure_time,
                        record.arrival_time
                    ),
                ));
            }
            Ok(hours)
        })
        .collect()
}

/// Turnaround hours for every record, in input order.
pub fn turnaround_hours(records: &[VesselMovementRecord]) -> Result<Vec<f64>> {
    turnaround_hours_for(records, "turnaround_hours")
}

/// Mean vessel turnaround time in hours.
///
/// # Errors
///
/// `Validation` if the dataset is empty or a record departs before it arrives.
#[tracing::instrument(skip_all, fields(vessels = records.len()))]
pub fn compute_turnaround_time(records: &[VesselMovementRecord]) -> Result<f64> {
    mean_turnaround(records)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Turnaround computation failed"))
}

fn mean_turnaround(records: &[VesselMovementRecord]) -> Result<f64> {
    let hours = turnaround_hours_for(records, OPERATION)?;
    let mean_hours = mean(&hours)
        .ok_or_else(|| AnalysisError::validation(OPERATION, "mean of an empty dataset"))?;

    if let Some((min_hours, max_hours)) = min_max(&hours) {
        info!(mean_hours, min_hours, max_hours, "Turnaround time computed");
    }

    Ok(mean_hours)
}

/// Mean turnaround per `vessel_type`. Records without a type are grouped
/// under `unknown`.
#[tracing::instrument(skip_all, fields(vessels = records.len()))]
pub fn turnaround_by_vessel_type(
    records: &[VesselMovementRecord],
) -> Result<BTreeMap<String, f64>> {
    let hours = turnaround_hours_for(records, "turnaround_by_vessel_type").inspect_err(
        |e| error!(operation = "turnaround_by_vessel_type", error = %e, "Grouping failed"),
    )?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (record, h) in records.iter().zip(hours) {
        let key = record.vessel_type.as_deref().unwrap_or(UNKNOWN_TYPE);
        groups.entry(key.to_string()).or_default().push(h);
    }

    let means: BTreeMap<String, f64> = groups
        .into_iter()
        .filter_map(|(vessel_type, series)| mean(&series).map(|m| (vessel_type, m)))
        .collect();

    info!(types = means.len(), "Turnaround by vessel type computed");
    Ok(means)
}
