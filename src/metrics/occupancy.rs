//! Berth occupancy over the observation window.
//!
//! The window runs from the earliest arrival to the latest departure.
//! [`compute_berth_occupancy`] sums raw stay durations, so overlapping stays
//! are counted twice and the result can exceed 100%.
//! [`compute_merged_berth_occupancy`] measures the union of the stays instead.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};

use crate::error::{AnalysisError, Result};
use crate::records::{VesselMovementRecord, duration_seconds};

const OPERATION: &str = "compute_berth_occupancy";
const MERGED_OPERATION: &str = "compute_merged_berth_occupancy";

fn observation_window(
    records: &[VesselMovementRecord],
    operation: &'static str,
) -> Result<Duration> {
    if records.is_empty() {
        return Err(AnalysisError::validation(
            operation,
            "dataset contains no vessel movements",
        ));
    }

    if let Some((idx, record)) = records
        .iter()
        .enumerate()
        .find(|(_, r)| r.departure_time < r.arrival_time)
    {
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

    let first_arrival = records.iter().map(|r| r.arrival_time).min();
    let last_departure = records.iter().map(|r| r.departure_time).max();
    let window = match (first_arrival, last_departure) {
        (Some(start), Some(end)) => end - start,
        _ => Duration::zero(),
    };

    if duration_seconds(window) <= 0.0 {
        return Err(AnalysisError::arithmetic(
            operation,
            "observation window has zero length",
        ));
    }

    Ok(window)
}

fn percentage(occupied: Duration, window: Duration, operation: &'static str) -> Result<f64> {
    let pct = duration_seconds(occupied) / duration_seconds(window) * 100.0;
    if !pct.is_finite() {
        return Err(AnalysisError::arithmetic(
            operation,
            format!("occupancy ratio is not finite ({pct})"),
        ));
    }
    Ok(pct)
}

/// Occupied time as a percentage of the observation window, using the
/// naive sum of every stay.
///
/// # Errors
///
/// `Validation` on an empty dataset or an inverted stay, `Arithmetic` when the
/// observation window has zero length.
#[tracing::instrument(skip_all, fields(vessels = records.len()))]
pub fn compute_berth_occupancy(records: &[VesselMovementRecord]) -> Result<f64> {
    summed_occupancy(records)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Berth occupancy failed"))
}

fn summed_occupancy(records: &[VesselMovementRecord]) -> Result<f64> {
    let window = observation_window(records, OPERATION)?;
    let occupied = records
        .iter()
        .fold(Duration::zero(), |acc, r| acc + r.turnaround());

    let pct = percentage(occupied, window, OPERATION)?;
    info!(
        window_hours = duration_seconds(window) / 3600.0,
        occupied_hours = duration_seconds(occupied) / 3600.0,
        occupancy_percent = pct,
        "Berth occupancy computed"
    );
    Ok(pct)
}

/// Occupancy measured over the union of the stays, so overlapping vessels
/// are counted once. Never exceeds 100%.
///
/// # Errors
///
/// Same conditions as [`compute_berth_occupancy`].
#[tracing::instrument(skip_all, fields(vessels = records.len()))]
pub fn compute_merged_berth_occupancy(records: &[VesselMovementRecord]) -> Result<f64> {
    merged_occupancy(records).inspect_err(
        |e| error!(operation = MERGED_OPERATION, error = %e, "Merged berth occupancy failed"),
    )
}

fn merged_occupancy(records: &[VesselMovementRecord]) -> Result<f64> {
    let window = observation_window(records, MERGED_OPERATION)?;

    let mut stays: Vec<(DateTime<Utc>, DateTime<Utc>)> = records
        .iter()
        .map(|r| (r.arrival_time, r.departure_time))
        .collect();
    stays.sort_by_key(|(start, _)| *start);

    let mut occupied = Duration::zero();
    let mut merged_intervals = 0usize;
    let mut current: Option<(DateTime<Utc>, DateTime<Utc>)> = None;

    for (start, end) in stays {
        current = match current {
            Some((cur_start, cur_end)) if start <= cur_end => Some((cur_start, cur_end.max(end))),
            Some((cur_start, cur_end)) => {
                occupied = occupied + (cur_end - cur_start);
                merged_intervals += 1;
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cur_start, cur_end)) = current {
        occupied = occupied + (cur_end - cur_start);
        merged_intervals += 1;
    }

    debug!(merged_intervals, "Stays merged");

    let pct = percentage(occupied, window, MERGED_OPERATION)?;
    info!(occupancy_percent = pct, "Merged berth occupancy computed");
    Ok(pct)
}
