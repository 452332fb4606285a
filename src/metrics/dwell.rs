//! Container dwell time distribution.

use serde::Serialize;
use tracing::{error, info};

use crate::error::{AnalysisError, Result};
use crate::metrics::utility::{mean, median, min_max, sample_stddev};
use crate::records::ContainerDwellRecord;

const OPERATION: &str = "analyze_dwell_times";

/// Distribution statistics for dwell durations, all in hours.
///
/// `std_dev` is the sample standard deviation (divisor `n - 1`) and is `NaN`
/// for a single-record dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DwellStats {
    pub median: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Computes median, mean, sample standard deviation, min and max of the
/// dwell times.
///
/// # Errors
///
/// `Validation` on an empty dataset or a negative or non-finite dwell time.
#[tracing::instrument(skip_all, fields(containers = records.len()))]
pub fn analyze_dwell_times(records: &[ContainerDwellRecord]) -> Result<DwellStats> {
    let values = dwell_values(records)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Dwell analysis failed"))?;
    let stats = analyze_dwell_values(&values)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Dwell analysis failed"))?;

    info!(
        median = stats.median,
        mean = stats.mean,
        std_dev = stats.std_dev,
        min = stats.min,
        max = stats.max,
        "Dwell time statistics computed"
    );
    Ok(stats)
}

fn dwell_values(records: &[ContainerDwellRecord]) -> Result<Vec<f64>> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let v = record.dwell_time;
            if !v.is_finite() || v < 0.0 {
                return Err(AnalysisError::validation(
                    OPERATION,
                    format!("record {} has invalid dwell_time {v}", idx + 1),
                ));
            }
            Ok(v)
        })
        .collect()
}

fn analyze_dwell_values(values: &[f64]) -> Result<DwellStats> {
    let empty = || AnalysisError::validation(OPERATION, "dataset contains no dwell times");

    let mean = mean(values).ok_or_else(empty)?;
    let median = median(values).ok_or_else(empty)?;
    let (min, max) = min_max(values).ok_or_else(empty)?;

    Ok(DwellStats {
        median,
        mean,
        std_dev: sample_stddev(values, mean),
        min,
        max,
    })
}
