//! Combined port performance report with threshold alerts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AlertThresholds;
use crate::error::Result;
use crate::metrics::dwell::{DwellStats, analyze_dwell_times};
use crate::metrics::eoq::{EoqSummary, summarize_eoq};
use crate::metrics::occupancy::{compute_berth_occupancy, compute_merged_berth_occupancy};
use crate::metrics::turnaround::{
    compute_turnaround_time, turnaround_by_vessel_type, turnaround_hours,
};
use crate::records::{ContainerDwellRecord, VesselMovementRecord};

/// EOQ parameters for the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EoqInputs {
    pub demand_rate: f64,
    pub ordering_cost: f64,
    pub holding_cost: f64,
}

/// Datasets the report is built from. Containers and EOQ are optional
/// sections.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub movements: &'a [VesselMovementRecord],
    pub containers: Option<&'a [ContainerDwellRecord]>,
    pub eoq: Option<EoqInputs>,
}

#[derive(Debug, Serialize)]
pub struct PortReport {
    pub generated_at: DateTime<Utc>,
    pub vessel_count: usize,
    pub mean_turnaround_hours: f64,
    pub turnaround_by_vessel_type: BTreeMap<String, f64>,
    pub vessels_over_turnaround_threshold: usize,
    pub berth_occupancy_percent: f64,
    pub merged_berth_occupancy_percent: f64,
    pub container_count: Option<usize>,
    pub dwell: Option<DwellStats>,
    pub containers_over_dwell_threshold: Option<usize>,
    pub eoq: Option<EoqSummary>,
    pub alerts: Vec<String>,
}

/// One flat CSV row per report, for appending to a running log.
#[derive(Debug, Default, Serialize)]
pub struct SummaryRow {
    pub generated_at: DateTime<Utc>,
    pub vessel_count: usize,
    pub mean_turnaround_hours: f64,
    pub berth_occupancy_percent: f64,
    pub merged_berth_occupancy_percent: f64,
    pub dwell_median_hours: Option<f64>,
    pub dwell_mean_hours: Option<f64>,
    pub dwell_std_dev_hours: Option<f64>,
    pub eoq_order_quantity: Option<f64>,
    pub alert_count: usize,
}

impl PortReport {
    /// Runs every calculator over the inputs and evaluates alert thresholds.
    /// Any calculator failure aborts the report.
    #[tracing::instrument(skip_all, fields(vessels = inputs.movements.len()))]
    pub fn build(inputs: &ReportInputs<'_>, thresholds: &AlertThresholds) -> Result<Self> {
        let movements = inputs.movements;
        let mut alerts = Vec::new();

        let mean_turnaround_hours = compute_turnaround_time(movements)?;
        let by_type = turnaround_by_vessel_type(movements)?;
        let vessels_over = turnaround_hours(movements)?
            .into_iter()
            .filter(|h| *h > thresholds.turnaround_hours)
            .count();
        let occupancy = compute_berth_occupancy(movements)?;
        let merged_occupancy = compute_merged_berth_occupancy(movements)?;

        if movements.len() < thresholds.min_vessels_for_analysis {
            alerts.push(format!(
                "only {} vessel movements, fewer than the {} needed for a reliable analysis",
                movements.len(),
                thresholds.min_vessels_for_analysis
            ));
        }
        if vessels_over > 0 {
            alerts.push(format!(
                "{vessels_over} vessels exceeded the {} h turnaround threshold",
                thresholds.turnaround_hours
            ));
        }
        if occupancy > thresholds.berth_occupancy_percent {
            alerts.push(format!(
                "berth occupancy {occupancy:.1}% is above the {}% threshold",
                thresholds.berth_occupancy_percent
            ));
        }

        let (dwell, containers_over) = match inputs.containers {
            Some(containers) => {
                let stats = analyze_dwell_times(containers)?;
                let over = containers
                    .iter()
                    .filter(|c| c.dwell_time > thresholds.dwell_hours)
                    .count();
                if over > 0 {
                    alerts.push(format!(
                        "{over} containers exceeded the {} h dwell threshold",
                        thresholds.dwell_hours
                    ));
                }
                (Some(stats), Some(over))
            }
            None => (None, None),
        };

        let eoq = inputs
            .eoq
            .map(|p| summarize_eoq(p.demand_rate, p.ordering_cost, p.holding_cost))
            .transpose()?;

        for alert in &alerts {
            warn!(alert = %alert, "Threshold alert");
        }
        info!(alerts = alerts.len(), "Port report built");

        Ok(Self {
            generated_at: Utc::now(),
            vessel_count: movements.len(),
            mean_turnaround_hours,
            turnaround_by_vessel_type: by_type,
            vessels_over_turnaround_threshold: vessels_over,
            berth_occupancy_percent: occupancy,
            merged_berth_occupancy_percent: merged_occupancy,
            container_count: inputs.containers.map(<[ContainerDwellRecord]>::len),
            dwell,
            containers_over_dwell_threshold: containers_over,
            eoq,
            alerts,
        })
    }

    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            generated_at: self.generated_at,
            vessel_count: self.vessel_count,
            mean_turnaround_hours: self.mean_turnaround_hours,
            berth_occupancy_percent: self.berth_occupancy_percent,
            merged_berth_occupancy_percent: self.merged_berth_occupancy_percent,
            dwell_median_hours: self.dwell.map(|d| d.median),
            dwell_mean_hours: self.dwell.map(|d| d.mean),
            dwell_std_dev_hours: self.dwell.map(|d| d.std_dev),
            eoq_order_quantity: self.eoq.map(|e| e.order_quantity),
            alert_count: self.alerts.len(),
        }
    }
}
