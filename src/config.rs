use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::render::histogram::{DEFAULT_BIN_COUNT, HistogramOptions, MAX_BIN_COUNT};
use crate::render::route_map::{DEFAULT_ZOOM_LEVEL, RouteMapOptions};
use crate::render::tier::FrequencyThresholds;

/// Analysis settings, stored as a JSON object on disk. Every section and
/// field is optional:
/// ```json
/// {
///   "histogram": { "bin_count": 30 },
///   "route_map": { "zoom_level": 4, "frequency_thresholds": { "medium": 5, "high": 10 } },
///   "eoq_defaults": { "holding_cost": 2.0, "ordering_cost": 100.0 },
///   "thresholds": { "turnaround_hours": 48.0, "dwell_hours": 72.0,
///                   "berth_occupancy_percent": 80.0, "min_vessels_for_analysis": 10 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub histogram: HistogramConfig,
    pub route_map: RouteMapConfig,
    pub eoq_defaults: EoqDefaults,
    pub thresholds: AlertThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub bin_count: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bin_count: DEFAULT_BIN_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteMapConfig {
    pub zoom_level: u8,
    pub frequency_thresholds: FrequencyThresholds,
}

impl Default for RouteMapConfig {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM_LEVEL,
            frequency_thresholds: FrequencyThresholds::default(),
        }
    }
}

/// Fallback EOQ costs, used only when the caller supplies none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EoqDefaults {
    pub holding_cost: f64,
    pub ordering_cost: f64,
}

impl Default for EoqDefaults {
    fn default() -> Self {
        Self {
            holding_cost: 2.0,
            ordering_cost: 100.0,
        }
    }
}

/// Levels above which the report raises an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub turnaround_hours: f64,
    pub dwell_hours: f64,
    pub berth_occupancy_percent: f64,
    pub min_vessels_for_analysis: usize,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            turnaround_hours: 48.0,
            dwell_hours: 72.0,
            berth_occupancy_percent: 80.0,
            min_vessels_for_analysis: 10,
        }
    }
}

impl AnalysisConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        debug!(path = %path.as_ref().display(), "Analysis config loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        const OP: &str = "load_config";

        if !(1..=MAX_BIN_COUNT).contains(&self.histogram.bin_count) {
            return Err(AnalysisError::validation(
                OP,
                format!("histogram.bin_count must be between 1 and {MAX_BIN_COUNT}"),
            ));
        }
        self.route_map
            .frequency_thresholds
            .check()
            .map_err(|reason| AnalysisError::validation(OP, reason))?;
        if !(self.eoq_defaults.holding_cost.is_finite() && self.eoq_defaults.holding_cost > 0.0) {
            return Err(AnalysisError::validation(
                OP,
                "eoq_defaults.holding_cost must be > 0",
            ));
        }
        if !(self.eoq_defaults.ordering_cost.is_finite() && self.eoq_defaults.ordering_cost >= 0.0)
        {
            return Err(AnalysisError::validation(
                OP,
                "eoq_defaults.ordering_cost must be >= 0",
            ));
        }
        Ok(())
    }

    pub fn histogram_options(&self) -> HistogramOptions {
        HistogramOptions {
            bin_count: self.histogram.bin_count,
        }
    }

    pub fn route_map_options(&self) -> RouteMapOptions {
        RouteMapOptions {
            zoom_level: self.route_map.zoom_level,
            frequency_thresholds: self.route_map.frequency_thresholds,
        }
    }
}
