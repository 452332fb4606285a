pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod records;
pub mod render;
pub mod report;
pub mod telemetry;

pub use error::{AnalysisError, Result};
pub use metrics::dwell::{DwellStats, analyze_dwell_times};
pub use metrics::eoq::compute_eoq;
pub use metrics::occupancy::{compute_berth_occupancy, compute_merged_berth_occupancy};
pub use metrics::turnaround::compute_turnaround_time;
pub use records::{ContainerDwellRecord, RouteSegmentRecord, VesselMovementRecord};
pub use render::histogram::render_histogram;
pub use render::route_map::render_route_map;
