//! Record types for the three dataset shapes.
//!
//! `Raw*` structs mirror CSV rows exactly as they arrive (every field is an
//! optional string); the validated records hold typed values and are what the
//! calculators consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vessel movement row as read from CSV. Column names are case-sensitive.
#[derive(Debug, Default, Deserialize)]
pub struct RawVesselMovement {
    #[serde(rename = "Arrival_Time")]
    pub(crate) arrival_time: Option<String>,
    #[serde(rename = "Departure_Time")]
    pub(crate) departure_time: Option<String>,
    pub(crate) vessel_id: Option<String>,
    pub(crate) vessel_type: Option<String>,
}

/// A container dwell row as read from CSV.
#[derive(Debug, Default, Deserialize)]
pub struct RawContainerDwell {
    pub(crate) dwell_time: Option<String>,
    pub(crate) container_id: Option<String>,
}

/// A route segment row as read from CSV.
#[derive(Debug, Default, Deserialize)]
pub struct RawRouteSegment {
    pub(crate) start_lat: Option<String>,
    pub(crate) start_lon: Option<String>,
    pub(crate) end_lat: Option<String>,
    pub(crate) end_lon: Option<String>,
}

/// One vessel's stay at berth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselMovementRecord {
    pub vessel_id: Option<String>,
    pub vessel_type: Option<String>,
    pub arrival_time: DateTime<Utc>,
    pub departure_time: DateTime<Utc>,
}

impl VesselMovementRecord {
    pub fn new(arrival_time: DateTime<Utc>, departure_time: DateTime<Utc>) -> Self {
        Self {
            vessel_id: None,
            vessel_type: None,
            arrival_time,
            departure_time,
        }
    }

    pub fn with_vessel_info(mut self, vessel_id: &str, vessel_type: &str) -> Self {
        self.vessel_id = Some(vessel_id.to_string());
        self.vessel_type = Some(vessel_type.to_string());
        self
    }

    /// Elapsed time at berth. Negative when the record violates
    /// `departure_time >= arrival_time`.
    pub fn turnaround(&self) -> chrono::Duration {
        self.departure_time - self.arrival_time
    }

    pub fn turnaround_hours(&self) -> f64 {
        duration_seconds(self.turnaround()) / 3600.0
    }
}

/// Exact length of a duration in seconds, keeping sub-second precision down
/// to the nanosecond.
pub(crate) fn duration_seconds(d: chrono::Duration) -> f64 {
    d.num_seconds() as f64 + f64::from(d.subsec_nanos()) * 1e-9
}

/// Hours a container spent in the yard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerDwellRecord {
    pub container_id: Option<String>,
    pub dwell_time: f64,
}

impl ContainerDwellRecord {
    pub fn new(dwell_time: f64) -> Self {
        Self {
            container_id: None,
            dwell_time,
        }
    }

    pub fn with_container_id(mut self, container_id: &str) -> Self {
        self.container_id = Some(container_id.to_string());
        self
    }
}

/// A single leg between two coordinates, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSegmentRecord {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

impl RouteSegmentRecord {
    pub fn new(start_lat: f64, start_lon: f64, end_lat: f64, end_lon: f64) -> Self {
        Self {
            start_lat,
            start_lon,
            end_lat,
            end_lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_turnaround_hours_fractional() {
        let arrival = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let departure = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap();
        let record = VesselMovementRecord::new(arrival, departure);

        assert_eq!(record.turnaround_hours(), 1.5);
    }

    #[test]
    fn test_turnaround_negative_when_departure_precedes_arrival() {
        let arrival = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let departure = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = VesselMovementRecord::new(arrival, departure);

        assert_eq!(record.turnaround_hours(), -24.0);
    }

    #[test]
    fn test_turnaround_hours_keeps_sub_millisecond_stays() {
        let arrival = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::microseconds(100);
        let departure = arrival + chrono::Duration::microseconds(500);
        let record = VesselMovementRecord::new(arrival, departure);

        let expected = 0.0005 / 3600.0;
        assert!(record.turnaround_hours() > 0.0);
        assert!((record.turnaround_hours() - expected).abs() < 1e-15);
    }

    #[test]
    fn test_with_vessel_info() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = VesselMovementRecord::new(t, t).with_vessel_info("VESSEL_0", "Tanker");

        assert_eq!(record.vessel_id.as_deref(), Some("VESSEL_0"));
        assert_eq!(record.vessel_type.as_deref(), Some("Tanker"));
    }
}
