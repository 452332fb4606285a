//! CSV readers and field coercion for port datasets.
//!
//! Every raw field passes through an explicit parse function returning either
//! a typed value or a [`FieldError`] before any arithmetic happens.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::{AnalysisError, FieldError, Result};
use crate::records::{
    ContainerDwellRecord, RawContainerDwell, RawRouteSegment, RawVesselMovement,
    RouteSegmentRecord, VesselMovementRecord,
};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

fn required<'a>(
    column: &'static str,
    value: Option<&'a str>,
) -> std::result::Result<&'a str, FieldError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FieldError::Missing { column }),
    }
}

/// Parses an ISO-8601 timestamp. Values without an offset are taken as UTC,
/// and a bare date means midnight.
pub fn parse_timestamp(
    column: &'static str,
    value: Option<&str>,
) -> std::result::Result<DateTime<Utc>, FieldError> {
    let raw = required(column, value)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(FieldError::Malformed {
        column,
        value: raw.to_string(),
    })
}

/// Parses a finite real number.
pub fn parse_number(
    column: &'static str,
    value: Option<&str>,
) -> std::result::Result<f64, FieldError> {
    let raw = required(column, value)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(FieldError::Malformed {
            column,
            value: raw.to_string(),
        }),
    }
}

fn parse_in_range(
    column: &'static str,
    value: Option<&str>,
    min: f64,
    max: f64,
    range: &'static str,
) -> std::result::Result<f64, FieldError> {
    let v = parse_number(column, value)?;
    if v < min || v > max {
        return Err(FieldError::OutOfRange { column, value: v, range });
    }
    Ok(v)
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Converts a raw CSV row into a validated [`VesselMovementRecord`].
pub fn vessel_movement_from_raw(
    raw: RawVesselMovement,
) -> std::result::Result<VesselMovementRecord, FieldError> {
    let arrival_time = parse_timestamp("Arrival_Time", raw.arrival_time.as_deref())?;
    let departure_time = parse_timestamp("Departure_Time", raw.departure_time.as_deref())?;

    if departure_time < arrival_time {
        return Err(FieldError::Malformed {
            column: "Departure_Time",
            value: format!("{departure_time} precedes arrival {arrival_time}"),
        });
    }

    Ok(VesselMovementRecord {
        vessel_id: optional_text(raw.vessel_id),
        vessel_type: optional_text(raw.vessel_type),
        arrival_time,
        departure_time,
    })
}

/// Converts a raw CSV row into a validated [`ContainerDwellRecord`].
pub fn container_dwell_from_raw(
    raw: RawContainerDwell,
) -> std::result::Result<ContainerDwellRecord, FieldError> {
    let dwell_time = parse_in_range(
        "dwell_time",
        raw.dwell_time.as_deref(),
        0.0,
        f64::INFINITY,
        "[0, inf)",
    )?;

    Ok(ContainerDwellRecord {
        container_id: optional_text(raw.container_id),
        dwell_time,
    })
}

/// Converts a raw CSV row into a validated [`RouteSegmentRecord`].
pub fn route_segment_from_raw(
    raw: RawRouteSegment,
) -> std::result::Result<RouteSegmentRecord, FieldError> {
    let lat = |column: &'static str, value: Option<String>| {
        parse_in_range(column, value.as_deref(), -90.0, 90.0, "[-90, 90]")
    };
    let lon = |column: &'static str, value: Option<String>| {
        parse_in_range(column, value.as_deref(), -180.0, 180.0, "[-180, 180]")
    };

    Ok(RouteSegmentRecord {
        start_lat: lat("start_lat", raw.start_lat)?,
        start_lon: lon("start_lon", raw.start_lon)?,
        end_lat: lat("end_lat", raw.end_lat)?,
        end_lon: lon("end_lon", raw.end_lon)?,
    })
}

fn read_rows<R, Raw, T>(
    reader: R,
    operation: &'static str,
    convert: fn(Raw) -> std::result::Result<T, FieldError>,
) -> Result<Vec<T>>
where
    R: Read,
    Raw: DeserializeOwned,
{
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (idx, result) in rdr.deserialize::<Raw>().enumerate() {
        let raw = result.inspect_err(|e| error!(operation, error = %e, "Malformed CSV row"))?;
        let record = convert(raw).map_err(|e| {
            let err = e.at_row(operation, idx + 1);
            error!(operation, error = %err, "Row failed validation");
            err
        })?;
        records.push(record);
    }

    debug!(operation, rows = records.len(), "Dataset parsed");
    Ok(records)
}

pub fn read_vessel_movements<R: Read>(reader: R) -> Result<Vec<VesselMovementRecord>> {
    read_rows(reader, "read_vessel_movements", vessel_movement_from_raw)
}

pub fn read_container_dwell<R: Read>(reader: R) -> Result<Vec<ContainerDwellRecord>> {
    read_rows(reader, "read_container_dwell", container_dwell_from_raw)
}

pub fn read_route_segments<R: Read>(reader: R) -> Result<Vec<RouteSegmentRecord>> {
    read_rows(reader, "read_route_segments", route_segment_from_raw)
}

fn open_dataset(path: &Path, operation: &'static str) -> Result<File> {
    File::open(path).map_err(|e| {
        error!(operation, path = %path.display(), error = %e, "Failed to open dataset");
        AnalysisError::from(e)
    })
}

pub fn load_vessel_movements(path: impl AsRef<Path>) -> Result<Vec<VesselMovementRecord>> {
    read_vessel_movements(open_dataset(path.as_ref(), "load_vessel_movements")?)
}

pub fn load_container_dwell(path: impl AsRef<Path>) -> Result<Vec<ContainerDwellRecord>> {
    read_container_dwell(open_dataset(path.as_ref(), "load_container_dwell")?)
}

pub fn load_route_segments(path: impl AsRef<Path>) -> Result<Vec<RouteSegmentRecord>> {
    read_route_segments(open_dataset(path.as_ref(), "load_route_segments")?)
}
