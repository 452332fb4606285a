//! Interactive route map written as a standalone HTML page.
//!
//! Routes are grouped by their exact `(start_lat, start_lon, end_lat, end_lon)`
//! values. Coordinates that differ only by measurement noise stay separate
//! routes, which callers should keep in mind when feeding raw GPS fixes.

use std::collections::HashMap;
use std::path::Path;

use plotly::common::{Line, Mode};
use plotly::layout::{Center, DragMode, Mapbox, MapboxStyle, Margin};
use plotly::{Layout, Plot, ScatterMapbox};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{AnalysisError, Result};
use crate::records::RouteSegmentRecord;
use crate::render::artifact::StagedArtifact;
use crate::render::tier::{FrequencyThresholds, FrequencyTier};

const OPERATION: &str = "render_route_map";

pub const DEFAULT_ROUTE_MAP_PATH: &str = "route_map.html";
pub const DEFAULT_ZOOM_LEVEL: u8 = 4;
pub const LINE_WEIGHT: f64 = 2.0;
pub const LINE_OPACITY: f64 = 0.8;

/// A distinct route with how often it occurs in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGroup {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub count: usize,
    pub tier: FrequencyTier,
}

impl RouteGroup {
    pub fn label(&self) -> String {
        format!("Frequency {} ({})", self.count, self.tier.label())
    }
}

/// Settings for [`render_route_map`].
#[derive(Debug, Clone, Copy)]
pub struct RouteMapOptions {
    pub zoom_level: u8,
    pub frequency_thresholds: FrequencyThresholds,
}

impl Default for RouteMapOptions {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM_LEVEL,
            frequency_thresholds: FrequencyThresholds::default(),
        }
    }
}

// -0.0 and 0.0 are the same coordinate
fn coordinate_key(v: f64) -> u64 {
    if v == 0.0 { 0 } else { v.to_bits() }
}

fn validate_routes(records: &[RouteSegmentRecord], operation: &'static str) -> Result<()> {
    if records.is_empty() {
        return Err(AnalysisError::validation(
            operation,
            "dataset contains no route segments",
        ));
    }

    for (idx, r) in records.iter().enumerate() {
        let lat_ok = |v: f64| v.is_finite() && (-90.0..=90.0).contains(&v);
        let lon_ok = |v: f64| v.is_finite() && (-180.0..=180.0).contains(&v);
        if !(lat_ok(r.start_lat) && lat_ok(r.end_lat) && lon_ok(r.start_lon) && lon_ok(r.end_lon))
        {
            return Err(AnalysisError::validation(
                operation,
                format!(
                    "record {} has malformed coordinates ({}, {}) -> ({}, {})",
                    idx + 1,
                    r.start_lat,
                    r.start_lon,
                    r.end_lat,
                    r.end_lon
                ),
            ));
        }
    }
    Ok(())
}

/// Merges identical routes, counts them and assigns a frequency tier. Groups
/// keep the order in which each route first appears.
pub fn group_routes(
    records: &[RouteSegmentRecord],
    thresholds: &FrequencyThresholds,
) -> Result<Vec<RouteGroup>> {
    validate_routes(records, "group_routes")?;
    thresholds
        .check()
        .map_err(|reason| AnalysisError::validation("group_routes", reason))?;

    let mut index: HashMap<[u64; 4], usize> = HashMap::new();
    let mut groups: Vec<RouteGroup> = Vec::new();

    for r in records {
        let key = [
            coordinate_key(r.start_lat),
            coordinate_key(r.start_lon),
            coordinate_key(r.end_lat),
            coordinate_key(r.end_lon),
        ];
        match index.get(&key) {
            Some(&i) => groups[i].count += 1,
            None => {
                index.insert(key, groups.len());
                groups.push(RouteGroup {
                    start_lat: r.start_lat,
                    start_lon: r.start_lon,
                    end_lat: r.end_lat,
                    end_lon: r.end_lon,
                    count: 1,
                    tier: FrequencyTier::Low,
                });
            }
        }
    }

    for group in &mut groups {
        group.tier = FrequencyTier::classify(group.count, thresholds);
    }

    debug!(
        records = records.len(),
        distinct = groups.len(),
        "Routes grouped"
    );
    Ok(groups)
}

/// Mean latitude and longitude over both endpoints of every individual
/// record, so frequent routes pull the centre towards themselves.
pub fn map_center(records: &[RouteSegmentRecord]) -> Result<(f64, f64)> {
    validate_routes(records, "map_center")?;

    let n = (records.len() * 2) as f64;
    let lat = records.iter().map(|r| r.start_lat + r.end_lat).sum::<f64>() / n;
    let lon = records.iter().map(|r| r.start_lon + r.end_lon).sum::<f64>() / n;
    Ok((lat, lon))
}

fn build_plot(groups: &[RouteGroup], center: (f64, f64), zoom_level: u8) -> Plot {
    let mut plot = Plot::new();

    for group in groups {
        let label = group.label();
        let trace = ScatterMapbox::new(
            vec![group.start_lat, group.end_lat],
            vec![group.start_lon, group.end_lon],
        )
        .name(label.as_str())
        .mode(Mode::Lines)
        .line(Line::new().width(LINE_WEIGHT).color(group.tier.color()))
        .opacity(LINE_OPACITY)
        .show_legend(true);
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .drag_mode(DragMode::Zoom)
        .margin(Margin::new().top(0).left(0).bottom(0).right(0))
        .mapbox(
            Mapbox::new()
                .style(MapboxStyle::OpenStreetMap)
                .center(Center::new(center.0, center.1))
                .zoom(zoom_level),
        );
    plot.set_layout(layout);

    plot
}

/// Draws one polyline per distinct route, coloured by frequency tier, on a
/// map centred on the mean coordinate, and writes the page to `output_path`.
///
/// # Errors
///
/// `Validation` for an empty dataset, out-of-range coordinates or unusable
/// thresholds, `Io` when the page cannot be written. Nothing is left at
/// `output_path` on failure.
#[tracing::instrument(skip_all, fields(routes = records.len(), output = %output_path.as_ref().display()))]
pub fn render_route_map(
    records: &[RouteSegmentRecord],
    output_path: impl AsRef<Path>,
    options: &RouteMapOptions,
) -> Result<()> {
    write_map(records, output_path.as_ref(), options)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Route map render failed"))
}

fn write_map(
    records: &[RouteSegmentRecord],
    output_path: &Path,
    options: &RouteMapOptions,
) -> Result<()> {
    let groups = group_routes(records, &options.frequency_thresholds)?;
    let center = map_center(records)?;
    let plot = build_plot(&groups, center, options.zoom_level);

    let mut artifact = StagedArtifact::new(output_path)?;
    artifact.write_all(plot.to_html().as_bytes())?;
    let written = artifact.commit()?;

    let count_tier = |tier: FrequencyTier| groups.iter().filter(|g| g.tier == tier).count();
    info!(
        path = %written.display(),
        distinct_routes = groups.len(),
        low = count_tier(FrequencyTier::Low),
        medium = count_tier(FrequencyTier::Medium),
        high = count_tier(FrequencyTier::High),
        center_lat = center.0,
        center_lon = center.1,
        zoom = options.zoom_level,
        "Route map written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_routes() -> Vec<RouteSegmentRecord> {
        vec![
            RouteSegmentRecord::new(40.7128, -74.0060, 34.0522, -118.2437),
            RouteSegmentRecord::new(34.0522, -118.2437, 51.5074, -0.1278),
            RouteSegmentRecord::new(51.5074, -0.1278, 40.7128, -74.0060),
        ]
    }

    #[test]
    fn test_identical_routes_merge() {
        let mut routes = sample_routes();
        routes.push(routes[0]);

        let groups = group_routes(&routes, &FrequencyThresholds::default()).unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].tier, FrequencyTier::Low);
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_merged_pair_tiered_by_thresholds() {
        let route = RouteSegmentRecord::new(1.0, 2.0, 3.0, 4.0);
        let thresholds = FrequencyThresholds { medium: 2, high: 3 };

        let groups = group_routes(&[route, route], &thresholds).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].tier, FrequencyTier::Medium);
    }

    #[test]
    fn test_near_duplicates_stay_distinct() {
        let a = RouteSegmentRecord::new(1.0, 2.0, 3.0, 4.0);
        let b = RouteSegmentRecord::new(1.0000001, 2.0, 3.0, 4.0);

        let groups = group_routes(&[a, b], &FrequencyThresholds::default()).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_reversed_route_is_distinct() {
        let a = RouteSegmentRecord::new(1.0, 2.0, 3.0, 4.0);
        let b = RouteSegmentRecord::new(3.0, 4.0, 1.0, 2.0);

        let groups = group_routes(&[a, b], &FrequencyThresholds::default()).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_high_tier() {
        let route = RouteSegmentRecord::new(10.0, 20.0, 30.0, 40.0);
        let routes = vec![route; 10];

        let groups = group_routes(&routes, &FrequencyThresholds::default()).unwrap();
        assert_eq!(groups[0].tier, FrequencyTier::High);
    }

    #[test]
    fn test_center_weights_every_record() {
        let a = RouteSegmentRecord::new(0.0, 0.0, 10.0, 10.0);
        let b = RouteSegmentRecord::new(20.0, 20.0, 30.0, 30.0);

        // a appears three times, so the centre leans towards it
        let (lat, lon) = map_center(&[a, a, a, b]).unwrap();
        assert!((lat - 10.0).abs() < 1e-12);
        assert!((lon - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_coordinates_rejected() {
        let bad = RouteSegmentRecord::new(f64::NAN, 0.0, 0.0, 0.0);
        assert!(group_routes(&[bad], &FrequencyThresholds::default()).is_err());

        let bad = RouteSegmentRecord::new(0.0, 181.0, 0.0, 0.0);
        assert!(map_center(&[bad]).is_err());
    }

    #[test]
    fn test_render_writes_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route_map.html");
        let mut routes = sample_routes();
        routes.push(routes[1]);

        render_route_map(&routes, &path, &RouteMapOptions::default()).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("scattermapbox"));
        assert!(html.contains("Frequency 2 (low)"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_render_empty_dataset_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route_map.html");

        let err = render_route_map(&[], &path, &RouteMapOptions::default()).unwrap_err();

        assert!(matches!(err, AnalysisError::Validation { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_render_rejects_inverted_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route_map.html");
        let options = RouteMapOptions {
            frequency_thresholds: FrequencyThresholds { medium: 8, high: 3 },
            ..Default::default()
        };

        assert!(render_route_map(&sample_routes(), &path, &options).is_err());
        assert!(!path.exists());
    }
}
