use std::fs;

use port_analytics::config::AlertThresholds;
use port_analytics::metrics::turnaround::turnaround_by_vessel_type;
use port_analytics::parser::{
    load_container_dwell, load_route_segments, load_vessel_movements, read_vessel_movements,
};
use port_analytics::render::histogram::HistogramOptions;
use port_analytics::render::route_map::{RouteMapOptions, group_routes, map_center};
use port_analytics::render::tier::FrequencyTier;
use port_analytics::report::{EoqInputs, PortReport, ReportInputs};
use port_analytics::{
    analyze_dwell_times, compute_berth_occupancy, compute_eoq, compute_merged_berth_occupancy,
    compute_turnaround_time, render_histogram, render_route_map,
};

const VESSELS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/vessel_movements.csv");
const CONTAINERS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/container_dwell.csv");
const ROUTES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/routes.csv");

#[test]
fn test_vessel_pipeline() {
    let movements = load_vessel_movements(VESSELS).expect("Failed to load vessel movements");
    assert_eq!(movements.len(), 5);

    assert_eq!(compute_turnaround_time(&movements).unwrap(), 24.0);
    // back-to-back stays cover the whole window
    assert!((compute_berth_occupancy(&movements).unwrap() - 100.0).abs() < 1e-9);
    assert!((compute_merged_berth_occupancy(&movements).unwrap() - 100.0).abs() < 1e-9);

    let by_type = turnaround_by_vessel_type(&movements).unwrap();
    assert_eq!(by_type.len(), 3);
    assert_eq!(by_type["Container"], 24.0);
}

#[test]
fn test_container_pipeline() {
    let containers = load_container_dwell(CONTAINERS).expect("Failed to load containers");
    let stats = analyze_dwell_times(&containers).unwrap();

    assert_eq!(stats.median, 36.0);
    assert_eq!(stats.mean, 36.0);
    assert!((stats.std_dev - 360f64.sqrt()).abs() < 1e-9);
    assert_eq!(stats.min, 12.0);
    assert_eq!(stats.max, 60.0);
}

#[test]
fn test_eoq_reference_value() {
    let q = compute_eoq(1000.0, 100.0, 2.0).unwrap();
    assert!((q - 316.227766).abs() < 1e-5);
}

#[test]
fn test_route_grouping_and_center() {
    let routes = load_route_segments(ROUTES).expect("Failed to load routes");
    let groups = group_routes(&routes, &RouteMapOptions::default().frequency_thresholds).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].count, 2);
    assert_eq!(groups[0].tier, FrequencyTier::Low);
    assert_eq!(groups[1].count, 1);

    let (lat, lon) = map_center(&routes).unwrap();
    let expected_lat = (40.7128 + 34.0522 + 34.0522 + 51.5074 + 40.7128 + 34.0522) / 6.0;
    let expected_lon = (-74.0060 - 118.2437 - 118.2437 - 0.1278 - 74.0060 - 118.2437) / 6.0;
    assert!((lat - expected_lat).abs() < 1e-9);
    assert!((lon - expected_lon).abs() < 1e-9);
}

#[test]
fn test_render_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("turnaround.png");
    let html = dir.path().join("routes.html");

    let movements = load_vessel_movements(VESSELS).unwrap();
    render_histogram(&movements, &png, &HistogramOptions::default()).unwrap();
    let bytes = fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let routes = load_route_segments(ROUTES).unwrap();
    render_route_map(&routes, &html, &RouteMapOptions::default()).unwrap();
    let page = fs::read_to_string(&html).unwrap();
    assert!(page.contains("scattermapbox"));
    assert!(page.contains("Frequency 2 (low)"));

    // only the two committed artifacts remain
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_full_report() {
    let movements = load_vessel_movements(VESSELS).unwrap();
    let containers = load_container_dwell(CONTAINERS).unwrap();
    let inputs = ReportInputs {
        movements: &movements,
        containers: Some(&containers),
        eoq: Some(EoqInputs {
            demand_rate: 1000.0,
            ordering_cost: 100.0,
            holding_cost: 2.0,
        }),
    };

    let report = PortReport::build(&inputs, &AlertThresholds::default()).unwrap();

    assert_eq!(report.vessel_count, 5);
    assert_eq!(report.container_count, Some(5));
    assert_eq!(report.vessels_over_turnaround_threshold, 0);
    assert_eq!(report.containers_over_dwell_threshold, Some(0));
    // fewer than 10 vessels and occupancy above 80%
    assert_eq!(report.alerts.len(), 2);
}

#[test]
fn test_missing_column_is_validation_error() {
    let csv = "vessel_id,Arrival_Time\nV1,2024-01-01 00:00:00\n";
    let err = read_vessel_movements(csv.as_bytes()).unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert!(err.to_string().contains("Departure_Time"));
}
