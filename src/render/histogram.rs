//! Turnaround time histogram rendered to a PNG.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{AnalysisError, Result};
use crate::metrics::turnaround::turnaround_hours_for;
use crate::metrics::utility::{mean, median, min_max};
use crate::records::VesselMovementRecord;
use crate::render::artifact::StagedArtifact;
use crate::render::font::{FontTolerantBackend, ensure_font_registered};

const OPERATION: &str = "render_histogram";
const ARTIFACT: &str = "turnaround histogram";

pub const DEFAULT_HISTOGRAM_PATH: &str = "turnaround_histogram.png";
pub const DEFAULT_BIN_COUNT: usize = 30;
/// More bins than pixel columns cannot be drawn.
pub const MAX_BIN_COUNT: usize = 1000;

/// 10 x 6 inches at 100 dpi.
pub const FIGURE_SIZE: (u32, u32) = (1000, 600);

const MEAN_COLOR: RGBColor = RGBColor(220, 20, 60);
const MEDIAN_COLOR: RGBColor = RGBColor(34, 139, 34);

/// One equal-width bin. Bins are half-open except the last, which also
/// includes its upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

/// Splits the observed value range into `bin_count` equal-width bins.
///
/// When every value is identical the range is widened to `value ± 0.5`.
pub fn build_histogram(values: &[f64], bin_count: usize) -> Result<Vec<HistogramBin>> {
    if bin_count == 0 {
        return Err(AnalysisError::validation(OPERATION, "bin_count must be at least 1"));
    }
    if bin_count > MAX_BIN_COUNT {
        return Err(AnalysisError::validation(
            OPERATION,
            format!("bin_count {bin_count} exceeds the maximum of {MAX_BIN_COUNT}"),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalysisError::validation(
            OPERATION,
            format!("cannot bin non-finite value {bad}"),
        ));
    }
    let (mut lo, mut hi) = min_max(values)
        .ok_or_else(|| AnalysisError::validation(OPERATION, "no values to bin"))?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bin_count {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }

    Ok(bins)
}

/// Settings for [`render_histogram`].
#[derive(Debug, Clone, Copy)]
pub struct HistogramOptions {
    pub bin_count: usize,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            bin_count: DEFAULT_BIN_COUNT,
        }
    }
}

/// Renders the distribution of turnaround times with mean and median
/// reference lines and writes it to `output_path` as a PNG.
///
/// Turnaround times are recomputed from the records. Nothing is written at
/// `output_path` unless the whole render succeeds.
///
/// # Errors
///
/// `Validation` for an empty or inverted dataset or a zero bin count, `Io`
/// when the output cannot be created, `Render` when drawing fails.
#[tracing::instrument(skip_all, fields(vessels = records.len(), output = %output_path.as_ref().display()))]
pub fn render_histogram(
    records: &[VesselMovementRecord],
    output_path: impl AsRef<Path>,
    options: &HistogramOptions,
) -> Result<()> {
    draw_to_file(records, output_path.as_ref(), options)
        .inspect_err(|e| error!(operation = OPERATION, error = %e, "Histogram render failed"))
}

fn draw_to_file(
    records: &[VesselMovementRecord],
    output_path: &Path,
    options: &HistogramOptions,
) -> Result<()> {
    let hours = turnaround_hours_for(records, OPERATION)?;
    let bins = build_histogram(&hours, options.bin_count)?;
    let empty = || AnalysisError::validation(OPERATION, "no turnaround times");
    let mean_hours = mean(&hours).ok_or_else(empty)?;
    let median_hours = median(&hours).ok_or_else(empty)?;

    ensure_font_registered();
    let artifact = StagedArtifact::new(output_path)?;
    {
        let backend = BitMapBackend::new(artifact.path(), FIGURE_SIZE);
        let root = FontTolerantBackend::new(backend).into_drawing_area();
        draw_chart(root, &bins, mean_hours, median_hours)
            .map_err(|e| AnalysisError::render(ARTIFACT, e.to_string()))?;
    }
    let written = artifact.commit()?;

    info!(
        path = %written.display(),
        bins = bins.len(),
        mean_hours,
        median_hours,
        "Turnaround histogram written"
    );
    Ok(())
}

fn draw_chart<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    bins: &[HistogramBin],
    mean_hours: f64,
    median_hours: f64,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let x_min = bins.first().map_or(0.0, |b| b.lower);
    let x_max = bins.last().map_or(1.0, |b| b.upper);
    let y_top = bins.iter().map(|b| b.count).max().unwrap_or(0) + 1;

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Vessel Turnaround Times", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, 0u32..y_top)?;

    chart
        .configure_mesh()
        .x_desc("Turnaround Time (hours)")
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        Rectangle::new(
            [(b.lower, 0), (b.upper, b.count)],
            RGBColor(70, 130, 180).filled(),
        )
    }))?;
    chart.draw_series(bins.iter().filter(|b| b.count > 0).map(|b| {
        Rectangle::new([(b.lower, 0), (b.upper, b.count)], BLACK.stroke_width(1))
    }))?;

    chart
        .draw_series(LineSeries::new(
            vec![(mean_hours, 0), (mean_hours, y_top)],
            MEAN_COLOR.stroke_width(2),
        ))?
        .label(format!("Mean: {mean_hours:.2} h"))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MEAN_COLOR.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            vec![(median_hours, 0), (median_hours, y_top)],
            MEDIAN_COLOR.stroke_width(2),
        ))?
        .label(format!("Median: {median_hours:.2} h"))
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], MEDIAN_COLOR.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.4))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;

    fn vessels(stays: &[i64]) -> Vec<VesselMovementRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        stays
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let arrival = start + Duration::days(i as i64);
                VesselMovementRecord::new(arrival, arrival + Duration::hours(*h))
            })
            .collect()
    }

    #[test]
    fn test_bins_cover_range_and_count_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = build_histogram(&values, 5).unwrap();

        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[4].upper, 10.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u32>(), values.len() as u32);
        // width 2: [0,2) [2,4) [4,6) [6,8) [8,10]
        assert_eq!(
            bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![2, 2, 1, 0, 1]
        );
    }

    #[test]
    fn test_identical_values_widen_range() {
        let bins = build_histogram(&[24.0; 5], 30).unwrap();

        assert_eq!(bins.first().unwrap().lower, 23.5);
        assert_eq!(bins.last().unwrap().upper, 24.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<u32>(), 5);
    }

    #[test]
    fn test_excessive_bin_count_rejected() {
        let err = build_histogram(&[1.0, 2.0], 10_000_000_000).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation { .. }));
        assert_eq!(build_histogram(&[1.0, 2.0], MAX_BIN_COUNT).unwrap().len(), MAX_BIN_COUNT);
    }

    #[test]
    fn test_zero_bins_rejected() {
        let err = build_histogram(&[1.0], 0).unwrap_err();
        assert!(matches!(err, AnalysisError::Validation { .. }));
    }

    #[test]
    fn test_render_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnaround_histogram.png");

        render_histogram(&vessels(&[12, 24, 24, 36, 48, 72]), &path, &HistogramOptions::default())
            .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_render_empty_dataset_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("turnaround_histogram.png");

        let err = render_histogram(&[], &path, &HistogramOptions::default()).unwrap_err();

        assert!(matches!(err, AnalysisError::Validation { .. }));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_render_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("hist.png");

        let err = render_histogram(&vessels(&[5]), &path, &HistogramOptions::default())
            .unwrap_err();

        assert_eq!(err.kind(), "io");
        assert!(!path.exists());
    }
}
