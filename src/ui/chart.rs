//! SVG line chart of median latency per input size

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, Error, ErrorKind};
use std::path::Path;

use plotters::prelude::*;

use crate::stats::query_measurement::QueryMeasurement;

const CHART_SIZE: (u32, u32) = (960, 600);

/// Points grouped by experiment label, x = input size, y = median ms
pub fn series_by_label(measurements: &[QueryMeasurement]) -> BTreeMap<u32, Vec<(f64, f64)>> {
    let mut series: BTreeMap<u32, Vec<(f64, f64)>> = BTreeMap::new();
    for m in measurements {
        series
            .entry(m.label)
            .or_default()
            .push((m.input_size() as f64, m.median_ms()));
    }
    for points in series.values_mut() {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    series
}

pub fn render_chart(path: &Path, measurements: &[QueryMeasurement]) -> io::Result<()> {
    if measurements.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "No measurements to chart"));
    }
    let series = series_by_label(measurements);
    let max_size = measurements.iter().map(|m| m.input_size()).max().unwrap_or(10) as f64;
    let max_ms = measurements.iter().map(|m| m.median_ms()).fold(0.0, f64::max);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Median query latency", ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(40)
        .y_label_area_size(64)
        .build_cartesian_2d((1f64..max_size * 10.0).log_scale(), 0f64..(max_ms * 1.1).max(1.0))
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .x_desc("Input size (rows)")
        .y_desc("Median latency (ms)")
        .draw()
        .map_err(chart_error)?;

    for (idx, (label, points)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))
            .map_err(chart_error)?
            .label(format!("L{}", label))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
            .map_err(chart_error)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

fn chart_error<E: Display>(e: E) -> Error {
    Error::new(ErrorKind::Other, format!("Failed to render chart: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::robust_statistics::RobustStatistics;

    fn point(label: u32, exponent: u32, ms: f64) -> QueryMeasurement {
        QueryMeasurement {
            experiment: format!("L{}", label),
            label,
            exponent,
            statistics: RobustStatistics::from_samples(&[ms]).unwrap(),
            raw_samples: vec![ms],
        }
    }

    #[test]
    fn series_are_grouped_and_ordered_by_size() {
        let measurements = vec![point(2, 2, 4.0), point(1, 1, 1.0), point(2, 1, 3.0), point(1, 2, 2.0)];
        let series = series_by_label(&measurements);
        assert_eq!(series.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(series[&2], vec![(10.0, 3.0), (100.0, 4.0)]);
    }

    #[test]
    fn chart_is_written_as_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latency.svg");
        let measurements = vec![point(1, 1, 0.8), point(1, 2, 1.9), point(2, 1, 0.5), point(2, 2, 1.1)];

        render_chart(&path, &measurements).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("L2"));
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_chart(&dir.path().join("none.svg"), &[]).is_err());
    }
}
