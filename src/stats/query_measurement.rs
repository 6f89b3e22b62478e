//! Per-point measurement record produced by the benchmark runner

use serde::Serialize;

use crate::stats::robust_statistics::RobustStatistics;

/// One (experiment, exponent) point with all statistical data
#[derive(Debug, Clone)]
pub struct QueryMeasurement {
    pub experiment: String,
    pub label: u32,
    pub exponent: u32,
    pub statistics: RobustStatistics,
    pub raw_samples: Vec<f64>,
}

impl QueryMeasurement {
    /// Row count of the `perftests<n>` table the point was measured on
    pub fn input_size(&self) -> u64 {
        10u64.pow(self.exponent)
    }

    pub fn median_ms(&self) -> f64 {
        self.statistics.median
    }

    pub fn to_record(&self) -> MeasurementRecord<'_> {
        MeasurementRecord {
            experiment: &self.experiment,
            label: self.label,
            exponent: self.exponent,
            input_size: self.input_size(),
            samples: self.statistics.sample_count,
            median_ms: self.statistics.median,
            mean_ms: self.statistics.mean,
            stdev_ms: self.statistics.stdev,
            mad_ms: self.statistics.mad,
            min_ms: self.statistics.min,
            max_ms: self.statistics.max,
            p95_ms: self.statistics.p95,
            outliers: self.statistics.outliers,
        }
    }
}

/// Flat CSV row for a measurement
#[derive(Debug, Serialize)]
pub struct MeasurementRecord<'a> {
    pub experiment: &'a str,
    pub label: u32,
    pub exponent: u32,
    pub input_size: u64,
    pub samples: usize,
    pub median_ms: f64,
    pub mean_ms: f64,
    pub stdev_ms: f64,
    pub mad_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub outliers: usize,
}
