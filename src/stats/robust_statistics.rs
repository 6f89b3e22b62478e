//! Robust statistics for query latency samples
//!
//! The median is the headline number of every benchmark point; the remaining
//! fields describe the spread of the samples behind it.

/// Summary of a set of latency samples (all values in milliseconds)
#[derive(Debug, Clone, PartialEq)]
pub struct RobustStatistics {
    pub median: f64,
    pub mean: f64,
    pub stdev: f64,
    pub mad: f64,              // Median Absolute Deviation - robust stdev
    pub min: f64,
    pub max: f64,
    pub p95: f64,              // 95th percentile
    pub outliers: usize,       // samples further than 3.5 * MAD from the median
    pub sample_count: usize,
}

impl RobustStatistics {
    /// Summarize a slice of samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let median = Self::sorted_median(&sorted);

        // MAD (Median Absolute Deviation) - robust measure of spread
        let mut deviations: Vec<f64> = sorted.iter()
            .map(|&x| (x - median).abs())
            .collect();
        deviations.sort_by(f64::total_cmp);
        let mad = Self::sorted_median(&deviations);

        // Rule: |x - median| > k * MAD, where k = 3.5 (corresponds to ~3σ)
        let threshold = 3.5 * mad;
        let outliers = if mad > 0.0 {
            sorted.iter().filter(|&&x| (x - median).abs() > threshold).count()
        } else {
            0
        };

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>() / n;

        Some(Self {
            median,
            mean,
            stdev: variance.sqrt(),
            mad,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            p95: Self::percentile(&sorted, 95.0),
            outliers,
            sample_count: sorted.len(),
        })
    }

    /// Nearest-rank percentile of sorted data
    fn percentile(sorted_data: &[f64], p: f64) -> f64 {
        if sorted_data.is_empty() {
            return 0.0;
        }
        let idx = (p / 100.0 * (sorted_data.len() - 1) as f64).round() as usize;
        sorted_data[idx.min(sorted_data.len() - 1)]
    }

    /// Middle value of sorted data; mean of the two middle values for even lengths
    fn sorted_median(sorted_data: &[f64]) -> f64 {
        let mid = sorted_data.len() / 2;
        if sorted_data.len() % 2 == 0 {
            (sorted_data[mid - 1] + sorted_data[mid]) / 2.0
        } else {
            sorted_data[mid]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn median(samples: &[f64]) -> Option<f64> {
        RobustStatistics::from_samples(samples).map(|stats| stats.median)
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn summary_bounds_contain_median() {
        let samples = [12.5, 9.75, 11.0, 40.0, 10.25];
        let stats = RobustStatistics::from_samples(&samples).unwrap();
        assert_eq!(stats.min, 9.75);
        assert_eq!(stats.max, 40.0);
        assert_eq!(stats.median, 11.0);
        assert!(stats.min <= stats.median && stats.median <= stats.max);
        assert_eq!(stats.sample_count, 5);
    }

    #[test]
    fn far_sample_is_flagged_as_outlier() {
        let samples = [10.0, 10.1, 9.9, 10.0, 10.2, 55.0];
        let stats = RobustStatistics::from_samples(&samples).unwrap();
        assert_eq!(stats.outliers, 1);
        assert_eq!(stats.p95, 55.0);
    }

    #[test]
    fn identical_samples_have_no_spread() {
        let stats = RobustStatistics::from_samples(&[2.0; 4]).unwrap();
        assert_eq!(stats.stdev, 0.0);
        assert_eq!(stats.mad, 0.0);
        assert_eq!(stats.outliers, 0);
    }
}
