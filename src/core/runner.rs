//! Timed query execution across increasing input sizes

use std::io::{self, Error, ErrorKind, Write};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::timeout;

use crate::core::config::BenchmarkConfig;
use crate::core::experiment::{ExperimentSpec, QueryTemplate};
use crate::core::session::SqlSession;
use crate::stats::query_measurement::QueryMeasurement;
use crate::stats::robust_statistics::RobustStatistics;
use crate::ui::report::{self, SIZE_PLACEHOLDER};

/// Raw samples of one query and their summary
#[derive(Debug, Clone)]
pub struct Timing {
    pub samples: Vec<f64>,
    pub statistics: RobustStatistics,
}

impl Timing {
    pub fn median_ms(&self) -> f64 {
        self.statistics.median
    }
}

pub struct BenchmarkRunner<'a, S, W> {
    session: &'a mut S,
    out: &'a mut W,
    config: &'a BenchmarkConfig,
}

impl<'a, S: SqlSession, W: Write> BenchmarkRunner<'a, S, W> {
    pub fn new(session: &'a mut S, out: &'a mut W, config: &'a BenchmarkConfig) -> Self {
        Self { session, out, config }
    }

    /// Execute `query` `total_tests - 1` times and return the elapsed milliseconds of each run
    pub async fn sample_query(&mut self, query: &str) -> io::Result<Vec<f64>> {
        let limit = self.config.query_timeout();
        let mut samples = Vec::with_capacity(self.config.samples_per_point());
        for _ in 1..self.config.total_tests {
            let started = Instant::now();
            match limit {
                Some(limit) => timeout(limit, self.session.execute(query))
                    .await
                    .map_err(|_| {
                        Error::new(
                            ErrorKind::TimedOut,
                            format!("Query exceeded {:?}: {}", limit, query),
                        )
                    })??,
                None => self.session.execute(query).await?,
            }
            samples.push(started.elapsed().as_secs_f64() * 1000.0);
        }
        Ok(samples)
    }

    /// Sample `query` and summarize; the median is the reported latency
    pub async fn measure(&mut self, query: &str) -> io::Result<Timing> {
        let samples = self.sample_query(query).await?;
        let statistics = RobustStatistics::from_samples(&samples).ok_or_else(|| no_samples(query))?;
        Ok(Timing { samples, statistics })
    }

    /// Sweep `template` over `perftests1..=perftests<max_exponent>`, writing one point per exponent
    pub async fn exp_test(
        &mut self,
        template: &QueryTemplate,
        max_exponent: u32,
        label: u32,
    ) -> io::Result<Vec<QueryMeasurement>> {
        let config = self.config;
        let mode = config.output_mode;
        let lambda = config.lambda_body.as_str();
        report::write_experiment_header(self.out, mode, &template.render(SIZE_PLACEHOLDER, lambda))?;

        let pb = self.progress_bar(max_exponent, label);
        let mut measurements = Vec::with_capacity(max_exponent as usize);
        for exponent in 1..=max_exponent {
            pb.set_message(format!("perftests{}", exponent));
            let query = template.render(&exponent.to_string(), lambda);
            let timing = self.measure(&query).await?;

            report::write_point(self.out, mode, exponent, label, timing.median_ms())?;
            measurements.push(QueryMeasurement {
                experiment: format!("L{}", label),
                label,
                exponent,
                statistics: timing.statistics,
                raw_samples: timing.samples,
            });
            pb.inc(1);
        }
        pb.finish_and_clear();

        report::write_experiment_footer(self.out, mode, label)?;
        Ok(measurements)
    }

    /// Setup statements, the exponent sweep, then teardown statements
    pub async fn run_experiment(&mut self, spec: &ExperimentSpec) -> io::Result<Vec<QueryMeasurement>> {
        for statement in &spec.setup {
            self.session.configure(statement).await?;
        }
        let max_exponent = spec.max_exponent.unwrap_or(self.config.max_exponent);
        let mut measurements = self.exp_test(&spec.template, max_exponent, spec.label).await?;
        for statement in &spec.teardown {
            self.session.configure(statement).await?;
        }
        for m in &mut measurements {
            m.experiment = spec.name.clone();
        }
        Ok(measurements)
    }

    fn progress_bar(&self, max_exponent: u32, label: u32) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(max_exponent as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {prefix} {wide_msg}")
                .unwrap()
                .progress_chars("##-"),
        );
        pb.set_prefix(format!("L{}", label));
        pb
    }
}

fn no_samples(query: &str) -> Error {
    Error::new(ErrorKind::InvalidInput, format!("No timing samples collected for: {}", query))
}
