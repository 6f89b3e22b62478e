//! Benchmark configuration
//!
//! Settings come from built-in defaults, then an optional JSON file
//! (`benchsettings.json` by default), then command-line flags.

use std::fmt;
use std::fs;
use std::io::{self, Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::experiment::{builtin_suite, ExperimentSpec};
use crate::utils::helpers::CliOptions;

pub const DEFAULT_CONFIG_FILE: &str = "benchsettings.json";
pub const DEFAULT_LAMBDA_BODY: &str = "sin(a.x) / cos(a.y) + sqrt(a.z)";

/// `10^n` must fit in a u64
pub const MAX_SUPPORTED_EXPONENT: u32 = 19;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "clemens".to_string(),
            password: String::new(),
            database: "test".to_string(),
        }
    }
}

/// How experiment results are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// `Input size: 10^n - AutoDiff-Ln: <ms>` lines
    #[default]
    Prose,
    /// pgfplots `\addplot coordinates {...}` blocks with legend entries
    Plot,
}

/// Built-in experiment suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    #[default]
    Autodiff,
    AutodiffTiming,
    GradientDescent,
    GradientDescentMomentum,
}

impl Suite {
    pub fn name(&self) -> &'static str {
        match self {
            Suite::Autodiff => "autodiff",
            Suite::AutodiffTiming => "autodiff-timing",
            Suite::GradientDescent => "gradient-descent",
            Suite::GradientDescentMomentum => "gradient-descent-momentum",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Suite::Autodiff => "AutoDiff: L1-4 Test",
            Suite::AutodiffTiming => "AutoDiff Timing: L2-4 Test",
            Suite::GradientDescent => "Gradient Descent: L1-4 Test",
            Suite::GradientDescentMomentum => "Gradient Descent (Momentum): L1-4 Test",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Suite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autodiff" => Ok(Suite::Autodiff),
            "autodiff-timing" => Ok(Suite::AutodiffTiming),
            "gradient-descent" => Ok(Suite::GradientDescent),
            "gradient-descent-momentum" => Ok(Suite::GradientDescentMomentum),
            other => Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Unknown suite '{}' (expected autodiff, autodiff-timing, gradient-descent or gradient-descent-momentum)",
                    other
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BenchmarkConfig {
    pub connection: ConnectionSettings,
    /// Each point executes its query `total_tests - 1` times
    #[serde(deserialize_with = "validate_positive_u32")]
    pub total_tests: u32,
    /// Largest exponent n measured on `perftests<n>`
    #[serde(deserialize_with = "validate_positive_u32")]
    pub max_exponent: u32,
    pub lambda_body: String,
    pub output_mode: OutputMode,
    pub suite: Suite,
    /// Sent once right after connecting
    pub init_statements: Vec<String>,
    /// Replaces the built-in suite when present
    pub experiments: Option<Vec<ExperimentSpec>>,
    /// Per-execution limit in seconds, at least 1 when set
    pub query_timeout_secs: Option<u64>,
    pub show_progress: bool,
    pub csv_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            total_tests: 5,
            max_exponent: 7,
            lambda_body: DEFAULT_LAMBDA_BODY.to_string(),
            output_mode: OutputMode::Prose,
            suite: Suite::Autodiff,
            init_statements: vec!["load 'llvmjit.so'".to_string()],
            experiments: None,
            query_timeout_secs: None,
            show_progress: true,
            csv_path: None,
            chart_path: None,
        }
    }
}

fn validate_positive_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u32::deserialize(deserializer)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

impl BenchmarkConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).map_err(|e| {
                Error::new(e.kind(), format!("{}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn from_json(content: &str) -> io::Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::new(ErrorKind::InvalidData, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `--config` (or the default file) and apply the remaining flags
    pub fn from_cli(options: &CliOptions) -> io::Result<Self> {
        let path = options
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load(&path)?;
        config.apply_cli(options)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, options: &CliOptions) -> io::Result<()> {
        if options.plot {
            self.output_mode = OutputMode::Plot;
        }
        if options.no_progress {
            self.show_progress = false;
        }
        if let Some(suite) = &options.suite {
            self.suite = suite.parse()?;
        }
        if let Some(total_tests) = options.total_tests {
            self.total_tests = total_tests;
        }
        if let Some(max_exponent) = options.max_exponent {
            self.max_exponent = max_exponent;
        }
        if let Some(lambda) = &options.lambda_body {
            self.lambda_body = lambda.clone();
        }
        if let Some(path) = &options.csv_path {
            self.csv_path = Some(path.clone());
        }
        if let Some(path) = &options.chart_path {
            self.chart_path = Some(path.clone());
        }
        if let Some(host) = &options.host {
            self.connection.host = host.clone();
        }
        if let Some(port) = options.port {
            self.connection.port = port;
        }
        if let Some(user) = &options.user {
            self.connection.user = user.clone();
        }
        if let Some(password) = &options.password {
            self.connection.password = password.clone();
        }
        if let Some(database) = &options.database {
            self.connection.database = database.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> io::Result<()> {
        if self.total_tests < 2 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("TotalTests must be at least 2 (got {}), otherwise no samples are taken", self.total_tests),
            ));
        }
        check_exponent("MaxExponent", self.max_exponent)?;
        if self.lambda_body.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "LambdaBody must not be empty"));
        }
        if self.query_timeout_secs == Some(0) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "QueryTimeoutSecs must be at least 1, omit it to disable the timeout",
            ));
        }

        let experiments = self.experiments();
        if experiments.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "Experiment list is empty"));
        }
        let mut labels = Vec::with_capacity(experiments.len());
        for spec in &experiments {
            if let Some(max_exponent) = spec.max_exponent {
                check_exponent(&format!("MaxExponent of experiment '{}'", spec.name), max_exponent)?;
            }
            if labels.contains(&spec.label) {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Duplicate experiment label L{} ('{}')", spec.label, spec.name),
                ));
            }
            labels.push(spec.label);
        }
        Ok(())
    }

    /// Number of timing samples behind every median
    pub fn samples_per_point(&self) -> usize {
        self.total_tests.saturating_sub(1) as usize
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }

    /// Experiments to run, in order
    pub fn experiments(&self) -> Vec<ExperimentSpec> {
        match &self.experiments {
            Some(custom) => custom.clone(),
            None => builtin_suite(self.suite),
        }
    }

    pub fn suite_title(&self) -> &str {
        match self.experiments {
            Some(_) => "Custom Suite",
            None => self.suite.title(),
        }
    }
}

fn check_exponent(field: &str, value: u32) -> io::Result<()> {
    if value == 0 || value > MAX_SUPPORTED_EXPONENT {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("{} must be between 1 and {} (got {})", field, MAX_SUPPORTED_EXPONENT, value),
        ));
    }
    Ok(())
}
