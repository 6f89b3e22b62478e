//! Utility functions and helpers for the query benchmark
//!
//! Command-line flags, CSV export and host information.

use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use sysinfo::System;

use crate::stats::query_measurement::QueryMeasurement;

/// Flags accepted on the command line; every field overrides the settings file
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "jit_query_bench")]
#[command(about = "Times queries over perftests<n> tables with PostgreSQL JIT off and forced on", long_about = None)]
pub struct CliOptions {
    /// JSON settings file (default: benchsettings.json)
    #[arg(long = "config")]
    pub config_path: Option<PathBuf>,

    /// Print pgfplots coordinates instead of prose
    #[arg(long)]
    pub plot: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Built-in suite: autodiff, autodiff-timing, gradient-descent, gradient-descent-momentum
    #[arg(long)]
    pub suite: Option<String>,

    /// Each point executes its query N - 1 times
    #[arg(long)]
    pub total_tests: Option<u32>,

    /// Measure perftests1 .. perftestsN
    #[arg(long)]
    pub max_exponent: Option<u32>,

    /// Lambda expression body
    #[arg(long = "lambda")]
    pub lambda_body: Option<String>,

    /// Write every measurement to a CSV file
    #[arg(long = "csv")]
    pub csv_path: Option<PathBuf>,

    /// Render an SVG chart of the medians
    #[arg(long = "chart")]
    pub chart_path: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub database: Option<String>,
}

/// Write one CSV row per measured point
pub fn save_results_csv(path: &Path, measurements: &[QueryMeasurement]) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for m in measurements {
        writer.serialize(m.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

/// Host details shown in the run banner
#[derive(Debug, Clone)]
pub struct SystemSummary {
    pub os: String,
    pub cpu: String,
    pub cores: usize,
}

pub fn system_summary() -> SystemSummary {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    let cpu = sys
        .cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    SystemSummary {
        os: os_info::get().to_string(),
        cpu,
        cores: sys.cpus().len(),
    }
}
