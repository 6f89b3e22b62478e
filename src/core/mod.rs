pub mod config;
pub mod experiment;
pub mod runner;
pub mod session;

use std::env;
use std::io::{self, Write};

use clap::Parser;
use colored::*;

use crate::core::config::{BenchmarkConfig, OutputMode};
use crate::core::runner::BenchmarkRunner;
use crate::core::session::{PgSession, SqlSession};
use crate::stats::query_measurement::QueryMeasurement;
use crate::ui::chart::render_chart;
use crate::ui::report::{self, notice, section};
use crate::utils::helpers::{save_results_csv, system_summary, CliOptions};

// ============================================================================
// DRIVER
// ============================================================================

pub async fn run_benchmark() -> io::Result<()> {
    let options = CliOptions::parse();
    let config = BenchmarkConfig::from_cli(&options)?;
    let mode = config.output_mode;

    print_banner(&config)?;

    section(mode, "Database");
    let mut session = match PgSession::connect(&config.connection).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", "❌ Error:".bold().red(), e);
            return Err(e);
        }
    };
    match session.server_version().await {
        Ok(version) => notice(mode, &format!("✓ Connected: {}", version)),
        Err(e) => eprintln!("⚠️ Warning: could not read server version: {}", e),
    }

    let mut out = io::stdout();
    let measurements = execute_suite(&mut session, &config, &mut out).await?;
    out.flush()?;

    finish(&config, &measurements)
}

/// Connection init, suite title, then every experiment in order
pub async fn execute_suite<S: SqlSession, W: Write>(
    session: &mut S,
    config: &BenchmarkConfig,
    out: &mut W,
) -> io::Result<Vec<QueryMeasurement>> {
    for statement in &config.init_statements {
        session.configure(statement).await?;
    }
    report::write_suite_title(out, config.suite_title())?;

    let mut runner = BenchmarkRunner::new(session, out, config);
    let mut measurements = Vec::new();
    for spec in config.experiments() {
        measurements.extend(runner.run_experiment(&spec).await?);
    }
    Ok(measurements)
}

fn print_banner(config: &BenchmarkConfig) -> io::Result<()> {
    let mode = config.output_mode;
    let separator = "=".repeat(60);

    notice(mode, &format!("\n{}", separator));
    let title = format!("PostgreSQL JIT Query Benchmark v{}", crate::VERSION);
    notice(mode, &format!("{:^60}", title.bold().cyan()));
    notice(mode, &format!("{}\n", separator));

    let system = system_summary();
    section(mode, "System Information");
    notice(mode, &format!("Working directory: {}", env::current_dir()?.display()));
    notice(mode, &format!("OS: {}", system.os));
    notice(mode, &format!("CPU: {} ({} logical cores)", system.cpu, system.cores));
    notice(mode, "");

    let connection = &config.connection;
    section(mode, "Benchmark Parameters");
    notice(mode, &format!("▸ Target: {}@{}:{}/{}", connection.user, connection.host, connection.port, connection.database));
    notice(mode, &format!("▸ Suite: {} ({} experiments)", config.suite_title(), config.experiments().len()));
    notice(mode, &format!("▸ Input sizes: 10^1 .. 10^{}", config.max_exponent));
    notice(mode, &format!("▸ Samples per point: {}", config.samples_per_point()));
    notice(mode, &format!("▸ Lambda: {}", config.lambda_body));
    if let Some(limit) = config.query_timeout() {
        notice(mode, &format!("▸ Query timeout: {:?}", limit));
    }
    notice(mode, "");
    Ok(())
}

fn finish(config: &BenchmarkConfig, measurements: &[QueryMeasurement]) -> io::Result<()> {
    let mode = config.output_mode;

    if mode == OutputMode::Prose {
        println!();
        section(mode, "Summary");
        println!("{}", report::summary_table(measurements));
    }

    if let Some(path) = &config.csv_path {
        save_results_csv(path, measurements)?;
        notice(mode, &format!("{} {}", "✓ Results saved to".green(), path.display()));
    }
    if let Some(path) = &config.chart_path {
        render_chart(path, measurements)?;
        notice(mode, &format!("{} {}", "✓ Chart written to".green(), path.display()));
    }

    notice(mode, &format!("{}", "Benchmark complete.".bold().green()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runner::tests::{quiet_config, RecordingSession};

    const LAMBDA: &str = "sin(a.x) / cos(a.y) + sqrt(a.z)";

    fn query(function: &str, exponent: u32) -> String {
        format!(
            "select * from {}((select x, y, z from perftests{}), (lambda(a)({})))",
            function, exponent, LAMBDA
        )
    }

    #[tokio::test]
    async fn default_suite_replays_the_four_phases_in_order() {
        let config = BenchmarkConfig {
            total_tests: 2,
            max_exponent: 1,
            ..quiet_config(OutputMode::Prose)
        };
        let mut session = RecordingSession::default();
        let mut out: Vec<u8> = Vec::new();

        let measurements = execute_suite(&mut session, &config, &mut out).await.unwrap();

        let expected: Vec<String> = vec![
            "configure: load 'llvmjit.so'".to_string(),
            "configure: set jit='off'".to_string(),
            format!("execute: {}", query("autodiff_l1_2", 1)),
            "configure: set jit='on'".to_string(),
            "configure: load 'llvmjit.so'".to_string(),
            "configure: set jit_above_cost = 0".to_string(),
            "configure: set jit_inline_above_cost = 0".to_string(),
            "configure: set jit_optimize_above_cost = 0".to_string(),
            format!("execute: {}", query("autodiff_l1_2", 1)),
            format!("execute: {}", query("autodiff_l3", 1)),
            format!("execute: {}", query("autodiff_l4", 1)),
        ];
        assert_eq!(session.log, expected);
        assert_eq!(session.configured.len(), 7);

        let names: Vec<&str> = measurements.iter().map(|m| m.experiment.as_str()).collect();
        assert_eq!(names, vec!["jit-off", "jit-forced", "l3", "l4"]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\n==== AutoDiff: L1-4 Test ===="));
        for label in 1..=4 {
            assert!(text.contains(&format!("Input size: 10^1 - AutoDiff-L{}: ", label)));
        }
    }

    #[tokio::test]
    async fn plot_mode_emits_one_legend_per_experiment() {
        let config = BenchmarkConfig {
            total_tests: 3,
            max_exponent: 2,
            ..quiet_config(OutputMode::Plot)
        };
        let mut session = RecordingSession::default();
        let mut out: Vec<u8> = Vec::new();

        let measurements = execute_suite(&mut session, &config, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\\addplot coordinates {").count(), 4);
        for label in 1..=4 {
            assert!(text.contains(&format!("\\addlegendentry{{L{}}};", label)));
        }
        assert_eq!(measurements.len(), 8);
        assert_eq!(session.executed.len(), 16);
    }
}
