//! Experiment output in prose or pgfplots form, plus the end-of-run summary

use std::io::{self, Write};

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

use crate::core::config::OutputMode;
use crate::stats::query_measurement::QueryMeasurement;

/// Placeholder shown instead of the size in the printed query
pub const SIZE_PLACEHOLDER: &str = "<SIZE>";

pub fn write_suite_title<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "\n==== {} ====", title)
}

/// Opens an experiment block
pub fn write_experiment_header<W: Write>(out: &mut W, mode: OutputMode, query: &str) -> io::Result<()> {
    match mode {
        OutputMode::Prose => writeln!(out, "\nPostgres query: {}", query)?,
        OutputMode::Plot => write!(out, "\\addplot coordinates {{")?,
    }
    out.flush()
}

pub fn write_point<W: Write>(
    out: &mut W,
    mode: OutputMode,
    exponent: u32,
    label: u32,
    median_ms: f64,
) -> io::Result<()> {
    match mode {
        OutputMode::Prose => writeln!(out, "Input size: 10^{} - AutoDiff-L{}: {:.3}", exponent, label, median_ms)?,
        OutputMode::Plot => write!(out, "({}, {:.3})", 10u64.pow(exponent), median_ms)?,
    }
    out.flush()
}

/// Closes an experiment block; prose mode needs nothing
pub fn write_experiment_footer<W: Write>(out: &mut W, mode: OutputMode, label: u32) -> io::Result<()> {
    if mode == OutputMode::Plot {
        writeln!(out, "}};\n\\addlegendentry{{L{}}};", label)?;
    }
    out.flush()
}

/// Status text goes to stderr in plot mode so stdout stays a clean pgfplots block
pub fn notice(mode: OutputMode, message: &str) {
    match mode {
        OutputMode::Prose => println!("{}", message),
        OutputMode::Plot => eprintln!("{}", message),
    }
}

pub fn section(mode: OutputMode, title: &str) {
    notice(mode, &format!("{}", title.bold().yellow()));
    notice(mode, &"━".repeat(title.chars().count().max(20)));
}

pub fn summary_table(measurements: &[QueryMeasurement]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Experiment", "Label", "Input size", "Median ms", "Mean ms", "StdDev", "MAD", "P95 ms", "Outliers",
        ]);
    for m in measurements {
        table.add_row(vec![
            Cell::new(&m.experiment),
            Cell::new(format!("L{}", m.label)),
            Cell::new(format!("10^{}", m.exponent)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.statistics.median)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.statistics.mean)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.statistics.stdev)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.statistics.mad)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", m.statistics.p95)).set_alignment(CellAlignment::Right),
            Cell::new(m.statistics.outliers).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::robust_statistics::RobustStatistics;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn prose_point_line() {
        let line = render(|out| write_point(out, OutputMode::Prose, 3, 2, 12.34567));
        assert_eq!(line, "Input size: 10^3 - AutoDiff-L2: 12.346\n");
    }

    #[test]
    fn plot_block_is_pgfplots_syntax() {
        let block = render(|out| {
            write_experiment_header(out, OutputMode::Plot, "ignored")?;
            write_point(out, OutputMode::Plot, 1, 4, 0.5)?;
            write_point(out, OutputMode::Plot, 2, 4, 1.25)?;
            write_experiment_footer(out, OutputMode::Plot, 4)
        });
        assert_eq!(block, "\\addplot coordinates {(10, 0.500)(100, 1.250)};\n\\addlegendentry{L4};\n");
    }

    #[test]
    fn prose_header_shows_query() {
        let header = render(|out| write_experiment_header(out, OutputMode::Prose, "select 1"));
        assert_eq!(header, "\nPostgres query: select 1\n");
        assert_eq!(render(|out| write_experiment_footer(out, OutputMode::Prose, 1)), "");
    }

    #[test]
    fn summary_table_has_a_row_per_measurement() {
        let statistics = RobustStatistics::from_samples(&[1.0, 2.0, 3.0]).unwrap();
        let measurements: Vec<QueryMeasurement> = (1..=2)
            .map(|exponent| QueryMeasurement {
                experiment: "jit-off".to_string(),
                label: 1,
                exponent,
                statistics: statistics.clone(),
                raw_samples: vec![1.0, 2.0, 3.0],
            })
            .collect();
        let rendered = summary_table(&measurements).to_string();
        assert!(rendered.contains("jit-off"));
        assert!(rendered.contains("10^2"));
        assert!(rendered.contains("2.000"));
    }
}
