//! Report generation for bench results.
//!
//! Formatting lives here, apart from the driver: [`MemoryTestBench`] only
//! returns structured samples.
//!
//! [`MemoryTestBench`]: crate::MemoryTestBench

use std::fmt::{self, Write as _};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::result::{AggregationPolicy, BenchReport, CellKind, CellOutcome, MeasurementSample};

/// CSV exporter for bench reports.
///
/// One row per cell, in report order, with columns for label, size, retained
/// bytes, status and confidence. Unmeasured and failed cells leave `bytes`
/// empty.
///
/// # Example
///
/// ```
/// use membench_benchmark::{BenchReport, CellOutcome, CsvExporter, MeasurementSample};
/// use membench_core::Measurement;
///
/// let mut report = BenchReport::new("Set", vec!["A".into()], vec![5]);
/// report.add_sample(MeasurementSample::new(
///     "A",
///     5,
///     CellOutcome::Measured(Measurement::from_readings(0, 60)),
/// ));
///
/// let csv = CsvExporter::to_string(&report);
/// assert!(csv.starts_with("label,size,bytes,status,confidence\n"));
/// assert!(csv.contains("A,5,60,measured,normal\n"));
/// ```
pub struct CsvExporter;

impl CsvExporter {
    /// Exports a report to a CSV string.
    pub fn to_string(report: &BenchReport) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = Self::render(report, &mut output);
        output
    }

    fn render(report: &BenchReport, out: &mut String) -> fmt::Result {
        writeln!(out, "label,size,bytes,status,confidence")?;
        for sample in &report.samples {
            let bytes = sample.bytes().map(|b| b.to_string()).unwrap_or_default();
            let confidence = match sample.kind() {
                CellKind::Measured if sample.is_low_confidence() => "clamped",
                CellKind::Measured => "normal",
                _ => "",
            };
            writeln!(
                out,
                "{},{},{},{},{}",
                csv_field(&sample.label),
                sample.size,
                bytes,
                sample.kind().as_str(),
                confidence,
            )?;
        }
        Ok(())
    }

    /// Exports a report to a CSV file.
    pub fn to_file(report: &BenchReport, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, Self::to_string(report))
    }

    /// Writes a report as CSV to a writer.
    pub fn write<W: Write>(report: &BenchReport, mut writer: W) -> io::Result<()> {
        writer.write_all(Self::to_string(report).as_bytes())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Markdown report generator.
///
/// Renders a size × label matrix of retained bytes, with the smallest label
/// per size, followed by the reasons for any failed cells. Flagged readings
/// are marked with `*`; whether they can win the per-size comparison follows
/// the [`AggregationPolicy`].
///
/// # Example
///
/// ```
/// use membench_benchmark::{BenchReport, MarkdownReport};
///
/// let report = BenchReport::new("Set", vec!["A".into()], vec![]);
/// let md = MarkdownReport::to_string(&report);
/// assert!(md.contains("# Memory: Set"));
/// assert!(md.contains("*No cells measured.*"));
/// ```
pub struct MarkdownReport;

impl MarkdownReport {
    /// Generates a Markdown report string under the default policy.
    pub fn to_string(report: &BenchReport) -> String {
        Self::to_string_with_policy(report, AggregationPolicy::default())
    }

    /// Generates a Markdown report string, comparing cells under `policy`.
    pub fn to_string_with_policy(report: &BenchReport, policy: AggregationPolicy) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = Self::render(report, policy, &mut output);
        output
    }

    fn render(report: &BenchReport, policy: AggregationPolicy, out: &mut String) -> fmt::Result {
        writeln!(out, "# Memory: {}", report.target_kind)?;
        writeln!(out)?;

        writeln!(out, "- **Entries**: {}", report.labels.join(", "))?;
        writeln!(out, "- **Sizes**: {}", report.sizes.len())?;
        writeln!(
            out,
            "- **Cells**: {} measured, {} unmeasured, {} failed",
            report.measured_count(),
            report.unmeasured_count(),
            report.failed_count()
        )?;
        writeln!(
            out,
            "- **Duration**: {:.2} ms",
            report.duration.as_secs_f64() * 1000.0
        )?;
        writeln!(out)?;

        if report.samples.is_empty() {
            writeln!(out, "*No cells measured.*")?;
            return Ok(());
        }

        writeln!(out, "## Retained bytes")?;
        writeln!(out)?;

        write!(out, "| Size |")?;
        for label in &report.labels {
            write!(out, " {} |", label)?;
        }
        writeln!(out, " Smallest |")?;
        write!(out, "|------|")?;
        for label in &report.labels {
            write!(out, "{}|", "-".repeat(label.len() + 2))?;
        }
        writeln!(out, "----------|")?;

        for (size, group) in report.by_size() {
            write!(out, "| {} |", size)?;
            for label in &report.labels {
                let cell = group
                    .iter()
                    .find(|s| &s.label == label)
                    .map(format_cell)
                    .unwrap_or_else(|| "-".to_string());
                write!(out, " {} |", cell)?;
            }
            let smallest = smallest_in(group, policy).unwrap_or("N/A");
            writeln!(out, " {} |", smallest)?;
        }

        if report.low_confidence_count() > 0 {
            writeln!(out)?;
            writeln!(
                out,
                "`*` negative delta clamped to zero; low-confidence reading."
            )?;
        }

        let failures: Vec<&MeasurementSample> = report
            .samples
            .iter()
            .filter(|s| s.kind() != CellKind::Measured)
            .collect();
        if !failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Failures")?;
            writeln!(out)?;
            for sample in failures {
                match &sample.outcome {
                    CellOutcome::Unstable {
                        passes,
                        drift_bytes,
                    } => writeln!(
                        out,
                        "- {} @ {}: heap unsettled after {} passes (drift {} bytes)",
                        sample.label, sample.size, passes, drift_bytes
                    )?,
                    CellOutcome::ConstructionFailed { message } => writeln!(
                        out,
                        "- {} @ {}: construction failed: {}",
                        sample.label, sample.size, message
                    )?,
                    CellOutcome::Measured(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Writes a Markdown report to a file under the default policy.
    pub fn to_file(report: &BenchReport, path: impl AsRef<Path>) -> io::Result<()> {
        Self::to_file_with_policy(report, path, AggregationPolicy::default())
    }

    /// Writes a Markdown report to a file, comparing cells under `policy`.
    pub fn to_file_with_policy(
        report: &BenchReport,
        path: impl AsRef<Path>,
        policy: AggregationPolicy,
    ) -> io::Result<()> {
        fs::write(path, Self::to_string_with_policy(report, policy))
    }

    /// Writes a Markdown report to a writer under the default policy.
    pub fn write<W: Write>(report: &BenchReport, writer: W) -> io::Result<()> {
        Self::write_with_policy(report, writer, AggregationPolicy::default())
    }

    /// Writes a Markdown report to a writer, comparing cells under `policy`.
    pub fn write_with_policy<W: Write>(
        report: &BenchReport,
        mut writer: W,
        policy: AggregationPolicy,
    ) -> io::Result<()> {
        writer.write_all(Self::to_string_with_policy(report, policy).as_bytes())
    }
}

fn format_cell(sample: &MeasurementSample) -> String {
    match sample.bytes() {
        Some(bytes) if sample.is_low_confidence() => format!("{}*", bytes),
        Some(bytes) => bytes.to_string(),
        None => sample.kind().as_str().to_string(),
    }
}

// Per group rather than `BenchReport::smallest_at`, since a size may repeat.
fn smallest_in(group: &[MeasurementSample], policy: AggregationPolicy) -> Option<&str> {
    let mut best: Option<(&str, u64)> = None;
    for sample in group {
        if let Some(bytes) = sample.bytes_under(policy) {
            if best.map_or(true, |(_, b)| bytes < b) {
                best = Some((sample.label.as_str(), bytes));
            }
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
