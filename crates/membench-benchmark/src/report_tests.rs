//! Tests for report formatting.

use std::fs;

use membench_core::Measurement;

use super::*;

fn measured(label: &str, size: usize, baseline: u64, retained: u64) -> MeasurementSample {
    MeasurementSample::new(
        label,
        size,
        CellOutcome::Measured(Measurement::from_readings(baseline, retained)),
    )
}

fn sample_report() -> BenchReport {
    let mut report = BenchReport::new(
        "Set",
        vec!["Sorted".into(), "Hashed".into(), "Broken".into()],
        vec![0, 4],
    );
    report.add_sample(measured("Sorted", 0, 100, 100));
    report.add_sample(measured("Hashed", 0, 100, 148));
    report.add_sample(MeasurementSample::new(
        "Broken",
        0,
        CellOutcome::ConstructionFailed {
            message: "no capacity".into(),
        },
    ));
    report.add_sample(measured("Sorted", 4, 200, 248));
    report.add_sample(measured("Hashed", 4, 300, 220));
    report.add_sample(MeasurementSample::new(
        "Broken",
        4,
        CellOutcome::Unstable {
            passes: 16,
            drift_bytes: 512,
        },
    ));
    report
}

#[test]
fn test_csv_rows_follow_report_order() {
    let csv = CsvExporter::to_string(&sample_report());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(
        lines,
        vec![
            "label,size,bytes,status,confidence",
            "Sorted,0,0,measured,normal",
            "Hashed,0,48,measured,normal",
            "Broken,0,,failed,",
            "Sorted,4,48,measured,normal",
            "Hashed,4,0,measured,clamped",
            "Broken,4,,unmeasured,",
        ]
    );
}

#[test]
fn test_csv_quotes_labels_with_separators() {
    let mut report = BenchReport::new("Map", vec!["HashMap<u32, u32>".into()], vec![1]);
    report.add_sample(measured("HashMap<u32, u32>", 1, 0, 64));

    let csv = CsvExporter::to_string(&report);
    assert!(csv.contains("\"HashMap<u32, u32>\",1,64,measured,normal\n"));
}

#[test]
fn test_markdown_matrix() {
    let md = MarkdownReport::to_string(&sample_report());

    assert!(md.starts_with("# Memory: Set\n"));
    assert!(md.contains("- **Entries**: Sorted, Hashed, Broken"));
    assert!(md.contains("- **Cells**: 4 measured, 1 unmeasured, 1 failed"));
    assert!(md.contains("| Size | Sorted | Hashed | Broken | Smallest |"));
    assert!(md.contains("| 0 | 0 | 48 | failed | Sorted |"));
    assert!(md.contains("| 4 | 48 | 0* | unmeasured | Hashed |"));
    assert!(md.contains("`*` negative delta clamped"));
}

#[test]
fn test_markdown_excluding_flagged_cells() {
    let md =
        MarkdownReport::to_string_with_policy(&sample_report(), AggregationPolicy::ExcludeFlagged);

    assert!(md.contains("| 4 | 48 | 0* | unmeasured | Sorted |"));
}

#[test]
fn test_markdown_lists_failures() {
    let md = MarkdownReport::to_string(&sample_report());

    assert!(md.contains("## Failures"));
    assert!(md.contains("- Broken @ 0: construction failed: no capacity"));
    assert!(md.contains("- Broken @ 4: heap unsettled after 16 passes (drift 512 bytes)"));
}

#[test]
fn test_markdown_omits_optional_sections() {
    let mut report = BenchReport::new("Set", vec!["A".into()], vec![1]);
    report.add_sample(measured("A", 1, 0, 4));

    let md = MarkdownReport::to_string(&report);
    assert!(md.contains("| 1 | 4 | A |"));
    assert!(!md.contains("## Failures"));
    assert!(!md.contains("`*`"));
}

#[test]
fn test_reports_written_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let report = sample_report();

    let csv_path = dir.path().join("set.csv");
    CsvExporter::to_file(&report, &csv_path).unwrap();
    assert_eq!(
        fs::read_to_string(&csv_path).unwrap(),
        CsvExporter::to_string(&report)
    );

    let md_path = dir.path().join("set.md");
    MarkdownReport::to_file(&report, &md_path).unwrap();
    assert_eq!(
        fs::read_to_string(&md_path).unwrap(),
        MarkdownReport::to_string(&report)
    );
}

#[test]
fn test_write_to_writer() {
    let report = sample_report();
    let mut buffer = Vec::new();
    CsvExporter::write(&report, &mut buffer).unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), CsvExporter::to_string(&report));
}

#[test]
fn test_markdown_keeps_adjacent_repeated_sizes() {
    let mut report = BenchReport::new("Set", vec!["A".into(), "B".into()], vec![64, 64]);
    report.add_sample(measured("A", 64, 0, 256));
    report.add_sample(measured("B", 64, 0, 512));
    report.add_sample(measured("A", 64, 0, 600));
    report.add_sample(measured("B", 64, 0, 520));

    let groups: Vec<(usize, usize)> = report
        .by_size()
        .iter()
        .map(|(size, group)| (*size, group.len()))
        .collect();
    assert_eq!(groups, vec![(64, 2), (64, 2)]);

    let md = MarkdownReport::to_string(&report);
    assert!(md.contains("- **Sizes**: 2"));
    assert!(md.contains("| 64 | 256 | 512 | A |"));
    assert!(md.contains("| 64 | 600 | 520 | B |"));
    assert_eq!(md.lines().filter(|line| line.starts_with("| 64 |")).count(), 2);
}

#[test]
fn test_markdown_file_and_writer_honour_policy() {
    let report = sample_report();
    let expected =
        MarkdownReport::to_string_with_policy(&report, AggregationPolicy::ExcludeFlagged);
    assert_ne!(expected, MarkdownReport::to_string(&report));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("excluded.md");
    MarkdownReport::to_file_with_policy(&report, &path, AggregationPolicy::ExcludeFlagged)
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);

    let mut buffer = Vec::new();
    MarkdownReport::write_with_policy(&report, &mut buffer, AggregationPolicy::ExcludeFlagged)
        .unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), expected);
}
