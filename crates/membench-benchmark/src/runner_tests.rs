//! Tests for the bench runner.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use membench_core::{factory_fn, Confidence, QuiescencePolicy};
use membench_families::synthetic::{
    ConstantOverheadFactory, FailingFactory, LinearOverheadFactory, PanickingFactory,
};

use super::*;
use crate::result::{AggregationPolicy, CellKind};

const OVERHEAD: usize = 32;
const PER_ELEMENT: usize = 16;

fn exact_bench(sweep: SweepSpec) -> MemoryTestBench {
    MemoryTestBench::with_probe(
        "Synthetic",
        sweep,
        MemoryProbe::current_thread().with_policy(QuiescencePolicy::new(0, 2, 8)),
    )
}

struct ScriptedHeap {
    readings: RefCell<VecDeque<u64>>,
    last: Cell<u64>,
}

impl ScriptedHeap {
    fn new(readings: &[u64]) -> Self {
        Self {
            readings: RefCell::new(readings.iter().copied().collect()),
            last: Cell::new(0),
        }
    }
}

impl HostHeap for ScriptedHeap {
    fn force_reclaim(&self) {}

    fn retained_heap_size(&self) -> u64 {
        if let Some(value) = self.readings.borrow_mut().pop_front() {
            self.last.set(value);
        }
        self.last.get()
    }
}

struct DriftingHeap {
    current: Cell<u64>,
}

impl HostHeap for DriftingHeap {
    fn force_reclaim(&self) {}

    fn retained_heap_size(&self) -> u64 {
        self.current.set(self.current.get() + 4096);
        self.current.get()
    }
}

#[test]
fn test_constant_and_linear_factories() {
    let report = exact_bench(SweepSpec::new([0, 1, 5]))
        .with_entry("A", |size| ConstantOverheadFactory::new(size, OVERHEAD))
        .with_entry("B", |size| LinearOverheadFactory::new(size, PER_ELEMENT))
        .execute()
        .unwrap();

    for size in [0, 1, 5] {
        assert_eq!(report.bytes("A", size), Some(OVERHEAD as u64));
        assert_eq!(report.bytes("B", size), Some((size * PER_ELEMENT) as u64));
    }

    let a = report.bytes("A", 5).unwrap();
    let b = report.bytes("B", 5).unwrap();
    assert!(b > a);
    assert_eq!(b - a, (5 * PER_ELEMENT - OVERHEAD) as u64);
    assert_eq!(report.measured_count(), 6);
    assert_eq!(report.low_confidence_count(), 0);
}

#[test]
fn test_rows_ordered_by_size_then_registration() {
    let report = exact_bench(SweepSpec::new([10, 2]))
        .with_entry("first", |size| LinearOverheadFactory::new(size, 1))
        .with_entry("second", |size| LinearOverheadFactory::new(size, 2))
        .with_entry("third", |size| LinearOverheadFactory::new(size, 3))
        .execute()
        .unwrap();

    assert_eq!(
        report.cells(),
        vec![
            ("first", 10),
            ("second", 10),
            ("third", 10),
            ("first", 2),
            ("second", 2),
            ("third", 2),
        ]
    );
    assert_eq!(report.labels, vec!["first", "second", "third"]);
    assert_eq!(report.sizes, vec![10, 2]);
}

#[test]
fn test_failing_entry_does_not_abort_others() {
    let sweep = [0, 3, 7];
    let report = exact_bench(SweepSpec::new(sweep))
        .with_entry("one", |size| LinearOverheadFactory::new(size, 8))
        .with_entry("broken", FailingFactory::new)
        .with_entry("three", |size| ConstantOverheadFactory::new(size, 24))
        .execute()
        .unwrap();

    assert_eq!(report.cell_count(), 9);
    for size in sweep {
        assert_eq!(report.bytes("one", size), Some(size as u64 * 8));
        assert_eq!(report.bytes("three", size), Some(24));

        let broken = report.sample("broken", size).unwrap();
        assert_eq!(broken.kind(), CellKind::ConstructionFailed);
        assert_eq!(broken.bytes(), None);
        assert_eq!(
            broken.outcome,
            CellOutcome::ConstructionFailed {
                message: format!("refusing to build {size} elements"),
            }
        );
    }
    assert_eq!(report.failed_count(), 3);
}

#[test]
fn test_panicking_factory_is_recorded() {
    let report = exact_bench(SweepSpec::new([4]))
        .with_entry("panics", PanickingFactory::new)
        .with_entry("fine", |size| LinearOverheadFactory::new(size, 2))
        .execute()
        .unwrap();

    match &report.sample("panics", 4).unwrap().outcome {
        CellOutcome::ConstructionFailed { message } => {
            assert_eq!(message, "panicked: cannot build 4 elements")
        }
        other => panic!("expected ConstructionFailed, got {other:?}"),
    }
    assert_eq!(report.bytes("fine", 4), Some(8));
}

#[test]
fn test_execute_twice_yields_same_cells() {
    let bench = exact_bench(SweepSpec::range(0, 4))
        .with_entry("A", |size| ConstantOverheadFactory::new(size, 8))
        .with_entry("B", |size| LinearOverheadFactory::new(size, 4));

    let first = bench.execute().unwrap();
    let second = bench.execute().unwrap();

    assert_eq!(first.cells(), second.cells());
    for (label, size) in first.cells() {
        assert_eq!(first.bytes(label, size), second.bytes(label, size));
    }
}

#[test]
fn test_repeated_measurement_is_stable() {
    let bench = exact_bench(SweepSpec::new([64, 64, 64]))
        .with_entry("B", |size| LinearOverheadFactory::new(size, 4));

    let report = bench.execute().unwrap();
    let readings: Vec<_> = report.samples.iter().filter_map(|s| s.bytes()).collect();

    assert_eq!(readings, vec![256, 256, 256]);
    assert_eq!(report.by_size().len(), 3);
}

#[test]
fn test_duplicate_sizes_are_kept_in_sweep_order() {
    let report = exact_bench(SweepSpec::new([5, 1, 5]))
        .with_entry("B", |size| LinearOverheadFactory::new(size, 1))
        .execute()
        .unwrap();

    let groups: Vec<usize> = report.by_size().iter().map(|(size, _)| *size).collect();
    assert_eq!(groups, vec![5, 1, 5]);
}

#[test]
fn test_preconditions_checked_before_measuring() {
    let builds = Rc::new(Cell::new(0u32));
    let counter = builds.clone();
    let counted = move |size: usize| {
        let counter = counter.clone();
        factory_fn(size, move || {
            counter.set(counter.get() + 1);
            Ok(())
        })
    };

    assert_eq!(
        exact_bench(SweepSpec::default())
            .with_entry("A", counted.clone())
            .execute()
            .unwrap_err(),
        MemBenchError::EmptySweep
    );
    assert_eq!(
        exact_bench(SweepSpec::new([1])).execute().unwrap_err(),
        MemBenchError::NoEntries
    );
    assert_eq!(
        exact_bench(SweepSpec::new([1]))
            .with_entry("A", counted.clone())
            .with_entry("A", counted.clone())
            .execute()
            .unwrap_err(),
        MemBenchError::DuplicateLabel("A".to_string())
    );
    let invalid = MemoryTestBench::with_probe(
        "Synthetic",
        SweepSpec::new([1]),
        MemoryProbe::current_thread().with_policy(QuiescencePolicy::new(0, 3, 1)),
    )
    .with_entry("A", counted);
    assert!(matches!(
        invalid.execute(),
        Err(MemBenchError::InvalidPolicy(_))
    ));

    assert_eq!(builds.get(), 0);
}

#[test]
fn test_warmup_builds_precede_measurement() {
    let builds = Rc::new(Cell::new(0u32));
    let counter = builds.clone();

    let report = exact_bench(SweepSpec::new([2, 3]))
        .with_warmup_count(2)
        .with_entry("counted", move |size| {
            let counter = counter.clone();
            factory_fn(size, move || {
                counter.set(counter.get() + 1);
                Ok(vec![0u8; size])
            })
        })
        .execute()
        .unwrap();

    assert_eq!(builds.get(), 2 * 3);
    assert_eq!(report.bytes("counted", 3), Some(3));
}

#[test]
fn test_unstable_heap_marks_cells_unmeasured() {
    let probe = MemoryProbe::new(DriftingHeap {
        current: Cell::new(0),
    })
    .with_policy(QuiescencePolicy::new(0, 2, 4));

    let report = MemoryTestBench::with_probe("Drifting", SweepSpec::new([0, 1]), probe)
        .with_entry("A", |size| ConstantOverheadFactory::new(size, 1))
        .execute()
        .unwrap();

    assert_eq!(report.unmeasured_count(), 2);
    for sample in &report.samples {
        assert_eq!(sample.kind(), CellKind::MeasurementUnstable);
        assert_eq!(
            sample.outcome,
            CellOutcome::Unstable {
                passes: 4,
                drift_bytes: 4096,
            }
        );
    }
}

#[test]
fn test_negative_delta_is_flagged_in_report() {
    let heap = ScriptedHeap::new(&[500, 500, 500, 420, 420, 420]);
    let probe = MemoryProbe::new(&heap).with_policy(QuiescencePolicy::new(0, 2, 4));

    let report = MemoryTestBench::with_probe("Scripted", SweepSpec::new([3]), probe)
        .with_warmup_count(0)
        .with_entry("A", |size| ConstantOverheadFactory::new(size, 0))
        .execute()
        .unwrap();

    let sample = report.sample("A", 3).unwrap();
    assert_eq!(
        sample.outcome,
        CellOutcome::Measured(Measurement {
            bytes: 0,
            confidence: Confidence::NegativeDeltaClamped,
        })
    );
    assert!(sample.is_low_confidence());
    assert_eq!(sample.bytes_under(AggregationPolicy::IncludeFlagged), Some(0));
    assert_eq!(sample.bytes_under(AggregationPolicy::ExcludeFlagged), None);
    assert_eq!(report.smallest_at(3, AggregationPolicy::ExcludeFlagged), None);
}

#[test]
fn test_smallest_label_per_size() {
    let report = exact_bench(SweepSpec::new([0, 10]))
        .with_entry("constant", |size| ConstantOverheadFactory::new(size, 40))
        .with_entry("linear", |size| LinearOverheadFactory::new(size, 8))
        .execute()
        .unwrap();

    assert_eq!(
        report.smallest_at(0, AggregationPolicy::default()),
        Some("linear")
    );
    assert_eq!(
        report.smallest_at(10, AggregationPolicy::default()),
        Some("constant")
    );
    assert_eq!(
        report.bytes_per_element("linear", 10, AggregationPolicy::default()),
        Some(8.0)
    );
    assert_eq!(
        report.bytes_per_element("linear", 0, AggregationPolicy::default()),
        None
    );
}

#[test]
fn test_exact_after_thread_frees_foreign_memory() {
    let foreign = std::thread::spawn(|| vec![0u8; 1 << 16]).join().unwrap();
    drop(std::hint::black_box(foreign));

    let report = exact_bench(SweepSpec::new([0, 5, 5]))
        .with_entry("A", |size| ConstantOverheadFactory::new(size, OVERHEAD))
        .with_entry("B", |size| LinearOverheadFactory::new(size, PER_ELEMENT))
        .execute()
        .unwrap();

    assert_eq!(report.low_confidence_count(), 0);
    let rows: Vec<(usize, Vec<Option<u64>>)> = report
        .by_size()
        .into_iter()
        .map(|(size, group)| (size, group.iter().map(|s| s.bytes()).collect()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (0, vec![Some(32), Some(0)]),
            (5, vec![Some(32), Some(80)]),
            (5, vec![Some(32), Some(80)]),
        ]
    );
}
