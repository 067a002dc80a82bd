//! Bench runner.

use std::any::Any;
use std::hint::black_box;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use membench_core::{
    ContainerFactory, CountingHeap, HostHeap, MemBenchError, Measurement, MemoryProbe, ProbeError,
};
use tracing::{debug, info, warn};

use crate::result::{BenchReport, CellOutcome, MeasurementSample};
use crate::sweep::SweepSpec;

// Measures one cell for a registered entry, hiding the container type.
trait CellRunner<H> {
    fn run_cell(&self, size: usize, probe: &MemoryProbe<H>, warmup_count: usize) -> CellOutcome;
}

struct FactoryEntry<M> {
    make: M,
}

impl<H, M, F> CellRunner<H> for FactoryEntry<M>
where
    H: HostHeap,
    M: Fn(usize) -> F,
    F: ContainerFactory,
{
    fn run_cell(&self, size: usize, probe: &MemoryProbe<H>, warmup_count: usize) -> CellOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<Measurement, ProbeError> {
            let factory = (self.make)(size);
            for _ in 0..warmup_count {
                let warm = factory.build().map_err(ProbeError::ConstructionFailed)?;
                drop(black_box(warm));
            }
            probe.measure(&factory)
        }));

        match attempt {
            Ok(Ok(measurement)) => CellOutcome::Measured(measurement),
            Ok(Err(ProbeError::Unstable {
                passes,
                drift_bytes,
                ..
            })) => CellOutcome::Unstable {
                passes,
                drift_bytes,
            },
            Ok(Err(ProbeError::ConstructionFailed(source))) => CellOutcome::ConstructionFailed {
                message: source.to_string(),
            },
            Err(payload) => CellOutcome::ConstructionFailed {
                message: panic_message(payload.as_ref()),
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

struct Entry<H> {
    label: String,
    runner: Box<dyn CellRunner<H>>,
}

/// Drives a [`MemoryProbe`] across (label, factory) entries and a size sweep.
///
/// Cells run strictly one after another on the calling thread. For every size
/// in sweep order, every entry in registration order builds a factory bound to
/// that size and is measured once.
///
/// # Example
///
/// ```
/// use membench_benchmark::{MemoryTestBench, SweepSpec};
/// use membench_core::{factory_fn, MemBenchError};
///
/// let bench = MemoryTestBench::run("Vec", SweepSpec::new([0, 4]))
///     .with_entry("Vec<u64>", |size| {
///         factory_fn(size, move || Ok((0..size as u64).collect::<Vec<_>>()))
///     });
/// assert_eq!(bench.labels(), vec!["Vec<u64>"]);
///
/// let empty = MemoryTestBench::run("Vec", SweepSpec::default());
/// assert_eq!(empty.execute().unwrap_err(), MemBenchError::EmptySweep);
/// ```
pub struct MemoryTestBench<H = CountingHeap> {
    target_kind: String,
    sweep: SweepSpec,
    probe: MemoryProbe<H>,
    warmup_count: usize,
    entries: Vec<Entry<H>>,
    duplicate_label: Option<String>,
}

impl MemoryTestBench<CountingHeap> {
    /// Creates a bench over the calling thread's counting heap.
    ///
    /// `target_kind` only labels the report.
    pub fn run(target_kind: impl Into<String>, sweep: SweepSpec) -> Self {
        Self::with_probe(target_kind, sweep, MemoryProbe::current_thread())
    }
}

impl<H: HostHeap> MemoryTestBench<H> {
    /// Creates a bench measuring with the given probe.
    pub fn with_probe(
        target_kind: impl Into<String>,
        sweep: SweepSpec,
        probe: MemoryProbe<H>,
    ) -> Self {
        Self {
            target_kind: target_kind.into(),
            sweep,
            probe,
            warmup_count: 1,
            entries: Vec::new(),
            duplicate_label: None,
        }
    }

    /// Sets the number of unmeasured builds per cell before the baseline.
    pub fn with_warmup_count(mut self, count: usize) -> Self {
        self.warmup_count = count;
        self
    }

    /// Registers an entry. `make` binds a factory to each swept size.
    pub fn with_entry<M, F>(mut self, label: impl Into<String>, make: M) -> Self
    where
        M: Fn(usize) -> F + 'static,
        F: ContainerFactory,
    {
        let label = label.into();
        if self.duplicate_label.is_none() && self.entries.iter().any(|e| e.label == label) {
            self.duplicate_label = Some(label.clone());
        }
        self.entries.push(Entry {
            label,
            runner: Box::new(FactoryEntry { make }),
        });
        self
    }

    pub fn target_kind(&self) -> &str {
        &self.target_kind
    }

    pub fn sweep(&self) -> &SweepSpec {
        &self.sweep
    }

    pub fn warmup_count(&self) -> usize {
        self.warmup_count
    }

    pub fn probe(&self) -> &MemoryProbe<H> {
        &self.probe
    }

    /// Entry labels in registration order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    // Preconditions checked before any measurement runs.
    fn check(&self) -> Result<(), MemBenchError> {
        if self.sweep.is_empty() {
            return Err(MemBenchError::EmptySweep);
        }
        if self.entries.is_empty() {
            return Err(MemBenchError::NoEntries);
        }
        if let Some(label) = &self.duplicate_label {
            return Err(MemBenchError::DuplicateLabel(label.clone()));
        }
        self.probe.policy().validate()
    }

    /// Measures every cell and returns the report.
    ///
    /// Per-cell failures are recorded in the report and never abort the run.
    ///
    /// # Errors
    ///
    /// Only precondition violations: an empty sweep, no entries, a duplicate
    /// label or an invalid quiescence policy.
    pub fn execute(&self) -> Result<BenchReport, MemBenchError> {
        self.check()?;

        info!(
            event = "bench_start",
            target_kind = self.target_kind.as_str(),
            size_count = self.sweep.len() as u64,
            entry_count = self.entries.len() as u64,
            warmup_count = self.warmup_count as u64,
        );

        let start = Instant::now();
        let labels = self.entries.iter().map(|e| e.label.clone()).collect();
        let mut report = BenchReport::new(&self.target_kind, labels, self.sweep.sizes().to_vec());

        for &size in self.sweep.sizes() {
            for entry in &self.entries {
                let outcome = entry.runner.run_cell(size, &self.probe, self.warmup_count);
                log_cell(&entry.label, size, &outcome);
                report.add_sample(MeasurementSample::new(&entry.label, size, outcome));
            }
        }

        report.duration = start.elapsed();

        info!(
            event = "bench_end",
            target_kind = self.target_kind.as_str(),
            duration_ms = report.duration.as_millis() as u64,
            measured = report.measured_count() as u64,
            unmeasured = report.unmeasured_count() as u64,
            failed = report.failed_count() as u64,
            low_confidence = report.low_confidence_count() as u64,
        );

        Ok(report)
    }
}

fn log_cell(label: &str, size: usize, outcome: &CellOutcome) {
    match outcome {
        CellOutcome::Measured(measurement) => debug!(
            event = "cell_measured",
            label,
            size = size as u64,
            bytes = measurement.bytes,
            low_confidence = measurement.is_low_confidence(),
        ),
        CellOutcome::Unstable {
            passes,
            drift_bytes,
        } => warn!(
            event = "cell_unstable",
            label,
            size = size as u64,
            passes = *passes as u64,
            drift_bytes = *drift_bytes,
        ),
        CellOutcome::ConstructionFailed { message } => warn!(
            event = "cell_failed",
            label,
            size = size as u64,
            message = message.as_str(),
        ),
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
