//! Bench result types.

use std::time::Duration;

use membench_core::{Confidence, Measurement};

/// What happened in one (label, size) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
    /// The probe produced a reading.
    Measured(Measurement),
    /// The heap never settled; no number is reported.
    Unstable { passes: u32, drift_bytes: u64 },
    /// The factory under test failed or panicked.
    ConstructionFailed { message: String },
}

/// Taxonomy of cell outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Measured,
    MeasurementUnstable,
    ConstructionFailed,
}

impl CellKind {
    /// Short status word used by the report formatters.
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Measured => "measured",
            CellKind::MeasurementUnstable => "unmeasured",
            CellKind::ConstructionFailed => "failed",
        }
    }
}

/// One measured cell of a bench run.
///
/// # Example
///
/// ```
/// use membench_benchmark::{CellKind, CellOutcome, MeasurementSample};
/// use membench_core::Measurement;
///
/// let sample = MeasurementSample::new(
///     "SortedArraySet",
///     5,
///     CellOutcome::Measured(Measurement::from_readings(0, 60)),
/// );
/// assert_eq!(sample.bytes(), Some(60));
/// assert_eq!(sample.kind(), CellKind::Measured);
/// assert!(!sample.is_low_confidence());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementSample {
    pub label: String,
    pub size: usize,
    pub outcome: CellOutcome,
}

impl MeasurementSample {
    pub fn new(label: impl Into<String>, size: usize, outcome: CellOutcome) -> Self {
        Self {
            label: label.into(),
            size,
            outcome,
        }
    }

    /// Retained bytes, or `None` for unmeasured and failed cells.
    pub fn bytes(&self) -> Option<u64> {
        match &self.outcome {
            CellOutcome::Measured(measurement) => Some(measurement.bytes),
            _ => None,
        }
    }

    pub fn kind(&self) -> CellKind {
        match self.outcome {
            CellOutcome::Measured(_) => CellKind::Measured,
            CellOutcome::Unstable { .. } => CellKind::MeasurementUnstable,
            CellOutcome::ConstructionFailed { .. } => CellKind::ConstructionFailed,
        }
    }

    /// True for a measured cell whose negative delta was clamped.
    pub fn is_low_confidence(&self) -> bool {
        matches!(
            self.outcome,
            CellOutcome::Measured(Measurement {
                confidence: Confidence::NegativeDeltaClamped,
                ..
            })
        )
    }

    /// Bytes usable under `policy`.
    pub fn bytes_under(&self, policy: AggregationPolicy) -> Option<u64> {
        match policy {
            AggregationPolicy::ExcludeFlagged if self.is_low_confidence() => None,
            _ => self.bytes(),
        }
    }
}

/// Whether clamped-negative readings take part in comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregationPolicy {
    /// Flagged readings count as their clamped value.
    #[default]
    IncludeFlagged,
    /// Flagged readings are left out.
    ExcludeFlagged,
}

/// All samples from one `execute` call.
///
/// Samples are ordered by size in sweep order, then by label in registration
/// order. Each swept size contributes one sample per label.
#[derive(Debug, Clone)]
pub struct BenchReport {
    /// Descriptive target kind from the bench header.
    pub target_kind: String,
    /// Entry labels in registration order.
    pub labels: Vec<String>,
    /// Swept sizes in measurement order.
    pub sizes: Vec<usize>,
    pub samples: Vec<MeasurementSample>,
    /// Wall time of the whole run.
    pub duration: Duration,
}

impl BenchReport {
    /// Creates an empty report.
    pub fn new(target_kind: impl Into<String>, labels: Vec<String>, sizes: Vec<usize>) -> Self {
        Self {
            target_kind: target_kind.into(),
            labels,
            sizes,
            samples: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Adds a sample to the report.
    pub fn add_sample(&mut self, sample: MeasurementSample) {
        self.samples.push(sample);
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the (label, size) cell keys in report order.
    pub fn cells(&self) -> Vec<(&str, usize)> {
        self.samples
            .iter()
            .map(|s| (s.label.as_str(), s.size))
            .collect()
    }

    /// Groups samples by sweep position, one group per swept size.
    ///
    /// A size repeated in the sweep yields one group per occurrence.
    ///
    /// # Example
    ///
    /// ```
    /// use membench_benchmark::{BenchReport, CellOutcome, MeasurementSample};
    /// use membench_core::Measurement;
    ///
    /// let mut report = BenchReport::new("Set", vec!["A".into(), "B".into()], vec![0, 1]);
    /// for size in [0, 1] {
    ///     for label in ["A", "B"] {
    ///         let outcome = CellOutcome::Measured(Measurement::from_readings(0, size as u64));
    ///         report.add_sample(MeasurementSample::new(label, size, outcome));
    ///     }
    /// }
    ///
    /// let groups = report.by_size();
    /// assert_eq!(groups.len(), 2);
    /// assert_eq!(groups[1].0, 1);
    /// assert_eq!(groups[1].1.len(), 2);
    ///
    /// let mut repeated = BenchReport::new("Set", vec!["A".into()], vec![3, 3]);
    /// for _ in 0..2 {
    ///     let outcome = CellOutcome::Measured(Measurement::from_readings(0, 12));
    ///     repeated.add_sample(MeasurementSample::new("A", 3, outcome));
    /// }
    /// assert_eq!(repeated.by_size().len(), 2);
    /// ```
    pub fn by_size(&self) -> Vec<(usize, &[MeasurementSample])> {
        if self.labels.is_empty() {
            return Vec::new();
        }
        self.sizes
            .iter()
            .copied()
            .zip(self.samples.chunks(self.labels.len()))
            .collect()
    }

    /// First sample for `label` at `size`.
    pub fn sample(&self, label: &str, size: usize) -> Option<&MeasurementSample> {
        self.samples
            .iter()
            .find(|s| s.label == label && s.size == size)
    }

    /// Retained bytes for `label` at `size`, if measured.
    pub fn bytes(&self, label: &str, size: usize) -> Option<u64> {
        self.sample(label, size).and_then(MeasurementSample::bytes)
    }

    fn count_kind(&self, kind: CellKind) -> usize {
        self.samples.iter().filter(|s| s.kind() == kind).count()
    }

    pub fn measured_count(&self) -> usize {
        self.count_kind(CellKind::Measured)
    }

    pub fn unmeasured_count(&self) -> usize {
        self.count_kind(CellKind::MeasurementUnstable)
    }

    pub fn failed_count(&self) -> usize {
        self.count_kind(CellKind::ConstructionFailed)
    }

    pub fn low_confidence_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_low_confidence()).count()
    }

    /// Label with the fewest retained bytes at `size`.
    ///
    /// Ties go to the label registered first.
    pub fn smallest_at(&self, size: usize, policy: AggregationPolicy) -> Option<&str> {
        let mut best: Option<(&str, u64)> = None;
        for sample in self.samples.iter().filter(|s| s.size == size) {
            let Some(bytes) = sample.bytes_under(policy) else {
                continue;
            };
            if best.map_or(true, |(_, b)| bytes < b) {
                best = Some((sample.label.as_str(), bytes));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Retained bytes divided by element count, for sizes above zero.
    pub fn bytes_per_element(
        &self,
        label: &str,
        size: usize,
        policy: AggregationPolicy,
    ) -> Option<f64> {
        if size == 0 {
            return None;
        }
        self.sample(label, size)
            .and_then(|s| s.bytes_under(policy))
            .map(|bytes| bytes as f64 / size as f64)
    }
}
