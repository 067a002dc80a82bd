//! Retained-size probe.
//!
//! [`MemoryProbe::measure`] settles the heap, records a baseline, builds the
//! container, settles again while the container is still alive and reports the
//! difference. Settling is a bounded loop: one call to
//! [`HostHeap::force_reclaim`] is never assumed to be enough.
//!
//! Only one probe may measure at a time in a shared heap. Nothing in the process
//! should allocate persistent memory while [`MemoryProbe::measure`] runs.

use std::hint::black_box;

use tracing::trace;

use crate::error::{BoxError, MemBenchError, ProbeError, SettlePhase};
use crate::factory::ContainerFactory;
use crate::heap::{CountingHeap, HostHeap};

/// Bounds on the settle loop.
///
/// # Example
///
/// ```
/// use membench_core::QuiescencePolicy;
///
/// let policy = QuiescencePolicy::default()
///     .with_tolerance_bytes(0)
///     .with_max_passes(8);
///
/// assert_eq!(policy.tolerance_bytes(), 0);
/// assert_eq!(policy.stable_passes(), 2);
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuiescencePolicy {
    tolerance_bytes: u64,
    stable_passes: u32,
    max_passes: u32,
}

impl QuiescencePolicy {
    /// Creates a policy.
    pub fn new(tolerance_bytes: u64, stable_passes: u32, max_passes: u32) -> Self {
        Self {
            tolerance_bytes,
            stable_passes,
            max_passes,
        }
    }

    /// Sets the largest drift between consecutive readings counted as stable.
    pub fn with_tolerance_bytes(mut self, bytes: u64) -> Self {
        self.tolerance_bytes = bytes;
        self
    }

    /// Sets how many consecutive stable passes settle the heap.
    pub fn with_stable_passes(mut self, passes: u32) -> Self {
        self.stable_passes = passes;
        self
    }

    /// Sets the retry ceiling.
    pub fn with_max_passes(mut self, passes: u32) -> Self {
        self.max_passes = passes;
        self
    }

    pub fn tolerance_bytes(&self) -> u64 {
        self.tolerance_bytes
    }

    pub fn stable_passes(&self) -> u32 {
        self.stable_passes
    }

    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    /// Rejects policies that can never settle.
    pub fn validate(&self) -> Result<(), MemBenchError> {
        if self.stable_passes == 0 {
            return Err(MemBenchError::InvalidPolicy(
                "stable_passes must be at least 1".to_string(),
            ));
        }
        if self.max_passes < self.stable_passes {
            return Err(MemBenchError::InvalidPolicy(format!(
                "max_passes ({}) is smaller than stable_passes ({})",
                self.max_passes, self.stable_passes
            )));
        }
        Ok(())
    }
}

impl Default for QuiescencePolicy {
    fn default() -> Self {
        Self::new(64, 2, 16)
    }
}

/// How far a reading can be trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Confidence {
    #[default]
    Normal,
    /// The retained reading was below the baseline and was clamped to zero.
    NegativeDeltaClamped,
}

/// One successful probe reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Retained bytes, including any fixed wrapper overhead.
    pub bytes: u64,
    pub confidence: Confidence,
}

impl Measurement {
    /// Computes a measurement from the two settled readings.
    ///
    /// ```
    /// use membench_core::{Confidence, Measurement};
    ///
    /// assert_eq!(Measurement::from_readings(100, 180).bytes, 80);
    ///
    /// let clamped = Measurement::from_readings(100, 96);
    /// assert_eq!(clamped.bytes, 0);
    /// assert_eq!(clamped.confidence, Confidence::NegativeDeltaClamped);
    /// ```
    pub fn from_readings(baseline: u64, retained: u64) -> Self {
        match retained.checked_sub(baseline) {
            Some(bytes) => Self {
                bytes,
                confidence: Confidence::Normal,
            },
            None => Self {
                bytes: 0,
                confidence: Confidence::NegativeDeltaClamped,
            },
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::NegativeDeltaClamped
    }
}

// Outcome of one settle loop, logged after the measurement window closes.
#[derive(Debug, Clone, Copy)]
struct Settled {
    heap_bytes: u64,
    passes: u32,
}

/// Measures the retained footprint of freshly built containers.
#[derive(Debug)]
pub struct MemoryProbe<H = CountingHeap> {
    heap: H,
    policy: QuiescencePolicy,
}

impl MemoryProbe<CountingHeap> {
    /// Probe over the calling thread's counting heap with the default policy.
    pub fn current_thread() -> Self {
        Self::new(CountingHeap::current_thread())
    }
}

impl Default for MemoryProbe<CountingHeap> {
    fn default() -> Self {
        Self::current_thread()
    }
}

impl<H: HostHeap> MemoryProbe<H> {
    /// Creates a probe over `heap` with the default policy.
    pub fn new(heap: H) -> Self {
        Self {
            heap,
            policy: QuiescencePolicy::default(),
        }
    }

    /// Replaces the settle policy.
    pub fn with_policy(mut self, policy: QuiescencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &QuiescencePolicy {
        &self.policy
    }

    pub fn heap(&self) -> &H {
        &self.heap
    }

    /// Measures one container built by `factory`.
    ///
    /// # Errors
    ///
    /// [`ProbeError::Unstable`] if either settle window hits the retry ceiling,
    /// [`ProbeError::ConstructionFailed`] if the factory returns an error.
    pub fn measure<F: ContainerFactory>(&self, factory: &F) -> Result<Measurement, ProbeError> {
        self.measure_with(|| factory.build())
    }

    /// Measures the value produced by `construct`, called exactly once.
    pub fn measure_with<T, C>(&self, construct: C) -> Result<Measurement, ProbeError>
    where
        C: FnOnce() -> Result<T, BoxError>,
    {
        let baseline = self.settle(SettlePhase::Baseline)?;

        let retained = construct().map_err(ProbeError::ConstructionFailed)?;
        let after = self.settle(SettlePhase::Retained);
        black_box(&retained);
        drop(retained);
        let after = after?;

        let measurement = Measurement::from_readings(baseline.heap_bytes, after.heap_bytes);
        trace!(
            event = "probe_settled",
            baseline_bytes = baseline.heap_bytes,
            baseline_passes = baseline.passes,
            retained_bytes = after.heap_bytes,
            retained_passes = after.passes,
            bytes = measurement.bytes,
        );
        Ok(measurement)
    }

    // Reclaims until `stable_passes` consecutive readings stay within tolerance.
    // Must not allocate.
    fn settle(&self, phase: SettlePhase) -> Result<Settled, ProbeError> {
        self.heap.force_reclaim();
        let mut previous = self.heap.retained_heap_size();
        let mut stable = 0u32;
        let mut drift = 0u64;

        for pass in 1..=self.policy.max_passes {
            self.heap.force_reclaim();
            let current = self.heap.retained_heap_size();
            drift = current.abs_diff(previous);
            if drift <= self.policy.tolerance_bytes {
                stable += 1;
                if stable >= self.policy.stable_passes {
                    return Ok(Settled {
                        heap_bytes: current,
                        passes: pass,
                    });
                }
            } else {
                stable = 0;
            }
            previous = current;
        }

        Err(ProbeError::Unstable {
            phase,
            passes: self.policy.max_passes,
            drift_bytes: drift,
        })
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
