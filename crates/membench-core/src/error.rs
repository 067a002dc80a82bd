//! Error types for membench

use std::error::Error;
use std::fmt;

use thiserror::Error;

/// Boxed error returned by a container factory that failed to build.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Precondition errors raised before any measurement begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemBenchError {
    /// The sweep contains no sizes.
    #[error("sweep is empty: at least one size is required")]
    EmptySweep,

    /// No (label, factory) entries were registered.
    #[error("no entries registered: at least one factory is required")]
    NoEntries,

    /// Two entries were registered under the same label.
    #[error("duplicate entry label: {0}")]
    DuplicateLabel(String),

    /// A quiescence policy that can never settle.
    #[error("invalid quiescence policy: {0}")]
    InvalidPolicy(String),

    /// The counting allocator is not the global allocator of this process.
    #[error("counting allocator is not installed as the global allocator")]
    AllocatorNotInstalled,
}

/// Which settling window failed to reach quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePhase {
    /// Before the factory runs.
    Baseline,
    /// After the factory returned, with its result still alive.
    Retained,
}

impl fmt::Display for SettlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlePhase::Baseline => f.write_str("baseline"),
            SettlePhase::Retained => f.write_str("retained"),
        }
    }
}

/// Failure of a single probe measurement.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Heap size kept drifting beyond tolerance for every allowed pass.
    #[error("heap did not settle during {phase} window after {passes} passes (last drift {drift_bytes} bytes)")]
    Unstable {
        phase: SettlePhase,
        passes: u32,
        drift_bytes: u64,
    },

    /// The factory under test returned an error.
    #[error("construction failed: {0}")]
    ConstructionFailed(BoxError),
}

impl ProbeError {
    /// Returns true for [`ProbeError::Unstable`].
    pub fn is_unstable(&self) -> bool {
        matches!(self, ProbeError::Unstable { .. })
    }
}

/// Result type alias for membench precondition checks.
pub type Result<T> = std::result::Result<T, MemBenchError>;
