//! membench - retained heap footprint benchmarking for Rust containers
//!
//! Measures how many heap bytes a container keeps alive after it is built,
//! across a sweep of element counts, and compares implementations side by
//! side.
//!
//! # Example
//!
//! ```rust
//! use membench::prelude::*;
//!
//! let bench = register_families(
//!     MemoryTestBench::run("Set", SweepSpec::standard()),
//!     [SetFamily::SortedArraySet, SetFamily::BTreeSet],
//! );
//! assert_eq!(bench.labels(), vec!["SortedArraySet", "BTreeSet"]);
//! ```
//!
//! Readings are only meaningful when [`CountingAllocator`] is the process's
//! global allocator:
//!
//! ```rust,ignore
//! #[global_allocator]
//! static ALLOCATOR: membench::CountingAllocator = membench::CountingAllocator::system();
//! ```

// Heap primitives and the probe
pub use membench_core::{
    factory_fn, BoxError, Confidence, ContainerFactory, CountingAllocator, CountingHeap,
    FnFactory, HeapScope, HostHeap, Measurement, MemBenchError, MemoryProbe, ProbeError,
    QuiescencePolicy, SettlePhase,
};

// Bench driver and reports
pub use membench_benchmark::{
    AggregationPolicy, BenchReport, CellKind, CellOutcome, CsvExporter, MarkdownReport,
    MeasurementSample, MemoryTestBench, SweepSpec,
};

// Families under test
pub use membench_families::{SetFamily, UnknownFamily};

// Configuration
pub use membench_config::{BenchConfig, ConfigError, OutputFormat};

pub mod families {
    //! The container families registered by [`register_family`](crate::register_family).
    pub use membench_families::*;
}

#[cfg(feature = "console")]
pub use membench_console as console;

mod setup;
pub use setup::{bench_from_config, register_families, register_family, SetupError};

pub mod prelude {
    pub use super::{bench_from_config, register_families, register_family};
    pub use super::{
        factory_fn, ContainerFactory, CountingAllocator, HeapScope, MemoryProbe, QuiescencePolicy,
    };
    pub use super::{
        AggregationPolicy, BenchReport, CsvExporter, MarkdownReport, MemoryTestBench, SweepSpec,
    };
    pub use super::{BenchConfig, SetFamily};
}

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: membench_core::CountingAllocator =
    membench_core::CountingAllocator::system();
