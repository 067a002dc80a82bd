//! Memory-footprint bench driver for membench.
//!
//! This crate drives a [`membench_core::MemoryProbe`] across a matrix of
//! (label, factory) entries and container sizes, and formats the results.
//!
//! # Overview
//!
//! - [`SweepSpec`] lists the sizes to measure, in order
//! - [`MemoryTestBench`] registers entries and runs every cell
//! - [`BenchReport`] holds one [`MeasurementSample`] per cell, grouped by size
//!   then by label
//! - [`CsvExporter`] and [`MarkdownReport`] turn a report into text
//!
//! Failing cells are recorded, never fatal. A run with nothing to measure is
//! rejected before it starts.
//!
//! # Example
//!
//! ```
//! use membench_benchmark::{CsvExporter, MemoryTestBench, SweepSpec};
//! use membench_core::factory_fn;
//!
//! let bench = MemoryTestBench::run("Vec", SweepSpec::new([0, 8]))
//!     .with_entry("Vec<u64>", |size| {
//!         factory_fn(size, move || Ok(vec![0u64; size]))
//!     });
//!
//! let report = bench.execute().unwrap();
//! assert_eq!(report.cells(), vec![("Vec<u64>", 0), ("Vec<u64>", 8)]);
//! println!("{}", CsvExporter::to_string(&report));
//! ```
//!
//! Byte counts are only meaningful when the binary installs
//! [`membench_core::CountingAllocator`] as its global allocator.

mod report;
mod result;
mod runner;
mod sweep;

pub use report::{CsvExporter, MarkdownReport};
pub use result::{AggregationPolicy, BenchReport, CellKind, CellOutcome, MeasurementSample};
pub use runner::MemoryTestBench;
pub use sweep::SweepSpec;

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: membench_core::CountingAllocator =
    membench_core::CountingAllocator::system();
