//! membench core - heap probing primitives.
//!
//! This crate provides the pieces every memory-footprint measurement is built on:
//! - [`heap`]: the host heap interface and a counting global allocator
//! - [`ContainerFactory`]: builds one populated container of a fixed size
//! - [`MemoryProbe`]: settles the heap and measures a container's retained size
//! - the error taxonomy shared by the probe and the bench driver

pub mod error;
pub mod factory;
pub mod heap;
pub mod probe;

pub use error::{BoxError, MemBenchError, ProbeError, SettlePhase};
pub use factory::{factory_fn, ContainerFactory, FnFactory};
pub use heap::{CountingAllocator, CountingHeap, HeapScope, HostHeap};
pub use probe::{Confidence, Measurement, MemoryProbe, QuiescencePolicy};
