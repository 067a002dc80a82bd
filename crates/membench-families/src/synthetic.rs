//! Factories with known footprints.
//!
//! These exercise the harness itself: their retained sizes are exact under the
//! counting allocator, and two of them fail on purpose.

use membench_core::{BoxError, ContainerFactory};

/// Allocates the same `overhead_bytes` whatever its size.
#[derive(Debug, Clone, Copy)]
pub struct ConstantOverheadFactory {
    size: usize,
    overhead_bytes: usize,
}

impl ConstantOverheadFactory {
    pub fn new(size: usize, overhead_bytes: usize) -> Self {
        Self {
            size,
            overhead_bytes,
        }
    }
}

impl ContainerFactory for ConstantOverheadFactory {
    type Container = Box<[u8]>;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<Box<[u8]>, BoxError> {
        Ok(vec![0u8; self.overhead_bytes].into_boxed_slice())
    }
}

/// Allocates exactly `bytes_per_element` per element.
#[derive(Debug, Clone, Copy)]
pub struct LinearOverheadFactory {
    size: usize,
    bytes_per_element: usize,
}

impl LinearOverheadFactory {
    pub fn new(size: usize, bytes_per_element: usize) -> Self {
        Self {
            size,
            bytes_per_element,
        }
    }
}

impl ContainerFactory for LinearOverheadFactory {
    type Container = Box<[u8]>;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<Box<[u8]>, BoxError> {
        Ok(vec![0u8; self.size * self.bytes_per_element].into_boxed_slice())
    }
}

/// Always returns an error.
#[derive(Debug, Clone, Copy)]
pub struct FailingFactory {
    size: usize,
}

impl FailingFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for FailingFactory {
    type Container = ();

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<(), BoxError> {
        Err(format!("refusing to build {} elements", self.size).into())
    }
}

/// Always panics.
#[derive(Debug, Clone, Copy)]
pub struct PanickingFactory {
    size: usize,
}

impl PanickingFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for PanickingFactory {
    type Container = ();

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<(), BoxError> {
        panic!("cannot build {} elements", self.size)
    }
}
