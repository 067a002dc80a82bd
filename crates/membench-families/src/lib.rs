//! Container families measured by membench.
//!
//! - [`sets`] - set implementations over boxed elements, one factory each
//! - [`family`] - the [`SetFamily`] registry naming them
//! - [`synthetic`] - factories with known footprints, for testing the harness
//!
//! Every family stores the same element representation, [`Element`], so that
//! differences between readings come from the container design alone.

pub mod family;
pub mod sets;
pub mod synthetic;

use thiserror::Error;

pub use family::{SetFamily, UnknownFamily};
pub use sets::{
    BTreeSetFactory, FrozenHashSet, FrozenHashSetFactory, InlineSmallSet, InlineSmallSetFactory,
    ReadOnlySet, SortedArraySet, SortedArraySetBuilder, SortedArraySetFactory,
    UnmodifiableHashSetFactory,
};

/// Element stored by every set family: a heap-allocated integer.
///
/// The box is part of what is measured, not noise to subtract.
pub type Element = Box<u32>;

/// Heap bytes each [`Element`] costs on its own.
pub const BOXED_ELEMENT_BYTES: u64 = std::mem::size_of::<u32>() as u64;

/// Boxes the element for position `index`.
///
/// Indices past `u32::MAX` would collide, so factories reject such sizes with
/// [`check_size`] before building.
pub fn element(index: usize) -> Element {
    debug_assert!(u32::try_from(index).is_ok(), "element index {index} exceeds u32");
    Box::new(index as u32)
}

/// Error for a set size whose elements cannot all be distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("set of {0} elements exceeds the distinct element range")]
pub struct TooManyElements(pub usize);

/// Checks that `size` elements fit the [`Element`] range without repeating.
pub fn check_size(size: usize) -> Result<(), TooManyElements> {
    match size.checked_sub(1).map(u32::try_from) {
        Some(Err(_)) => Err(TooManyElements(size)),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: membench_core::CountingAllocator =
    membench_core::CountingAllocator::system();
