//! Set families.
//!
//! Each factory fills its container with the elements `0..size`.

use std::collections::{BTreeSet, HashSet};

use membench_core::{BoxError, ContainerFactory};
use smallvec::SmallVec;

use crate::{check_size, element, Element};

/// Read-only view over a hash set, with dedicated empty and singleton forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOnlySet {
    Empty,
    Singleton(Element),
    Hashed(HashSet<Element>),
}

impl ReadOnlySet {
    pub fn len(&self) -> usize {
        match self {
            ReadOnlySet::Empty => 0,
            ReadOnlySet::Singleton(_) => 1,
            ReadOnlySet::Hashed(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, value: u32) -> bool {
        match self {
            ReadOnlySet::Empty => false,
            ReadOnlySet::Singleton(only) => **only == value,
            ReadOnlySet::Hashed(set) => set.contains(&value),
        }
    }
}

/// Builds a presized `HashSet` and hands it out read-only.
///
/// Sizes 0 and 1 use the allocation-free empty form and the singleton form.
#[derive(Debug, Clone, Copy)]
pub struct UnmodifiableHashSetFactory {
    size: usize,
}

impl UnmodifiableHashSetFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for UnmodifiableHashSetFactory {
    type Container = ReadOnlySet;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<ReadOnlySet, BoxError> {
        check_size(self.size)?;
        Ok(match self.size {
            0 => ReadOnlySet::Empty,
            1 => ReadOnlySet::Singleton(element(0)),
            n => {
                let mut set = HashSet::with_capacity(n);
                for i in 0..n {
                    set.insert(element(i));
                }
                ReadOnlySet::Hashed(set)
            }
        })
    }
}

/// Hash set trimmed to its contents and frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenHashSet {
    inner: HashSet<Element>,
}

impl FrozenHashSet {
    /// Shrinks `set` to fit and freezes it.
    pub fn freeze(mut set: HashSet<Element>) -> Self {
        set.shrink_to_fit();
        Self { inner: set }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.inner.contains(&value)
    }
}

/// Fills a presized mutable hash set, then freezes it.
#[derive(Debug, Clone, Copy)]
pub struct FrozenHashSetFactory {
    size: usize,
}

impl FrozenHashSetFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for FrozenHashSetFactory {
    type Container = FrozenHashSet;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<FrozenHashSet, BoxError> {
        check_size(self.size)?;
        let mut set = HashSet::with_capacity(self.size);
        for i in 0..self.size {
            set.insert(element(i));
        }
        Ok(FrozenHashSet::freeze(set))
    }
}

/// Immutable set stored as a sorted boxed slice.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortedArraySet {
    elements: Box<[Element]>,
}

impl SortedArraySet {
    /// Starts a builder.
    pub fn builder() -> SortedArraySetBuilder {
        SortedArraySetBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.elements
            .binary_search_by(|probe| (**probe).cmp(&value))
            .is_ok()
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.elements.iter().map(|e| **e)
    }
}

/// Collects elements in any order; `build` sorts and dedups them.
///
/// ```
/// use membench_families::{element, SortedArraySet};
///
/// let mut builder = SortedArraySet::builder();
/// builder.add(element(3)).add(element(1)).add(element(3));
/// let set = builder.build();
/// assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
/// ```
#[derive(Debug, Default)]
pub struct SortedArraySetBuilder {
    pending: Vec<Element>,
}

impl SortedArraySetBuilder {
    pub fn add(&mut self, value: Element) -> &mut Self {
        self.pending.push(value);
        self
    }

    pub fn build(mut self) -> SortedArraySet {
        self.pending.sort_unstable();
        self.pending.dedup();
        SortedArraySet {
            elements: self.pending.into_boxed_slice(),
        }
    }
}

/// Fills a [`SortedArraySetBuilder`] element by element.
#[derive(Debug, Clone, Copy)]
pub struct SortedArraySetFactory {
    size: usize,
}

impl SortedArraySetFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for SortedArraySetFactory {
    type Container = SortedArraySet;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<SortedArraySet, BoxError> {
        check_size(self.size)?;
        let mut builder = SortedArraySet::builder();
        for i in 0..self.size {
            builder.add(element(i));
        }
        Ok(builder.build())
    }
}

/// Builds a `BTreeSet`.
#[derive(Debug, Clone, Copy)]
pub struct BTreeSetFactory {
    size: usize,
}

impl BTreeSetFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for BTreeSetFactory {
    type Container = BTreeSet<Element>;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<BTreeSet<Element>, BoxError> {
        check_size(self.size)?;
        Ok((0..self.size).map(element).collect())
    }
}

/// Inline capacity of [`InlineSmallSet`].
pub const INLINE_CAPACITY: usize = 8;

/// Sorted set keeping up to [`INLINE_CAPACITY`] elements inline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineSmallSet {
    elements: SmallVec<[Element; INLINE_CAPACITY]>,
}

impl InlineSmallSet {
    /// Inserts `value`, keeping elements sorted. Returns false if present.
    pub fn insert(&mut self, value: Element) -> bool {
        match self.elements.binary_search(&value) {
            Ok(_) => false,
            Err(at) => {
                self.elements.insert(at, value);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.elements
            .binary_search_by(|probe| (**probe).cmp(&value))
            .is_ok()
    }

    /// True while the elements still live in the inline buffer.
    pub fn is_inline(&self) -> bool {
        !self.elements.spilled()
    }
}

/// Builds an [`InlineSmallSet`].
#[derive(Debug, Clone, Copy)]
pub struct InlineSmallSetFactory {
    size: usize,
}

impl InlineSmallSetFactory {
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl ContainerFactory for InlineSmallSetFactory {
    type Container = InlineSmallSet;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<InlineSmallSet, BoxError> {
        check_size(self.size)?;
        let mut set = InlineSmallSet::default();
        for i in 0..self.size {
            set.insert(element(i));
        }
        Ok(set)
    }
}

#[cfg(test)]
#[path = "sets_tests.rs"]
mod tests;
