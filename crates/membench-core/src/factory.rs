//! Container factories.

use std::fmt::{self, Debug};

use crate::error::BoxError;

/// Builds one populated container of a size fixed at factory construction.
///
/// Every call must return a fresh, independently owned container, and must not
/// keep references into containers returned by earlier calls.
///
/// # Example
///
/// ```
/// use membench_core::{BoxError, ContainerFactory};
///
/// struct VecFactory {
///     size: usize,
/// }
///
/// impl ContainerFactory for VecFactory {
///     type Container = Vec<u64>;
///
///     fn size(&self) -> usize {
///         self.size
///     }
///
///     fn build(&self) -> Result<Vec<u64>, BoxError> {
///         Ok((0..self.size as u64).collect())
///     }
/// }
///
/// let factory = VecFactory { size: 3 };
/// assert_eq!(factory.build().unwrap(), vec![0, 1, 2]);
/// ```
pub trait ContainerFactory {
    /// The container type produced.
    type Container;

    /// Number of elements each built container holds.
    fn size(&self) -> usize;

    /// Builds a new container.
    fn build(&self) -> Result<Self::Container, BoxError>;
}

/// [`ContainerFactory`] backed by a closure.
pub struct FnFactory<F> {
    size: usize,
    build: F,
}

impl<F, T> ContainerFactory for FnFactory<F>
where
    F: Fn() -> Result<T, BoxError>,
{
    type Container = T;

    fn size(&self) -> usize {
        self.size
    }

    fn build(&self) -> Result<T, BoxError> {
        (self.build)()
    }
}

impl<F> Debug for FnFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFactory").field("size", &self.size).finish()
    }
}

/// Wraps a closure as a factory for containers of `size` elements.
///
/// ```
/// use membench_core::{factory_fn, ContainerFactory};
///
/// let factory = factory_fn(4, || Ok(vec![0u8; 4]));
/// assert_eq!(factory.size(), 4);
/// assert_eq!(factory.build().unwrap().len(), 4);
/// ```
pub fn factory_fn<F, T>(size: usize, build: F) -> FnFactory<F>
where
    F: Fn() -> Result<T, BoxError>,
{
    FnFactory { size, build }
}
