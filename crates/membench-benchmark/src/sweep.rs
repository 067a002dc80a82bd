//! Size sweeps.

/// Ordered sizes to measure.
///
/// Sizes are measured in the given order; duplicates are kept and measured
/// again.
///
/// # Example
///
/// ```
/// use membench_benchmark::SweepSpec;
///
/// let sweep = SweepSpec::range(0, 2).then(SweepSpec::stepped(10, 30, 10));
/// assert_eq!(sweep.sizes(), &[0, 1, 2, 10, 20, 30]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSpec {
    sizes: Vec<usize>,
}

impl SweepSpec {
    /// Creates a sweep from explicit sizes.
    pub fn new(sizes: impl IntoIterator<Item = usize>) -> Self {
        sizes.into_iter().collect()
    }

    /// Inclusive range `from..=to`.
    pub fn range(from: usize, to: usize) -> Self {
        Self::stepped(from, to, 1)
    }

    /// Inclusive range `from..=to` visited every `step` sizes.
    ///
    /// A zero step is treated as 1.
    pub fn stepped(from: usize, to: usize, step: usize) -> Self {
        Self {
            sizes: (from..=to).step_by(step.max(1)).collect(),
        }
    }

    /// The sweep used for the set comparisons: every size up to 9, then every
    /// tenth size up to 100.
    ///
    /// ```
    /// use membench_benchmark::SweepSpec;
    ///
    /// let sweep = SweepSpec::standard();
    /// assert_eq!(sweep.len(), 20);
    /// assert_eq!(sweep.sizes()[9..12], [9, 10, 20]);
    /// ```
    pub fn standard() -> Self {
        Self::range(0, 9).then(Self::stepped(10, 100, 10))
    }

    /// Appends another sweep after this one.
    pub fn then(mut self, other: SweepSpec) -> Self {
        self.sizes.extend(other.sizes);
        self
    }

    /// Returns the sizes in measurement order.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl From<Vec<usize>> for SweepSpec {
    fn from(sizes: Vec<usize>) -> Self {
        Self { sizes }
    }
}

impl FromIterator<usize> for SweepSpec {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            sizes: iter.into_iter().collect(),
        }
    }
}
