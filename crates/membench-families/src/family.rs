//! Named set families.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One set implementation under comparison.
///
/// # Example
///
/// ```
/// use membench_families::SetFamily;
///
/// let family: SetFamily = "sorted_array_set".parse().unwrap();
/// assert_eq!(family, SetFamily::SortedArraySet);
/// assert_eq!(family.label(), "SortedArraySet");
/// assert!("linked_set".parse::<SetFamily>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetFamily {
    UnmodifiableHashSet,
    FrozenHashSet,
    SortedArraySet,
    BTreeSet,
    InlineSmallSet,
}

impl SetFamily {
    /// Every family, in the order reports list them.
    pub fn all() -> [SetFamily; 5] {
        [
            SetFamily::UnmodifiableHashSet,
            SetFamily::FrozenHashSet,
            SetFamily::SortedArraySet,
            SetFamily::BTreeSet,
            SetFamily::InlineSmallSet,
        ]
    }

    /// Report label.
    pub fn label(&self) -> &'static str {
        match self {
            SetFamily::UnmodifiableHashSet => "UnmodifiableHashSet",
            SetFamily::FrozenHashSet => "FrozenHashSet",
            SetFamily::SortedArraySet => "SortedArraySet",
            SetFamily::BTreeSet => "BTreeSet",
            SetFamily::InlineSmallSet => "InlineSmallSet",
        }
    }

    /// Configuration / command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            SetFamily::UnmodifiableHashSet => "unmodifiable_hash_set",
            SetFamily::FrozenHashSet => "frozen_hash_set",
            SetFamily::SortedArraySet => "sorted_array_set",
            SetFamily::BTreeSet => "btree_set",
            SetFamily::InlineSmallSet => "inline_small_set",
        }
    }
}

impl fmt::Display for SetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for a family name that matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown set family: {0}")]
pub struct UnknownFamily(pub String);

impl FromStr for SetFamily {
    type Err = UnknownFamily;

    /// Accepts either the name or the label, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SetFamily::all()
            .into_iter()
            .find(|family| {
                family.name().eq_ignore_ascii_case(s) || family.label().eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| UnknownFamily(s.to_string()))
    }
}

#[cfg(test)]
#[path = "family_tests.rs"]
mod tests;
