//! Tests for the set families.

use std::mem::size_of;

use membench_core::{MemoryProbe, QuiescencePolicy};

use super::*;
use crate::BOXED_ELEMENT_BYTES;

fn probe() -> MemoryProbe {
    MemoryProbe::current_thread().with_policy(QuiescencePolicy::new(0, 2, 8))
}

fn measure<F: ContainerFactory>(factory: F) -> u64 {
    probe().measure(&factory).unwrap().bytes
}

#[test]
fn test_every_family_holds_the_requested_elements() {
    for size in [0, 1, 2, 7, 8, 9, 40] {
        let unmodifiable = UnmodifiableHashSetFactory::new(size).build().unwrap();
        let frozen = FrozenHashSetFactory::new(size).build().unwrap();
        let sorted = SortedArraySetFactory::new(size).build().unwrap();
        let btree = BTreeSetFactory::new(size).build().unwrap();
        let small = InlineSmallSetFactory::new(size).build().unwrap();

        assert_eq!(unmodifiable.len(), size);
        assert_eq!(frozen.len(), size);
        assert_eq!(sorted.len(), size);
        assert_eq!(btree.len(), size);
        assert_eq!(small.len(), size);

        for value in 0..size as u32 {
            assert!(unmodifiable.contains(value));
            assert!(frozen.contains(value));
            assert!(sorted.contains(value));
            assert!(small.contains(value));
        }
        assert!(!unmodifiable.contains(size as u32));
        assert!(!sorted.contains(size as u32));
    }
}

#[test]
fn test_unmodifiable_uses_special_forms_for_tiny_sizes() {
    assert_eq!(
        UnmodifiableHashSetFactory::new(0).build().unwrap(),
        ReadOnlySet::Empty
    );
    assert!(matches!(
        UnmodifiableHashSetFactory::new(1).build().unwrap(),
        ReadOnlySet::Singleton(_)
    ));
    assert!(matches!(
        UnmodifiableHashSetFactory::new(2).build().unwrap(),
        ReadOnlySet::Hashed(_)
    ));
}

#[test]
fn test_inline_small_set_spills_past_capacity() {
    assert!(InlineSmallSetFactory::new(INLINE_CAPACITY).build().unwrap().is_inline());
    assert!(!InlineSmallSetFactory::new(INLINE_CAPACITY + 1)
        .build()
        .unwrap()
        .is_inline());
}

#[test]
fn test_inline_small_set_rejects_duplicates() {
    let mut set = InlineSmallSet::default();
    assert!(set.insert(crate::element(4)));
    assert!(!set.insert(crate::element(4)));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_sorted_array_footprint_is_exact() {
    let per_element = size_of::<Element>() as u64 + BOXED_ELEMENT_BYTES;
    for size in [0usize, 1, 5, 33] {
        assert_eq!(
            measure(SortedArraySetFactory::new(size)),
            size as u64 * per_element,
            "size {size}"
        );
    }
}

#[test]
fn test_tiny_unmodifiable_sets_cost_only_their_elements() {
    assert_eq!(measure(UnmodifiableHashSetFactory::new(0)), 0);
    assert_eq!(
        measure(UnmodifiableHashSetFactory::new(1)),
        BOXED_ELEMENT_BYTES
    );
}

#[test]
fn test_inline_small_set_avoids_buffer_allocation() {
    assert_eq!(
        measure(InlineSmallSetFactory::new(INLINE_CAPACITY)),
        INLINE_CAPACITY as u64 * BOXED_ELEMENT_BYTES
    );
    let spilled = INLINE_CAPACITY as u64 + 1;
    assert!(
        measure(InlineSmallSetFactory::new(INLINE_CAPACITY + 1))
            >= spilled * (BOXED_ELEMENT_BYTES + size_of::<Element>() as u64)
    );
}

#[test]
fn test_array_backed_footprint_is_monotonic() {
    for n in 1..=50 {
        let single = measure(SortedArraySetFactory::new(n));
        let double = measure(SortedArraySetFactory::new(2 * n));
        assert!(single <= double, "n = {n}: {single} > {double}");
    }
}

#[test]
fn test_hash_families_cover_their_elements() {
    for size in [2usize, 10, 100] {
        let floor = size as u64 * BOXED_ELEMENT_BYTES;
        assert!(measure(UnmodifiableHashSetFactory::new(size)) > floor);
        assert!(measure(FrozenHashSetFactory::new(size)) > floor);
        assert!(measure(BTreeSetFactory::new(size)) > floor);
    }
}

#[test]
fn test_size_limit_matches_element_range() {
    assert_eq!(crate::check_size(0), Ok(()));
    assert_eq!(crate::check_size(1), Ok(()));
    assert_eq!(crate::check_size(u32::MAX as usize), Ok(()));
}

#[cfg(target_pointer_width = "64")]
#[test]
fn test_oversized_sets_are_rejected_before_building() {
    let size = u32::MAX as usize + 2;
    assert_eq!(
        crate::check_size(u32::MAX as usize + 1),
        Ok(()),
        "the full u32 range is distinct"
    );
    assert_eq!(crate::check_size(size), Err(crate::TooManyElements(size)));

    let err = SortedArraySetFactory::new(size).build().unwrap_err();
    assert!(err.to_string().contains("exceeds the distinct element range"));
    assert!(UnmodifiableHashSetFactory::new(size).build().is_err());
    assert!(FrozenHashSetFactory::new(size).build().is_err());
    assert!(BTreeSetFactory::new(size).build().is_err());
    assert!(InlineSmallSetFactory::new(size).build().is_err());
}
