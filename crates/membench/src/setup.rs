//! Wiring families and configuration into a bench.

use membench_benchmark::{MemoryTestBench, SweepSpec};
use membench_config::{BenchConfig, ConfigError};
use membench_core::{CountingHeap, HostHeap, MemoryProbe};
use membench_families::{
    BTreeSetFactory, FrozenHashSetFactory, InlineSmallSetFactory, SetFamily,
    SortedArraySetFactory, UnknownFamily, UnmodifiableHashSetFactory,
};
use thiserror::Error;

/// Target kind used when the configuration names none.
pub const DEFAULT_TARGET_KIND: &str = "Set";

/// Errors from turning a [`BenchConfig`] into a bench.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    UnknownFamily(#[from] UnknownFamily),
}

/// Adds `family` to `bench` as an entry labelled with [`SetFamily::label`].
pub fn register_family<H: HostHeap>(
    bench: MemoryTestBench<H>,
    family: SetFamily,
) -> MemoryTestBench<H> {
    let label = family.label();
    match family {
        SetFamily::UnmodifiableHashSet => bench.with_entry(label, UnmodifiableHashSetFactory::new),
        SetFamily::FrozenHashSet => bench.with_entry(label, FrozenHashSetFactory::new),
        SetFamily::SortedArraySet => bench.with_entry(label, SortedArraySetFactory::new),
        SetFamily::BTreeSet => bench.with_entry(label, BTreeSetFactory::new),
        SetFamily::InlineSmallSet => bench.with_entry(label, InlineSmallSetFactory::new),
    }
}

/// Adds each family in order.
pub fn register_families<H: HostHeap>(
    bench: MemoryTestBench<H>,
    families: impl IntoIterator<Item = SetFamily>,
) -> MemoryTestBench<H> {
    families.into_iter().fold(bench, register_family)
}

/// Builds a bench from `config`.
///
/// An empty sweep falls back to [`SweepSpec::standard`] and an empty family
/// list to [`SetFamily::all`].
pub fn bench_from_config(config: &BenchConfig) -> Result<MemoryTestBench, SetupError> {
    let sizes = config.sweep_sizes()?;
    let sweep = if config.sweep.is_empty() {
        SweepSpec::standard()
    } else {
        SweepSpec::from(sizes)
    };

    let families = if config.families.is_empty() {
        SetFamily::all().to_vec()
    } else {
        config
            .families
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<SetFamily>, _>>()?
    };

    let probe = MemoryProbe::new(CountingHeap::new(config.heap_scope()))
        .with_policy(config.quiescence.policy()?);
    let target_kind = config.target_kind.as_deref().unwrap_or(DEFAULT_TARGET_KIND);

    let bench = MemoryTestBench::with_probe(target_kind, sweep, probe)
        .with_warmup_count(config.warmup_count());
    Ok(register_families(bench, families))
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
