//! Host heap primitives.
//!
//! A probe needs exactly two things from its environment: a way to ask for
//! unreachable memory to be reclaimed, and a way to read the current live heap
//! size. [`HostHeap`] names those two calls. [`CountingHeap`] implements them on
//! top of [`CountingAllocator`], which must be installed as the process's
//! `#[global_allocator]`:
//!
//! ```
//! use membench_core::heap::CountingAllocator;
//!
//! #[global_allocator]
//! static ALLOCATOR: CountingAllocator = CountingAllocator::system();
//! # fn main() {}
//! ```
//!
//! The allocator tracks requested bytes (`Layout::size()`), not the slack the
//! underlying allocator adds to round a request up to its size class.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{MemBenchError, Result};

static INSTALLED: AtomicBool = AtomicBool::new(false);
static PROCESS_LIVE: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // Signed: memory allocated on one thread may be freed on another.
    static THREAD_LIVE: Cell<i64> = const { Cell::new(0) };
}

/// The two host calls a probe depends on.
pub trait HostHeap {
    /// Synchronous, best-effort request to reclaim unreachable memory.
    ///
    /// May need several calls before the heap is stable.
    fn force_reclaim(&self);

    /// Current live heap size in bytes.
    fn retained_heap_size(&self) -> u64;
}

impl<H: HostHeap + ?Sized> HostHeap for &H {
    fn force_reclaim(&self) {
        (**self).force_reclaim()
    }

    fn retained_heap_size(&self) -> u64 {
        (**self).retained_heap_size()
    }
}

/// Global allocator wrapper that counts live bytes.
///
/// Counters are process-wide statics, so only the instance installed with
/// `#[global_allocator]` is meaningful.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator<A = System> {
    inner: A,
}

impl CountingAllocator<System> {
    /// Counting wrapper around the system allocator.
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A> CountingAllocator<A> {
    /// Counting wrapper around an arbitrary allocator.
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[inline]
fn record_alloc(size: usize) {
    if !INSTALLED.load(Ordering::Relaxed) {
        INSTALLED.store(true, Ordering::Relaxed);
    }
    PROCESS_LIVE.fetch_add(size as u64, Ordering::Relaxed);
    let _ = THREAD_LIVE.try_with(|live| live.set(live.get() + size as i64));
}

#[inline]
fn record_dealloc(size: usize) {
    PROCESS_LIVE.fetch_sub(size as u64, Ordering::Relaxed);
    let _ = THREAD_LIVE.try_with(|live| live.set(live.get() - size as i64));
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        record_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            record_dealloc(layout.size());
            record_alloc(new_size);
        }
        new_ptr
    }
}

/// Returns true once any allocation has gone through a [`CountingAllocator`].
pub fn counting_allocator_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Live bytes across the whole process.
pub fn process_live_bytes() -> u64 {
    PROCESS_LIVE.load(Ordering::Relaxed)
}

/// Net bytes allocated minus freed by the calling thread.
///
/// Negative once the thread has freed memory that other threads allocated.
pub fn thread_live_bytes() -> i64 {
    THREAD_LIVE.try_with(Cell::get).unwrap_or(0)
}

// Shifts the signed thread counter into `u64` without changing its order, so
// differences between two readings stay exact whatever the sign.
fn thread_reading(live: i64) -> u64 {
    live.wrapping_sub(i64::MIN) as u64
}

/// Which allocations a [`CountingHeap`] reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeapScope {
    /// Only allocations made by the measuring thread.
    ///
    /// Readings are offset and only their differences are meaningful.
    #[default]
    Thread,
    /// Every allocation in the process.
    ///
    /// Nothing else may allocate persistent memory during a measurement.
    Process,
}

/// Reclaim hook run by [`CountingHeap::force_reclaim`].
pub type Reclaimer = Box<dyn Fn() + Send + Sync>;

/// Pushes this thread's deferred `crossbeam` epoch garbage to the global queue
/// and collects what is already safe to free.
pub fn flush_epoch_garbage() {
    crossbeam::epoch::pin().flush();
}

/// [`HostHeap`] backed by the [`CountingAllocator`] counters.
pub struct CountingHeap {
    scope: HeapScope,
    reclaimers: Vec<Reclaimer>,
}

impl CountingHeap {
    /// Creates a heap reading the given scope, with the epoch flush reclaimer.
    pub fn new(scope: HeapScope) -> Self {
        Self {
            scope,
            reclaimers: vec![Box::new(flush_epoch_garbage)],
        }
    }

    /// Heap reading the calling thread's allocations.
    pub fn current_thread() -> Self {
        Self::new(HeapScope::Thread)
    }

    /// Heap reading the whole process.
    pub fn process() -> Self {
        Self::new(HeapScope::Process)
    }

    /// Adds a reclaim hook, run after the existing ones.
    pub fn with_reclaimer(mut self, reclaimer: impl Fn() + Send + Sync + 'static) -> Self {
        self.reclaimers.push(Box::new(reclaimer));
        self
    }

    /// Removes every reclaim hook, including the default epoch flush.
    pub fn without_reclaimers(mut self) -> Self {
        self.reclaimers.clear();
        self
    }

    /// Returns the scope this heap reads.
    pub fn scope(&self) -> HeapScope {
        self.scope
    }

    /// Returns the number of registered reclaim hooks.
    pub fn reclaimer_count(&self) -> usize {
        self.reclaimers.len()
    }

    /// Fails unless a [`CountingAllocator`] is the global allocator.
    pub fn ensure_installed(&self) -> Result<()> {
        if counting_allocator_installed() {
            Ok(())
        } else {
            Err(MemBenchError::AllocatorNotInstalled)
        }
    }
}

impl Default for CountingHeap {
    fn default() -> Self {
        Self::current_thread()
    }
}

impl Debug for CountingHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingHeap")
            .field("scope", &self.scope)
            .field("reclaimers", &self.reclaimers.len())
            .finish()
    }
}

impl HostHeap for CountingHeap {
    fn force_reclaim(&self) {
        for reclaim in &self.reclaimers {
            reclaim();
        }
    }

    fn retained_heap_size(&self) -> u64 {
        match self.scope {
            HeapScope::Thread => thread_reading(thread_live_bytes()),
            HeapScope::Process => process_live_bytes(),
        }
    }
}
