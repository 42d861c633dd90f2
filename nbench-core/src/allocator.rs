//! Allocation Tracking
//!
//! A `GlobalAlloc` wrapper around the system allocator that counts bytes and
//! allocation calls, split by size class. Install it in the benchmark binary:
//!
//! ```ignore
//! #[global_allocator]
//! static GLOBAL: nbench::TrackingAllocator = nbench::TrackingAllocator;
//! ```
//!
//! The counters only ever grow, which is what the memory collectors want: a
//! trial's value is the difference between its first and last reading.

use crate::metrics::SizeClass;
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Largest allocation counted as [`SizeClass::Small`]
pub const SMALL_ALLOCATION_LIMIT: usize = 256;

/// Largest allocation counted as [`SizeClass::Medium`]
pub const MEDIUM_ALLOCATION_LIMIT: usize = 64 * 1024;

static TOTAL_BYTES: AtomicU64 = AtomicU64::new(0);
static TOTAL_COUNT: AtomicU64 = AtomicU64::new(0);
static SMALL_COUNT: AtomicU64 = AtomicU64::new(0);
static MEDIUM_COUNT: AtomicU64 = AtomicU64::new(0);
static LARGE_COUNT: AtomicU64 = AtomicU64::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Counting allocator; delegates every call to [`System`]
pub struct TrackingAllocator;

/// Size class of a block of `size` bytes
fn size_class_of(size: usize) -> SizeClass {
    if size <= SMALL_ALLOCATION_LIMIT {
        SizeClass::Small
    } else if size <= MEDIUM_ALLOCATION_LIMIT {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

/// What a `realloc` from `old_size` to `new_size` adds: the grown bytes, and
/// one allocation call in the class of the resulting block. Shrinking adds nothing.
fn realloc_growth(old_size: usize, new_size: usize) -> Option<(usize, SizeClass)> {
    (new_size > old_size).then(|| (new_size - old_size, size_class_of(new_size)))
}

impl TrackingAllocator {
    #[inline(always)]
    fn record(size: usize) {
        Self::record_call(size as u64, size_class_of(size));
    }

    #[inline(always)]
    fn record_call(bytes: u64, class: SizeClass) {
        INSTALLED.store(true, Ordering::Relaxed);
        TOTAL_BYTES.fetch_add(bytes, Ordering::Relaxed);
        TOTAL_COUNT.fetch_add(1, Ordering::Relaxed);
        let counter = match class {
            SizeClass::Small => &SMALL_COUNT,
            SizeClass::Medium => &MEDIUM_COUNT,
            SizeClass::Large | SizeClass::All => &LARGE_COUNT,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        Self::record(layout.size());
        // SAFETY: forwarded unchanged from the caller's contract
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        Self::record(layout.size());
        // SAFETY: forwarded unchanged from the caller's contract
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: forwarded unchanged from the caller's contract
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if let Some((grown, class)) = realloc_growth(layout.size(), new_size) {
            Self::record_call(grown as u64, class);
        }
        // SAFETY: forwarded unchanged from the caller's contract
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

/// Whether the tracking allocator has served at least one allocation
pub fn tracking_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Cumulative `(bytes, allocation calls)` since process start
pub fn allocation_totals() -> (u64, u64) {
    (
        TOTAL_BYTES.load(Ordering::Relaxed),
        TOTAL_COUNT.load(Ordering::Relaxed),
    )
}

/// Cumulative allocation calls within one concrete size class.
///
/// `SizeClass::All` sums every class.
pub fn allocations_in(class: SizeClass) -> u64 {
    match class {
        SizeClass::Small => SMALL_COUNT.load(Ordering::Relaxed),
        SizeClass::Medium => MEDIUM_COUNT.load(Ordering::Relaxed),
        SizeClass::Large => LARGE_COUNT.load(Ordering::Relaxed),
        SizeClass::All => SizeClass::CONCRETE.iter().map(|c| allocations_in(*c)).sum(),
    }
}
