//! Global allocator wrapper that keeps live-allocation counters.
//!
//! Install it in a binary to feed `heap_alloc` and `heap_objects`:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: CountingAllocator = CountingAllocator::new();
//! ```

use crate::stats::types::AllocatorStats;
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct CountingAllocator<A = System> {
    inner: A,
    live_bytes: AtomicU64,
    live_objects: AtomicU64,
    total_allocs: AtomicU64,
    total_frees: AtomicU64,
}

impl CountingAllocator<System> {
    pub const fn new() -> Self {
        Self::with_allocator(System)
    }
}

impl Default for CountingAllocator<System> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> CountingAllocator<A> {
    /// Wraps an arbitrary allocator.
    pub const fn with_allocator(inner: A) -> Self {
        Self {
            inner,
            live_bytes: AtomicU64::new(0),
            live_objects: AtomicU64::new(0),
            total_allocs: AtomicU64::new(0),
            total_frees: AtomicU64::new(0),
        }
    }

    /// Current counter values. Each counter is read independently, so a
    /// concurrent allocation may be reflected in some fields and not others.
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            live_objects: self.live_objects.load(Ordering::Relaxed),
            total_allocs: self.total_allocs.load(Ordering::Relaxed),
            total_frees: self.total_frees.load(Ordering::Relaxed),
        }
    }

    fn record_alloc(&self, size: usize) {
        self.live_bytes.fetch_add(size as u64, Ordering::Relaxed);
        self.live_objects.fetch_add(1, Ordering::Relaxed);
        self.total_allocs.fetch_add(1, Ordering::Relaxed);
    }

    fn record_free(&self, size: usize) {
        self.live_bytes.fetch_sub(size as u64, Ordering::Relaxed);
        self.live_objects.fetch_sub(1, Ordering::Relaxed);
        self.total_frees.fetch_add(1, Ordering::Relaxed);
    }
}

unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc(layout);
        if !ptr.is_null() {
            self.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = self.inner.alloc_zeroed(layout);
        if !ptr.is_null() {
            self.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.inner.dealloc(ptr, layout);
        self.record_free(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = self.inner.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            // Object count is unchanged; only the byte total moves.
            if new_size >= layout.size() {
                self.live_bytes
                    .fetch_add((new_size - layout.size()) as u64, Ordering::Relaxed);
            } else {
                self.live_bytes
                    .fetch_sub((layout.size() - new_size) as u64, Ordering::Relaxed);
            }
        }
        new_ptr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_free_are_counted() {
        let alloc = CountingAllocator::new();
        let layout = Layout::from_size_align(64, 8).unwrap();

        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());

            let stats = alloc.stats();
            assert_eq!(stats.live_bytes, 64);
            assert_eq!(stats.live_objects, 1);
            assert_eq!(stats.total_allocs, 1);

            alloc.dealloc(ptr, layout);
        }

        let stats = alloc.stats();
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.live_objects, 0);
        assert_eq!(stats.total_frees, 1);
    }

    #[test]
    fn test_realloc_moves_bytes_not_objects() {
        let alloc = CountingAllocator::new();
        let layout = Layout::from_size_align(32, 8).unwrap();

        unsafe {
            let ptr = alloc.alloc_zeroed(layout);
            let grown = alloc.realloc(ptr, layout, 128);
            assert!(!grown.is_null());
            assert_eq!(alloc.stats().live_bytes, 128);
            assert_eq!(alloc.stats().live_objects, 1);

            let grown_layout = Layout::from_size_align(128, 8).unwrap();
            let shrunk = alloc.realloc(grown, grown_layout, 16);
            assert_eq!(alloc.stats().live_bytes, 16);

            alloc.dealloc(shrunk, Layout::from_size_align(16, 8).unwrap());
        }

        let stats = alloc.stats();
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.live_objects, 0);
        assert_eq!(stats.total_allocs, 1);
    }
}
