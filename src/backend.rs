//! Bucket-array allocation backends: explicit heap vs. scoped arena.

use crate::chain_table::Bucket;
use bumpalo::boxed::Box as BumpBox;
use bumpalo::Bump;
use core::ops::{Deref, DerefMut};

/// Allocation backend for the bucket-pointer array.
///
/// The regime is fixed for the table's lifetime: a table built on
/// [`HeapAlloc`] frees every superseded array immediately, while one built
/// on [`ScopedAlloc`] abandons superseded arrays to the arena and lets the
/// enclosing scope reclaim them in bulk.
///
/// Allocation failure is fatal in both regimes (the global allocator
/// aborts); `allocate` has no error path.
pub trait BucketAlloc<K, V> {
    /// Owned handle to one bucket array. Dereferences to the slots.
    type Array: Deref<Target = [Bucket<K, V>]> + DerefMut;

    /// Allocate an array of `table_size` empty bucket heads.
    fn allocate(&self, table_size: usize) -> Self::Array;

    /// Dispose of a superseded array per the regime's rules.
    fn free(&self, array: Self::Array);
}

/// Global-heap regime: superseded arrays are released immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapAlloc;

impl<K, V> BucketAlloc<K, V> for HeapAlloc {
    type Array = Box<[Bucket<K, V>]>;

    fn allocate(&self, table_size: usize) -> Self::Array {
        (0..table_size).map(|_| None).collect()
    }

    fn free(&self, array: Self::Array) {
        drop(array);
    }
}

/// Scoped/arena regime backed by a [`bumpalo::Bump`].
///
/// `free` is effectively a no-op: the bump never returns memory for
/// individual allocations, so a superseded array stays resident until the
/// `Bump` itself is dropped. Use this when the whole table lives inside a
/// well-delimited scope and intermediate arrays are not worth freeing one
/// by one.
#[derive(Debug, Clone, Copy)]
pub struct ScopedAlloc<'b> {
    bump: &'b Bump,
}

impl<'b> ScopedAlloc<'b> {
    pub fn new(bump: &'b Bump) -> Self {
        Self { bump }
    }
}

impl<'b, K: 'b, V: 'b> BucketAlloc<K, V> for ScopedAlloc<'b> {
    type Array = BumpBox<'b, [Bucket<K, V>]>;

    fn allocate(&self, table_size: usize) -> Self::Array {
        let slots = self.bump.alloc_slice_fill_with(table_size, |_| None);
        // SAFETY: `slots` is freshly allocated from the bump and this is its
        // only handle, so boxing it grants exclusive ownership.
        unsafe { BumpBox::from_raw(slots) }
    }

    fn free(&self, array: Self::Array) {
        // Dropping the box runs the (empty) slot destructors but leaves the
        // memory in the bump until the scope ends.
        drop(array);
    }
}
