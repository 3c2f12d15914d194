//! ResizableChainTable: growth policy and rehash atop [`ChainTable`].

use crate::backend::{BucketAlloc, HeapAlloc};
use crate::chain_table::{ChainTable, Iter};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;

/// Load factor used by [`ResizableChainTable::maybe_grow`].
pub const DEFAULT_LOAD_FACTOR: usize = 8;

/// Upper bound on `initial_size` and `max_size`. Keeps the `2 * len`
/// multiply in the growth heuristic well inside the index domain.
pub const MAX_TABLE_SIZE: usize = 0x3fff_ffff;

const RESIZE_FACTOR: usize = 2;

/// Resize targets: odd primes that roughly double per step. The range is
/// deliberately sparse between 40423 and 307261 so a table that is already
/// large is not resized over and over.
const PREFERRED_SIZES: [usize; 18] = [
    107, 1009, 2017, 4049, 5051, 10103, 20201, 40423, 76831, 307261, 614563, 1228891, 2457733,
    4915219, 9830479, 19660831, 39321619, 78643219,
];

/// Where the scan starts when the caller expects a large dataset; skips
/// the small sizes 107..=40423 entirely.
const LARGE_SIZES_START: usize = 8;

/// Smallest preferred size `>= requested`, or `requested` itself when it
/// exceeds the largest tabulated size. The raw fallback forgoes the
/// good-distribution property for very large tables; callers accepted that
/// tradeoff when they let the table get this big.
fn preferred_size(requested: usize, use_large_table_sizes: bool) -> usize {
    let start = if use_large_table_sizes {
        LARGE_SIZES_START
    } else {
        0
    };
    PREFERRED_SIZES[start..]
        .iter()
        .copied()
        .find(|&size| size >= requested)
        .unwrap_or(requested)
}

/// A [`ChainTable`] wrapped with caller-driven capacity management.
///
/// The wrapper never grows on its own: call [`maybe_grow`] after inserting
/// (or [`resize`] directly) and the table stays at whatever size you left
/// it. `table_size` never exceeds the `max_size` fixed at construction.
///
/// [`maybe_grow`]: ResizableChainTable::maybe_grow
/// [`resize`]: ResizableChainTable::resize
pub struct ResizableChainTable<K, V, A = HeapAlloc, S = RandomState>
where
    A: BucketAlloc<K, V>,
{
    table: ChainTable<K, V, A, S>,
    max_size: usize,
}

impl<K, V> ResizableChainTable<K, V>
where
    K: Eq + Hash,
{
    /// Heap-backed table with the default hasher.
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        Self::with_hasher_in(HeapAlloc, Default::default(), initial_size, max_size)
    }
}

impl<K, V, A, S> ResizableChainTable<K, V, A, S>
where
    K: Eq + Hash,
    A: BucketAlloc<K, V>,
    S: BuildHasher,
{
    /// Build a table on an explicit backend and hasher.
    ///
    /// Requires `0 < initial_size <= max_size <= MAX_TABLE_SIZE`. The
    /// bounds are checked in debug builds only; violating them in release
    /// builds has unspecified results.
    pub fn with_hasher_in(alloc: A, hasher: S, initial_size: usize, max_size: usize) -> Self {
        debug_assert!(initial_size <= max_size);
        debug_assert!(
            max_size <= MAX_TABLE_SIZE,
            "sizes above {:#x} could overflow the grow arithmetic",
            MAX_TABLE_SIZE
        );
        Self {
            table: ChainTable::with_hasher_in(alloc, hasher, initial_size),
            max_size,
        }
    }

    /// Grow with the default load factor and the full size sequence.
    ///
    /// Shorthand for `maybe_grow_with(DEFAULT_LOAD_FACTOR, false)`.
    pub fn maybe_grow(&mut self) -> bool {
        self.maybe_grow_with(DEFAULT_LOAD_FACTOR, false)
    }

    /// Resize when the table is overloaded. Returns whether it resized.
    ///
    /// Never grows past `max_size`, and returns false immediately once
    /// `table_size` has reached it. Otherwise the table grows exactly when
    /// `len / table_size` (integer division) strictly exceeds
    /// `load_factor`, to the smallest preferred size that fits twice the
    /// current entry count, capped at `max_size`. Pass
    /// `use_large_table_sizes` when the dataset is expected to be large;
    /// the scan then skips the small preferred sizes entirely.
    pub fn maybe_grow_with(&mut self, load_factor: usize, use_large_table_sizes: bool) -> bool {
        let old_size = self.table.table_size();
        if old_size >= self.max_size {
            return false;
        }
        if self.table.len() / old_size > load_factor {
            let requested = RESIZE_FACTOR * self.table.len();
            let new_size = preferred_size(requested, use_large_table_sizes).min(self.max_size);
            self.resize(new_size);
            true
        } else {
            false
        }
    }

    /// Rehash every entry into a fresh bucket array of `new_size` slots.
    ///
    /// Each node's owning box is moved to the head of its new chain, so no
    /// entry is copied, lost, or duplicated; chain order afterwards is
    /// unspecified. The old array is disposed of through the allocation
    /// backend. `new_size` must be at least 1 (checked in debug builds);
    /// it is not clamped to `max_size` here; only `maybe_grow` enforces
    /// the cap.
    pub fn resize(&mut self, new_size: usize) {
        debug_assert!(new_size > 0, "bucket array needs at least one slot");
        let table = &mut self.table;
        let mut new_buckets = table.alloc.allocate(new_size);
        for slot in table.buckets.iter_mut() {
            let mut node = slot.take();
            while let Some(mut boxed) = node {
                node = boxed.next.take();
                let index = (boxed.hash % new_size as u64) as usize;
                boxed.next = new_buckets[index].take();
                new_buckets[index] = Some(boxed);
            }
        }
        let old = mem::replace(&mut table.buckets, new_buckets);
        table.alloc.free(old);
    }

    /// Maximum chain length over all buckets; 0 on an empty table. A value
    /// far above the load factor means the hash function is misbehaving.
    /// Debug builds only.
    #[cfg(debug_assertions)]
    pub fn verify(&self) -> usize {
        let mut max_chain = 0;
        for slot in self.table.buckets.iter() {
            let mut count = 0;
            let mut cur = slot.as_deref();
            while let Some(node) = cur {
                count += 1;
                cur = node.next.as_deref();
            }
            max_chain = max_chain.max(count);
        }
        max_chain
    }

    /// The growth ceiling fixed at construction.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn table_size(&self) -> usize {
        self.table.table_size()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Insert or replace; see [`ChainTable::insert`]. Call [`maybe_grow`]
    /// afterwards if you want the load factor enforced.
    ///
    /// [`maybe_grow`]: ResizableChainTable::maybe_grow
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(key)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }
}
