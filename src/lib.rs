//! chaintable: a single-threaded, chained (open-hashing) key-value table
//! whose growth is driven explicitly by the caller rather than by the
//! table itself.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the capacity-management logic (when to grow, what size to
//!   pick, how to rehash) independent of the storage mechanics, so each
//!   piece can be reasoned about and tested on its own.
//! - Layers:
//!   - BucketAlloc (in `backend`): allocates and disposes of the
//!     bucket-pointer array under one of two lifetime regimes. `HeapAlloc`
//!     frees superseded arrays immediately; `ScopedAlloc` abandons them to
//!     a `bumpalo::Bump` arena that reclaims everything when the enclosing
//!     scope ends.
//!   - ChainTable<K, V, A, S>: the base table. Each entry is a Box-owned
//!     node carrying its key, value, a cached `u64` hash, and the link to
//!     the next node in its bucket's chain. Buckets are selected with
//!     `cached_hash % table_size`.
//!   - ResizableChainTable<K, V, A, S>: wraps a ChainTable (composition,
//!     not inheritance) and adds `maybe_grow`, the curated preferred-size
//!     sequence, `resize`, and the debug-only `verify` diagnostic.
//!
//! Constraints
//! - Single-threaded: no internal synchronization; `&mut` is the only
//!   mutation discipline. Any locking is the caller's job.
//! - Growth is never automatic. The collaborator owning insertion decides
//!   when to call `maybe_grow`, typically right after an insert.
//! - `table_size <= max_size` always; once the cap is reached, chains may
//!   grow without bound. That degrades lookups but never correctness.
//! - Allocation failure is fatal (the global allocator aborts); there is
//!   no fallible allocation path.
//!
//! Rehash invariants
//! - Each node stores the hash computed at insert time and indexing always
//!   uses the stored hash; `K: Hash` is never invoked during a resize, so
//!   a rehash cannot call back into user code.
//! - A resize moves every node's owning `Box` from its old chain to the
//!   head of its new chain. Nodes are never copied or aliased, and chain
//!   order after the merge is unspecified.
//! - The new array is fully populated before the table's array handle is
//!   swapped; the swap is the only externally visible mutation point.
//!
//! Notes and non-goals
//! - No shrinking heuristic; `resize` accepts a smaller size, but nothing
//!   calls it for you on deletion.
//! - No allocator regimes beyond heap and scoped-arena.
//! - Size preconditions (`initial_size <= max_size`, both at most
//!   `MAX_TABLE_SIZE`) are debug assertions. Violating them in release
//!   builds is a caller programming error with unspecified results.

mod backend;
mod chain_table;
mod resizable;

// Public surface
pub use backend::{BucketAlloc, HeapAlloc, ScopedAlloc};
pub use chain_table::{Bucket, ChainTable, Iter, Node};
pub use resizable::{ResizableChainTable, DEFAULT_LOAD_FACTOR, MAX_TABLE_SIZE};
