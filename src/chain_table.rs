//! ChainTable: the chained storage layer with per-node cached hashes.

use crate::backend::{BucketAlloc, HeapAlloc};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;

/// One entry in a bucket's chain. The hash computed at insert time is kept
/// alongside the key so a rehash never re-invokes `K: Hash`.
pub struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) next: Option<Box<Node<K, V>>>,
}

/// One slot of the bucket array: the head of a (possibly empty) chain.
pub type Bucket<K, V> = Option<Box<Node<K, V>>>;

/// A chained hash table with a fixed bucket count.
///
/// `ChainTable` never resizes on its own; pair it with
/// [`ResizableChainTable`](crate::ResizableChainTable) for capacity
/// management. The bucket for a key is always `cached_hash % table_size`.
pub struct ChainTable<K, V, A = HeapAlloc, S = RandomState>
where
    A: BucketAlloc<K, V>,
{
    pub(crate) alloc: A,
    pub(crate) hasher: S,
    pub(crate) buckets: A::Array,
    pub(crate) len: usize,
}

impl<K, V> ChainTable<K, V>
where
    K: Eq + Hash,
{
    /// Heap-backed table with `table_size` buckets and the default hasher.
    pub fn new(table_size: usize) -> Self {
        Self::with_hasher_in(HeapAlloc, Default::default(), table_size)
    }
}

impl<K, V, A, S> ChainTable<K, V, A, S>
where
    K: Eq + Hash,
    A: BucketAlloc<K, V>,
    S: BuildHasher,
{
    /// Build a table on an explicit backend and hasher.
    ///
    /// `table_size` must be at least 1 (checked in debug builds only).
    pub fn with_hasher_in(alloc: A, hasher: S, table_size: usize) -> Self {
        debug_assert!(table_size > 0, "bucket array needs at least one slot");
        let buckets = alloc.allocate(table_size);
        Self {
            alloc,
            hasher,
            buckets,
            len: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    pub fn table_size(&self) -> usize {
        self.buckets.len()
    }

    /// Insert or replace. Returns the previous value when the key was
    /// already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let index = self.bucket_index(hash);
        {
            let mut cur = self.buckets[index].as_deref_mut();
            while let Some(node) = cur {
                if node.hash == hash && node.key == key {
                    return Some(mem::replace(&mut node.value, value));
                }
                cur = node.next.as_deref_mut();
            }
        }
        let node = Box::new(Node {
            key,
            value,
            hash,
            next: self.buckets[index].take(),
        });
        self.buckets[index] = Some(node);
        self.len += 1;
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let mut cur = self.buckets[self.bucket_index(hash)].as_deref();
        while let Some(node) = cur {
            if node.hash == hash && node.key.borrow() == key {
                return Some(&node.value);
            }
            cur = node.next.as_deref();
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let index = self.bucket_index(hash);
        let mut cur = self.buckets[index].as_deref_mut();
        while let Some(node) = cur {
            if node.hash == hash && node.key.borrow() == key {
                return Some(&mut node.value);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Remove a key, returning its value if present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let index = self.bucket_index(hash);

        // Detach the chain, pop nodes off it, and relink the keepers at the
        // head. Chain order is unspecified, so the reversal is fine.
        let mut chain = self.buckets[index].take();
        let mut removed = None;
        while let Some(mut node) = chain {
            chain = node.next.take();
            if removed.is_none() && node.hash == hash && node.key.borrow() == key {
                removed = Some(node.value);
            } else {
                node.next = self.buckets[index].take();
                self.buckets[index] = Some(node);
            }
        }
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Iterate over all entries. Order is unspecified and changes across
    /// resizes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            node: None,
        }
    }
}

impl<K, V, A, S> Drop for ChainTable<K, V, A, S>
where
    A: BucketAlloc<K, V>,
{
    fn drop(&mut self) {
        // Drain each chain iteratively so dropping a long chain cannot
        // recurse through the `next` links and overflow the stack.
        for slot in self.buckets.iter_mut() {
            let mut node = slot.take();
            while let Some(mut boxed) = node {
                node = boxed.next.take();
            }
        }
    }
}

/// Iterator over `(&K, &V)` pairs of a [`ChainTable`].
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Bucket<K, V>>,
    node: Option<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.node {
                self.node = node.next.as_deref();
                return Some((&node.key, &node.value));
            }
            match self.buckets.next() {
                Some(slot) => self.node = slot.as_deref(),
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Invariant: insert returns None for a new key and the old value when
    /// replacing; `len` counts distinct keys only.
    #[test]
    fn insert_replace_and_len() {
        let mut t: ChainTable<String, i32> = ChainTable::new(7);
        assert_eq!(t.insert("a".to_string(), 1), None);
        assert_eq!(t.insert("b".to_string(), 2), None);
        assert_eq!(t.len(), 2);

        assert_eq!(t.insert("a".to_string(), 10), Some(1));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("a"), Some(&10));
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: ChainTable<String, i32> = ChainTable::new(7);
        t.insert("hello".to_string(), 1);
        assert!(t.contains_key("hello"));
        assert!(!t.contains_key("world"));
        assert_eq!(t.get("hello"), Some(&1));
        assert_eq!(t.get("world"), None);
    }

    /// Invariant: `get_mut` mutations persist and are visible via `get`.
    #[test]
    fn get_mut_persists() {
        let mut t: ChainTable<String, i32> = ChainTable::new(3);
        t.insert("k".to_string(), 5);
        *t.get_mut("k").unwrap() += 7;
        assert_eq!(t.get("k"), Some(&12));
    }

    /// Invariant: lookups resolve correct entries under full hash
    /// collisions; removal from a shared chain keeps the other entries.
    #[test]
    fn collision_chain_lookup_and_remove() {
        use core::hash::{BuildHasher, Hasher};

        #[derive(Clone, Default)]
        struct ConstBuildHasher;
        struct ConstHasher;
        impl BuildHasher for ConstBuildHasher {
            type Hasher = ConstHasher;
            fn build_hasher(&self) -> Self::Hasher {
                ConstHasher
            }
        }
        impl Hasher for ConstHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 {
                0 // force all keys into the same bucket
            }
        }

        let mut t: ChainTable<String, i32, HeapAlloc, ConstBuildHasher> =
            ChainTable::with_hasher_in(HeapAlloc, ConstBuildHasher, 5);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            t.insert((*k).to_string(), i as i32);
        }
        assert_eq!(t.len(), 4);
        assert_eq!(t.get("c"), Some(&2));

        assert_eq!(t.remove("b"), Some(1));
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("b"), None);
        for (k, v) in [("a", 0), ("c", 2), ("d", 3)] {
            assert_eq!(t.get(k), Some(&v));
        }
    }

    /// Invariant: remove on an absent key is a no-op; removing the only
    /// entry empties the table and allows reinsertion.
    #[test]
    fn remove_absent_and_reinsert() {
        let mut t: ChainTable<String, i32> = ChainTable::new(7);
        assert_eq!(t.remove("nope"), None);

        t.insert("k".to_string(), 1);
        assert_eq!(t.remove("k"), Some(1));
        assert!(t.is_empty());
        assert_eq!(t.remove("k"), None);

        t.insert("k".to_string(), 2);
        assert_eq!(t.get("k"), Some(&2));
    }

    /// Invariant: iteration yields each live entry exactly once.
    #[test]
    fn iter_yields_each_entry_once() {
        let mut t: ChainTable<String, i32> = ChainTable::new(3);
        let keys = ["k1", "k2", "k3", "k4", "k5"];
        for (i, k) in keys.iter().enumerate() {
            t.insert((*k).to_string(), i as i32);
        }
        let seen: BTreeSet<String> = t.iter().map(|(k, _v)| k.clone()).collect();
        let expected: BTreeSet<String> = keys.iter().map(|s| (*s).to_string()).collect();
        assert_eq!(seen, expected);
        assert_eq!(t.iter().count(), keys.len());
    }

    /// Dropping a table whose single bucket holds a very long chain must
    /// not overflow the stack (iterative drop).
    #[test]
    fn drop_long_chain_is_iterative() {
        let mut t: ChainTable<u32, u32> = ChainTable::new(1);
        for i in 0..30_000u32 {
            t.insert(i, i);
        }
        drop(t);
    }

    /// Scoped regime: the table works identically and node values drop
    /// normally when the table is dropped inside the bump scope.
    #[test]
    fn scoped_table_basic_ops() {
        use bumpalo::Bump;
        use std::rc::Rc;

        let payload = Rc::new(());
        let bump = Bump::new();
        {
            let mut t: ChainTable<u32, Rc<()>, crate::ScopedAlloc<'_>> =
                ChainTable::with_hasher_in(crate::ScopedAlloc::new(&bump), Default::default(), 5);
            for i in 0..64u32 {
                t.insert(i, payload.clone());
            }
            assert_eq!(t.len(), 64);
            assert_eq!(Rc::strong_count(&payload), 65);
            assert!(t.get(&33).is_some());
        }
        // All node-held clones were dropped with the table.
        assert_eq!(Rc::strong_count(&payload), 1);
    }
}
