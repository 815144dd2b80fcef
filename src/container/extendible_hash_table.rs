use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Mutex;

/// A bucket is a small bounded multimap: at most `bucket_size` `(K, V)`
/// entries, tagged with the local depth of the directory slots that
/// reference it. Reinserting an existing key overwrites its value in place
/// rather than appending a duplicate entry, so bucket occupancy only ever
/// grows for genuinely new keys.
struct Bucket<K, V> {
    entries: Vec<(K, V)>,
    local_depth: u8,
    capacity: usize,
}

impl<K: PartialEq, V: PartialEq> Bucket<K, V> {
    fn new(capacity: usize, local_depth: u8) -> Self {
        Bucket {
            entries: Vec::with_capacity(capacity),
            local_depth,
            capacity,
        }
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    fn find(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Overwrites the value if `key` is already present; returns whether a
    /// prior entry existed (bucket count is unchanged either way).
    fn upsert(&mut self, key: K, value: V) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
            true
        } else {
            self.entries.push((key, value));
            false
        }
    }

    fn remove(&mut self, key: &K) -> bool {
        let len_before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != len_before
    }
}

struct Inner<K, V> {
    directory: Vec<usize>,
    buckets: Vec<Bucket<K, V>>,
    global_depth: u32,
    bucket_size: usize,
}

/// A dynamically-grown directory-and-bucket hash table mapping any key to
/// any value, generic so the buffer pool manager can use the same structure
/// for its `PageId -> FrameId` page table. Every public operation holds a
/// single mutex for its full duration; `find`/`remove` of an absent key
/// return `None`/`false` rather than erroring, since a miss is routine, not
/// exceptional.
pub struct ExtendibleHashTable<K, V, S = RandomState> {
    inner: Mutex<Inner<K, V>>,
    hasher: S,
}

impl<K, V> ExtendibleHashTable<K, V, RandomState>
where
    K: Hash + PartialEq,
    V: PartialEq,
{
    pub fn new(bucket_size: usize) -> Self {
        Self::with_hasher(bucket_size, RandomState::new())
    }
}

impl<K, V, S> ExtendibleHashTable<K, V, S>
where
    K: Hash + PartialEq,
    V: PartialEq,
    S: BuildHasher,
{
    pub fn with_hasher(bucket_size: usize, hasher: S) -> Self {
        let inner = Inner {
            directory: vec![0],
            buckets: vec![Bucket::new(bucket_size, 0)],
            global_depth: 0,
            bucket_size,
        };
        ExtendibleHashTable {
            inner: Mutex::new(inner),
            hasher,
        }
    }

    fn hash(&self, key: &K) -> u64 {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn index_of(hash: u64, global_depth: u32) -> usize {
        (hash & ((1u64 << global_depth) - 1)) as usize
    }

    pub fn find(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash(key);
        let inner = self.inner.lock().unwrap();
        let idx = Self::index_of(hash, inner.global_depth);
        let bucket = &inner.buckets[inner.directory[idx]];
        bucket.find(key).cloned()
    }

    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let mut inner = self.inner.lock().unwrap();
        let idx = Self::index_of(hash, inner.global_depth);
        let bucket_idx = inner.directory[idx];
        inner.buckets[bucket_idx].remove(key)
    }

    /// Inserts `(key, value)`, overwriting any existing value for `key`
    /// without changing the bucket count, splitting buckets (and doubling
    /// the directory if needed) until the target bucket has room.
    pub fn insert(&self, key: K, value: V)
    where
        K: Clone,
    {
        let mut inner = self.inner.lock().unwrap();
        loop {
            let hash = self.hash(&key);
            let idx = Self::index_of(hash, inner.global_depth);
            let bucket_idx = inner.directory[idx];
            if !inner.buckets[bucket_idx].is_full() || inner.buckets[bucket_idx].find(&key).is_some() {
                inner.buckets[bucket_idx].upsert(key, value);
                return;
            }
            self.split(&mut inner, bucket_idx);
        }
    }

    /// Grows the directory (if the full bucket's local depth equals the
    /// global depth) then splits the bucket in two, rehashing its entries
    /// by the newly-significant bit.
    fn split(&self, inner: &mut Inner<K, V>, bucket_idx: usize) {
        let local_depth = inner.buckets[bucket_idx].local_depth;
        if local_depth as u32 == inner.global_depth {
            let old_len = inner.directory.len();
            inner.directory.extend_from_within(..);
            debug_assert_eq!(inner.directory.len(), old_len * 2);
            inner.global_depth += 1;
        }

        let mask = 1u64 << local_depth;
        let new_depth = local_depth + 1;
        let mut sibling = Bucket::new(inner.bucket_size, new_depth);
        let mut retained = Bucket::new(inner.bucket_size, new_depth);
        for (k, v) in inner.buckets[bucket_idx].entries.drain(..) {
            let hash = self.hash(&k);
            if hash & mask == 0 {
                retained.entries.push((k, v));
            } else {
                sibling.entries.push((k, v));
            }
        }
        inner.buckets[bucket_idx] = retained;
        inner.buckets.push(sibling);
        let sibling_idx = inner.buckets.len() - 1;

        for (dir_idx, slot) in inner.directory.iter_mut().enumerate() {
            if *slot == bucket_idx {
                if (dir_idx as u64) & mask != 0 {
                    *slot = sibling_idx;
                }
            }
        }
    }

    pub fn global_depth(&self) -> u32 {
        self.inner.lock().unwrap().global_depth
    }

    pub fn local_depth(&self, bucket_index: usize) -> u8 {
        let inner = self.inner.lock().unwrap();
        let bucket_idx = inner.directory[bucket_index];
        inner.buckets[bucket_idx].local_depth
    }

    pub fn num_buckets(&self) -> usize {
        self.inner.lock().unwrap().buckets.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_and_find_round_trip() {
        let table = ExtendibleHashTable::<i32, i32>::new(2);
        for i in 0..100 {
            table.insert(i, i + 1);
        }
        for i in 0..100 {
            assert_eq!(table.find(&i), Some(i + 1));
        }
    }

    #[test]
    fn reinsert_overwrites_without_growing_bucket_count() {
        let table = ExtendibleHashTable::<i32, i32>::new(2);
        table.insert(1, 10);
        let buckets_before = table.num_buckets();
        table.insert(1, 20);
        assert_eq!(table.num_buckets(), buckets_before);
        assert_eq!(table.find(&1), Some(20));
    }

    #[test]
    fn remove_absent_key_returns_false() {
        let table = ExtendibleHashTable::<i32, i32>::new(2);
        assert!(!table.remove(&1));
        table.insert(1, 2);
        assert!(table.remove(&1));
        assert_eq!(table.find(&1), None);
    }

    #[test]
    fn depth_invariants_hold_after_many_splits() {
        let table = ExtendibleHashTable::<i32, i32>::new(2);
        for i in 0..4 {
            table.insert(i, i);
        }
        assert!(table.global_depth() >= 2);
        for i in 0..4 {
            assert_eq!(table.find(&i), Some(i));
        }
        let inner = table.inner.lock().unwrap();
        for (dir_idx, &bucket_idx) in inner.directory.iter().enumerate() {
            let local_depth = inner.buckets[bucket_idx].local_depth as u32;
            assert!(inner.global_depth >= local_depth);
            let low_mask = (1u64 << local_depth) - 1;
            for (other_idx, &other_bucket) in inner.directory.iter().enumerate() {
                if (dir_idx as u64) & low_mask == (other_idx as u64) & low_mask
                    && other_bucket == bucket_idx
                {
                    assert_eq!(bucket_idx, other_bucket);
                }
            }
        }
    }
}
