//! Sorted mapping of index key to bucket
//!
//! # Invariants
//!
//! - No two buckets share an index key (BTreeMap)
//! - No empty bucket is ever stored; a bucket leaves with its last entry
//! - Buckets are `Arc`-shared between tree versions and copied only when a
//!   writer finds one still referenced by a reader

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use super::bucket::{Bucket, Sequence};
use super::record::{IndexedRecord, RecordKey};
use crate::scan::{Direction, ScanDescriptor};

/// One version of the ordered index
#[derive(Debug)]
pub struct IndexTree<K, E> {
    buckets: BTreeMap<K, Arc<Bucket<E>>>,
    len: usize,
}

impl<K, E> Default for IndexTree<K, E> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }
}

// Shallow: buckets are shared with the copy, not duplicated
impl<K: Clone, E> Clone for IndexTree<K, E> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            len: self.len,
        }
    }
}

impl<K: Ord, E> IndexTree<K, E> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for `key`
    pub fn bucket(&self, key: &K) -> Option<&Arc<Bucket<E>>> {
        self.buckets.get(key)
    }

    /// Number of distinct index keys
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries across all buckets
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when the tree holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First bucket at or beyond `from` in `direction`.
    ///
    /// For ascending scans `from` is a lower bound, for descending scans an
    /// upper bound. A one-sided range never panics, whatever `from` is.
    pub fn next_group(
        &self,
        from: Bound<&K>,
        direction: Direction,
    ) -> Option<(&K, &Arc<Bucket<E>>)> {
        match direction {
            Direction::Ascending => self.buckets.range((from, Bound::Unbounded)).next(),
            Direction::Descending => self.buckets.range((Bound::Unbounded, from)).next_back(),
        }
    }
}

impl<K: Ord + Clone, E: IndexedRecord + Clone> IndexTree<K, E> {
    /// Append `entry` to the bucket for `key`, creating the bucket if needed.
    ///
    /// Returns the sequence the entry ends up with, and whether a shared
    /// bucket had to be copied first.
    pub fn insert(&mut self, key: K, seq: Sequence, entry: E) -> (Sequence, bool) {
        let slot = self
            .buckets
            .entry(key)
            .or_insert_with(|| Arc::new(Bucket::new()));
        let copied = Arc::strong_count(slot) > 1;
        let bucket = Arc::make_mut(slot);

        let before = bucket.len();
        let seq = bucket.append(seq, entry);
        if bucket.len() > before {
            self.len += 1;
        }
        (seq, copied)
    }

    /// Remove the entry for `record` from the bucket for `key`.
    ///
    /// Returns `None` when the pair is absent; nothing is copied in that case.
    pub fn remove(&mut self, key: &K, record: &RecordKey) -> Option<(Sequence, bool)> {
        let slot = self.buckets.get_mut(key)?;
        if !slot.contains(record) {
            return None;
        }

        let copied = Arc::strong_count(slot) > 1;
        let bucket = Arc::make_mut(slot);
        let seq = bucket.remove(record)?;
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        self.len -= 1;
        Some((seq, copied))
    }
}

impl<K: Ord + Clone, E: Clone> IndexTree<K, E> {
    /// Private deep copy of the buckets selected by `descriptor`.
    ///
    /// Returns the copy and the number of buckets duplicated.
    pub fn copy_range(&self, descriptor: &ScanDescriptor<K>) -> (Self, u64) {
        let mut copy = Self::new();
        let Some(range) = descriptor.key_range() else {
            return (copy, 0);
        };

        let mut copied = 0;
        for (key, bucket) in self.buckets.range(range) {
            copy.len += bucket.len();
            copy.buckets
                .insert(key.clone(), Arc::new(Bucket::clone(bucket)));
            copied += 1;
        }
        (copy, copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(RecordKey);

    impl IndexedRecord for Item {
        fn record_key(&self) -> &RecordKey {
            &self.0
        }
    }

    fn item(id: u8) -> Item {
        Item(RecordKey::new(vec![id]))
    }

    fn fixture() -> IndexTree<i64, Item> {
        let mut tree = IndexTree::new();
        for id in 0..9u8 {
            tree.insert(i64::from(id % 3), u64::from(id) + 1, item(id));
        }
        tree
    }

    #[test]
    fn test_insert_groups_by_key() {
        let tree = fixture();
        assert_eq!(tree.key_count(), 3);
        assert_eq!(tree.len(), 9);

        let ids: Vec<u8> = tree
            .bucket(&1)
            .unwrap()
            .iter()
            .map(|i| i.0.as_bytes()[0])
            .collect();
        assert_eq!(ids, vec![1, 4, 7]);
    }

    #[test]
    fn test_reinsert_same_record_keeps_len() {
        let mut tree = fixture();
        let (seq, _) = tree.insert(0, 100, item(3));
        assert_eq!(seq, 4);
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_remove_drops_empty_bucket() {
        let mut tree: IndexTree<i64, Item> = IndexTree::new();
        tree.insert(5, 1, item(1));

        assert!(tree.remove(&5, &RecordKey::new(vec![1])).is_some());
        assert_eq!(tree.key_count(), 0);
        assert!(tree.bucket(&5).is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut tree = fixture();
        assert!(tree.remove(&0, &RecordKey::new(vec![1])).is_none());
        assert!(tree.remove(&9, &RecordKey::new(vec![1])).is_none());
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_shared_bucket_is_copied() {
        let mut tree = fixture();
        let pinned = tree.clone();

        let (_, copied) = tree.insert(0, 50, item(20));
        assert!(copied);
        assert_eq!(pinned.bucket(&0).unwrap().len(), 3);
        assert_eq!(tree.bucket(&0).unwrap().len(), 4);

        // Second write to the now-private bucket copies nothing
        let (_, copied) = tree.insert(0, 51, item(21));
        assert!(!copied);
    }

    #[test]
    fn test_next_group_both_directions() {
        let tree = fixture();

        let asc = tree.next_group(Bound::Excluded(&0), Direction::Ascending);
        assert_eq!(asc.map(|(k, _)| *k), Some(1));

        let desc = tree.next_group(Bound::Excluded(&0), Direction::Descending);
        assert!(desc.is_none());

        let desc = tree.next_group(Bound::Included(&7), Direction::Descending);
        assert_eq!(desc.map(|(k, _)| *k), Some(2));

        let asc = tree.next_group(Bound::Unbounded, Direction::Ascending);
        assert_eq!(asc.map(|(k, _)| *k), Some(0));
    }

    #[test]
    fn test_copy_range_is_private() {
        let tree = fixture();
        let descriptor = ScanDescriptor::range(1, true, 2, true, Direction::Ascending);

        let (copy, copied) = tree.copy_range(&descriptor);
        assert_eq!(copied, 2);
        assert_eq!(copy.key_count(), 2);
        assert_eq!(copy.len(), 6);
        assert!(!Arc::ptr_eq(copy.bucket(&1).unwrap(), tree.bucket(&1).unwrap()));

        let empty = ScanDescriptor::range(2, true, 1, true, Direction::Ascending);
        let (copy, copied) = tree.copy_range(&empty);
        assert_eq!(copied, 0);
        assert!(copy.is_empty());
    }
}
