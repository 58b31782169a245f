//! Insertion-ordered bucket of entries sharing one index key
//!
//! # Invariants
//!
//! - Entries keep insertion order for the lifetime of the bucket
//! - Every entry carries its insertion sequence; sequences strictly increase
//!   along the bucket, so bucket order and sequence order coincide
//! - Removal never reorders the survivors

use indexmap::IndexMap;

use super::record::{IndexedRecord, RecordKey};

/// Store-wide insertion stamp of an entry.
pub type Sequence = u64;

#[derive(Debug, Clone)]
struct Slot<E> {
    seq: Sequence,
    entry: E,
}

/// Entries for one index key, in insertion order.
#[derive(Debug, Clone)]
pub struct Bucket<E> {
    slots: IndexMap<RecordKey, Slot<E>>,
}

impl<E> Default for Bucket<E> {
    fn default() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }
}

impl<E: IndexedRecord> Bucket<E> {
    /// Creates an empty bucket
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` at the tail, stamped with `seq`.
    ///
    /// If the record is already present its payload is replaced in place and
    /// its original sequence is kept. Returns the sequence the entry ends up
    /// with.
    pub fn append(&mut self, seq: Sequence, entry: E) -> Sequence {
        if let Some(slot) = self.slots.get_mut(entry.record_key()) {
            slot.entry = entry;
            return slot.seq;
        }
        debug_assert!(self.slots.last().map_or(true, |(_, s)| s.seq < seq));
        self.slots.insert(entry.record_key().clone(), Slot { seq, entry });
        seq
    }

    /// Removes the entry for `key`, returning its sequence if it was present.
    pub fn remove(&mut self, key: &RecordKey) -> Option<Sequence> {
        self.slots.shift_remove(key).map(|slot| slot.seq)
    }
}

impl<E> Bucket<E> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when the bucket holds no entries
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns true if the record is in this bucket
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Entry at insertion position `index`
    pub fn get(&self, index: usize) -> Option<(Sequence, &E)> {
        self.slots
            .get_index(index)
            .map(|(_, slot)| (slot.seq, &slot.entry))
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &E> + ExactSizeIterator {
        self.slots.values().map(|slot| &slot.entry)
    }

    /// Position of the first entry inserted strictly after `seq`.
    pub fn first_after(&self, seq: Sequence) -> usize {
        self.partition_point(|s| s <= seq)
    }

    /// Position of the first entry inserted at or after `seq`.
    ///
    /// Everything before it was inserted strictly before `seq`.
    pub fn first_not_before(&self, seq: Sequence) -> usize {
        self.partition_point(|s| s < seq)
    }

    fn partition_point(&self, pred: impl Fn(Sequence) -> bool) -> usize {
        let (mut lo, mut hi) = (0, self.slots.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.slots.get_index(mid) {
                Some((_, slot)) if pred(slot.seq) => lo = mid + 1,
                _ => hi = mid,
            }
        }
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        key: RecordKey,
        value: u32,
    }

    impl IndexedRecord for Item {
        fn record_key(&self) -> &RecordKey {
            &self.key
        }
    }

    fn item(id: u8, value: u32) -> Item {
        Item {
            key: RecordKey::new(vec![id]),
            value,
        }
    }

    fn ids(bucket: &Bucket<Item>) -> Vec<u8> {
        bucket.iter().map(|i| i.key.as_bytes()[0]).collect()
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut bucket = Bucket::new();
        bucket.append(10, item(3, 0));
        bucket.append(11, item(1, 0));
        bucket.append(12, item(2, 0));

        assert_eq!(ids(&bucket), vec![3, 1, 2]);
        let reversed: Vec<u8> = bucket.iter().rev().map(|i| i.key.as_bytes()[0]).collect();
        assert_eq!(reversed, vec![2, 1, 3]);
    }

    #[test]
    fn test_append_existing_replaces_in_place() {
        let mut bucket = Bucket::new();
        bucket.append(1, item(1, 100));
        bucket.append(2, item(2, 200));

        let seq = bucket.append(3, item(1, 111));
        assert_eq!(seq, 1);
        assert_eq!(ids(&bucket), vec![1, 2]);
        assert_eq!(bucket.get(0).map(|(_, e)| e.value), Some(111));
    }

    #[test]
    fn test_remove_keeps_survivor_order() {
        let mut bucket = Bucket::new();
        for (seq, id) in [(1, 1), (2, 2), (3, 3), (4, 4)] {
            bucket.append(seq, item(id, 0));
        }

        assert_eq!(bucket.remove(&RecordKey::new(vec![2])), Some(2));
        assert_eq!(bucket.remove(&RecordKey::new(vec![2])), None);
        assert_eq!(ids(&bucket), vec![1, 3, 4]);
    }

    #[test]
    fn test_sequence_partition_points() {
        let mut bucket = Bucket::new();
        for (seq, id) in [(2, 1), (5, 2), (9, 3)] {
            bucket.append(seq, item(id, 0));
        }

        assert_eq!(bucket.first_after(0), 0);
        assert_eq!(bucket.first_after(2), 1);
        assert_eq!(bucket.first_after(3), 1);
        assert_eq!(bucket.first_after(9), 3);

        assert_eq!(bucket.first_not_before(2), 0);
        assert_eq!(bucket.first_not_before(5), 1);
        assert_eq!(bucket.first_not_before(6), 2);
        assert_eq!(bucket.first_not_before(10), 3);
    }
}
