//! Lazy grouped scan iterator
//!
//! A scan yields one `IndexKeyEntries` per visited index key, in key order
//! for its direction; each group yields its entries lazily in insertion order
//! (ascending) or reverse insertion order (descending).
//!
//! # Traversal
//!
//! The iterator remembers only a frontier bound and, until it is consumed,
//! the position of the cursor entry. Each pull seeks the first bucket past
//! the frontier, so the scan never borrows the tree it reads and a live view
//! can be re-read between groups.
//!
//! The sequence is not restartable; a new traversal needs a new scan.

use std::ops::Bound;
use std::sync::Arc;

use super::cursor::Position;
use super::descriptor::{tighter_start, Direction, ScanDescriptor};
use crate::index::{Bucket, TreeView};

/// Entries of one index key, in scan order
pub struct BucketEntries<E> {
    bucket: Arc<Bucket<E>>,
    front: usize,
    back: usize,
    direction: Direction,
}

impl<E> BucketEntries<E> {
    fn new(bucket: Arc<Bucket<E>>, start: usize, end: usize, direction: Direction) -> Self {
        Self {
            bucket,
            front: start,
            back: end,
            direction,
        }
    }
}

impl<E: Clone> Iterator for BucketEntries<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if self.front >= self.back {
            return None;
        }
        let index = match self.direction {
            Direction::Ascending => {
                self.front += 1;
                self.front - 1
            }
            Direction::Descending => {
                self.back -= 1;
                self.back
            }
        };
        self.bucket.get(index).map(|(_, entry)| entry.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.saturating_sub(self.front);
        (remaining, Some(remaining))
    }
}

impl<E: Clone> ExactSizeIterator for BucketEntries<E> {}

impl<E> std::fmt::Debug for BucketEntries<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketEntries")
            .field("remaining", &self.back.saturating_sub(self.front))
            .field("direction", &self.direction)
            .finish()
    }
}

/// One group of a scan: an index key and its entries
#[derive(Debug)]
pub struct IndexKeyEntries<K, E> {
    /// The index key shared by every entry in the group
    pub key: K,
    /// Entries in scan order
    pub entries: BucketEntries<E>,
}

/// Lazy, finite, non-restartable scan over an ordered index
#[derive(Debug)]
pub struct IndexScan<K, E> {
    view: TreeView<K, E>,
    descriptor: ScanDescriptor<K>,
    frontier: Bound<K>,
    resume: Option<Position<K>>,
    done: bool,
}

impl<K: Ord + Clone, E: Clone> IndexScan<K, E> {
    /// Scan `view` per `descriptor`, starting strictly after `resume`
    pub(crate) fn new(
        view: TreeView<K, E>,
        descriptor: ScanDescriptor<K>,
        resume: Option<Position<K>>,
    ) -> Self {
        let direction = descriptor.direction();
        let frontier = match &resume {
            Some(position) => tighter_start(
                descriptor.near_bound(),
                Bound::Included(&position.key),
                direction,
            ),
            None => descriptor.near_bound().cloned(),
        };
        let done = descriptor.is_empty_range();

        Self {
            view,
            descriptor,
            frontier,
            resume,
            done,
        }
    }

    /// A scan that yields nothing
    pub fn empty(direction: Direction) -> Self {
        let mut scan = Self::new(TreeView::empty(), ScanDescriptor::all(direction), None);
        scan.done = true;
        scan
    }

    /// Flattens the groups into entries
    pub fn entries(self) -> impl Iterator<Item = E> {
        self.flat_map(|group| group.entries)
    }
}

impl<K: Ord + Clone, E: Clone> Iterator for IndexScan<K, E> {
    type Item = IndexKeyEntries<K, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let direction = self.descriptor.direction();

        while !self.done {
            let frontier = self.frontier.as_ref();
            let found = self.view.with_tree(|tree| {
                tree.next_group(frontier, direction)
                    .map(|(key, bucket)| (key.clone(), Arc::clone(bucket)))
            });

            let Some((key, bucket)) = found else {
                self.done = true;
                break;
            };
            if self.descriptor.is_past_far_bound(&key) {
                self.done = true;
                break;
            }

            // The first group found never sorts before the cursor entry
            let (start, end) = match self.resume.take() {
                Some(position) if position.key == key => {
                    position.remainder_in(&bucket, direction.is_descending())
                }
                _ => (0, bucket.len()),
            };
            self.frontier = Bound::Excluded(key.clone());

            if start < end {
                return Some(IndexKeyEntries {
                    key,
                    entries: BucketEntries::new(bucket, start, end, direction),
                });
            }
        }
        None
    }
}
