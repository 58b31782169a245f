//! Live index state shared by the store and its in-place scans
//!
//! # Locking
//!
//! - One `RwLock` guards the current tree version, the locator and the
//!   sequence counter; writers serialize on it
//! - Readers hold the read guard only to pin a version or seek one group
//! - A poisoned lock is recovered: every mutation validates before it
//!   touches the tree, so a panic cannot leave it half-applied
//!
//! # Versions
//!
//! The current version is an `Arc<IndexTree>`. A write goes through
//! `Arc::make_mut`, which mutates in place when nobody else holds the
//! version and copies the mapping (and then the affected bucket) otherwise.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::bucket::Sequence;
use super::record::{IndexedRecord, RecordKey};
use super::tree::IndexTree;
use crate::observability::IndexMetrics;
use crate::scan::{Cursor, Locator, Position, Resolution};

#[derive(Debug)]
pub(crate) struct IndexState<K, E> {
    pub(crate) tree: Arc<IndexTree<K, E>>,
    locator: Locator<K>,
    last_seq: Sequence,
}

impl<K: Clone, E> IndexState<K, E> {
    /// Resolve `cursor` against this version
    pub(crate) fn resolve(&self, cursor: &Cursor) -> Option<Resolution<K>> {
        self.locator.resolve(cursor)
    }
}

/// The mutable heart of an ordered index store
#[derive(Debug)]
pub struct LiveIndex<K, E> {
    state: RwLock<IndexState<K, E>>,
    metrics: IndexMetrics,
}

impl<K: Ord + Clone, E> LiveIndex<K, E> {
    pub(crate) fn new(retired_cursor_capacity: usize) -> Self {
        Self {
            state: RwLock::new(IndexState {
                tree: Arc::new(IndexTree::new()),
                locator: Locator::new(retired_cursor_capacity),
                last_seq: 0,
            }),
            metrics: IndexMetrics::new(),
        }
    }

    /// Counters of this index
    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, IndexState<K, E>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState<K, E>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the current version under the read guard
    pub fn with_tree<R>(&self, f: impl FnOnce(&IndexTree<K, E>) -> R) -> R {
        f(self.read().tree.as_ref())
    }

    pub(crate) fn len(&self) -> usize {
        self.read().tree.len()
    }

    pub(crate) fn key_count(&self) -> usize {
        self.read().tree.key_count()
    }

    pub(crate) fn position_of(&self, record: &RecordKey) -> Option<Position<K>> {
        self.read().locator.live_position(record).cloned()
    }
}

impl<K: Ord + Clone, E: IndexedRecord + Clone> LiveIndex<K, E> {
    /// Link `entry` under `key`, relocating it if its record lives elsewhere
    pub(crate) fn insert(&self, key: K, entry: E) {
        let mut guard = self.write();
        self.insert_locked(&mut guard, key, entry);
    }

    /// Unlink the record of `entry` from `key`; false when the pair is absent
    pub(crate) fn remove(&self, key: &K, entry: &E) -> bool {
        let mut guard = self.write();
        self.remove_locked(&mut guard, key, entry.record_key())
    }

    /// Remove from `old_key` and insert under `new_key` as one write
    pub(crate) fn update(&self, old_key: &K, new_key: K, entry: E) -> bool {
        let mut guard = self.write();
        // A record missing under `old_key` is not a failed remove
        let moved = Self::holds(&guard, old_key, entry.record_key())
            && self.remove_locked(&mut guard, old_key, entry.record_key());
        self.insert_locked(&mut guard, new_key, entry);
        moved
    }

    /// Drop every entry and all cursor history; returns the entries dropped
    pub(crate) fn clear(&self) -> usize {
        let mut guard = self.write();
        let dropped = guard.tree.len();
        guard.tree = Arc::new(IndexTree::new());
        guard.locator.clear();
        dropped
    }

    fn insert_locked(&self, state: &mut IndexState<K, E>, key: K, entry: E) {
        let record = entry.record_key().clone();
        let relocated_from = state
            .locator
            .live_position(&record)
            .filter(|p| p.key != key)
            .map(|p| p.key.clone());
        if let Some(old_key) = relocated_from {
            self.remove_locked(state, &old_key, &record);
        }

        state.last_seq += 1;
        let seq = state.last_seq;
        let (seq, bucket_copied) = self.tree_for_write(state).insert(key.clone(), seq, entry);
        if bucket_copied {
            self.metrics.increment_bucket_copies();
        }

        state.locator.place(record, Position::new(key, seq));
        self.metrics.increment_inserts();
    }

    fn remove_locked(&self, state: &mut IndexState<K, E>, key: &K, record: &RecordKey) -> bool {
        if !Self::holds(state, key, record) {
            self.metrics.increment_noop_removes();
            return false;
        }

        match self.tree_for_write(state).remove(key, record) {
            Some((_, bucket_copied)) => {
                if bucket_copied {
                    self.metrics.increment_bucket_copies();
                }
                state.locator.retire(record);
                self.metrics.increment_removes();
                true
            }
            None => false,
        }
    }

    fn holds(state: &IndexState<K, E>, key: &K, record: &RecordKey) -> bool {
        state
            .tree
            .bucket(key)
            .map_or(false, |bucket| bucket.contains(record))
    }

    fn tree_for_write<'a>(&self, state: &'a mut IndexState<K, E>) -> &'a mut IndexTree<K, E> {
        if Arc::strong_count(&state.tree) > 1 {
            self.metrics.increment_tree_copies();
        }
        Arc::make_mut(&mut state.tree)
    }
}
