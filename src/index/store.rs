//! Ordered index store
//!
//! The entry point for writers and readers of one ordered index.
//!
//! # Scan protocol
//!
//! 1. Validate the descriptor (rejected before any traversal)
//! 2. Resolve the cursor, if any, to a position
//! 3. Open the view the visibility strategy prescribes
//! 4. Hand back a lazy `IndexScan`; nothing is read until it is pulled
//!
//! Steps 2 and 3 happen under one read guard, so the resume position and the
//! view agree on the version they describe.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::config::IndexConfig;
use super::errors::{IndexError, IndexResult};
use super::live::LiveIndex;
use super::record::{IndexedRecord, RecordKey};
use super::visibility::{ViewSource, Visibility, VisibilityMode, VisibilityStrategy};
use crate::observability::{Event, IndexMetrics, Logger};
use crate::scan::{
    Comparison, Cursor, Direction, IndexScan, Resolution, ScanDescriptor, ScanPage,
};

const DEFAULT_RETIRED_CURSOR_CAPACITY: usize = 4096;
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Ordered index of `E` entries keyed by `K`, read through strategy `S`
#[derive(Debug)]
pub struct OrderedIndexStore<K, E, S = Visibility> {
    index: Arc<LiveIndex<K, E>>,
    strategy: S,
    default_page_size: usize,
    logger: Logger,
}

// Handles share one index
impl<K, E, S: Clone> Clone for OrderedIndexStore<K, E, S> {
    fn clone(&self) -> Self {
        Self {
            index: Arc::clone(&self.index),
            strategy: self.strategy.clone(),
            default_page_size: self.default_page_size,
            logger: self.logger,
        }
    }
}

impl<K, E, S> OrderedIndexStore<K, E, S>
where
    K: Ord + Clone,
    E: IndexedRecord + Clone,
    S: VisibilityStrategy,
{
    /// Create an empty store reading through `strategy`
    pub fn new(strategy: S) -> Self {
        Self::with_options(strategy, DEFAULT_RETIRED_CURSOR_CAPACITY, DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store with explicit cursor history and page size
    pub fn with_options(
        strategy: S,
        retired_cursor_capacity: usize,
        default_page_size: usize,
    ) -> Self {
        Self::build(
            strategy,
            retired_cursor_capacity,
            default_page_size,
            Logger::default(),
        )
    }

    fn build(
        strategy: S,
        retired_cursor_capacity: usize,
        default_page_size: usize,
        logger: Logger,
    ) -> Self {
        let capacity = retired_cursor_capacity.to_string();
        logger.log_event(
            Event::IndexCreated,
            &[
                ("retired_cursor_capacity", capacity.as_str()),
                ("visibility", strategy.mode().as_str()),
            ],
        );

        Self {
            index: Arc::new(LiveIndex::new(retired_cursor_capacity)),
            strategy,
            default_page_size: default_page_size.max(1),
            logger,
        }
    }

    // ==================================================================
    // Write path
    // ==================================================================

    /// Append `entry` to the bucket for `key`.
    ///
    /// If the entry's record is already indexed under another key it is
    /// moved; under the same key its payload is replaced in place.
    pub fn insert(&self, key: K, entry: E) {
        self.index.insert(key, entry);
    }

    /// Remove `entry` from the bucket for `key`.
    ///
    /// Returns false, changing nothing, when the pair is absent.
    pub fn remove(&self, key: &K, entry: &E) -> bool {
        self.index.remove(key, entry)
    }

    /// Move `entry` from `old_key` to `new_key` in one write.
    ///
    /// Returns whether the entry was found under `old_key`; it ends up under
    /// `new_key` either way.
    pub fn update(&self, old_key: &K, new_key: K, entry: E) -> bool {
        self.index.update(old_key, new_key, entry)
    }

    /// Drop every entry and forget all cursors
    pub fn clear(&self) {
        let dropped = self.index.clear().to_string();
        self.logger.log_event(Event::IndexCleared, &[("entries", dropped.as_str())]);
    }

    // ==================================================================
    // Introspection
    // ==================================================================

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct index keys
    pub fn key_count(&self) -> usize {
        self.index.key_count()
    }

    /// Index key the record currently lives under
    pub fn key_of(&self, record: &RecordKey) -> Option<K> {
        self.index.position_of(record).map(|position| position.key)
    }

    /// Returns true if the record is indexed
    pub fn contains(&self, record: &RecordKey) -> bool {
        self.index.position_of(record).is_some()
    }

    /// Visibility mode scans use
    pub fn mode(&self) -> VisibilityMode {
        self.strategy.mode()
    }

    /// Counters of this store
    pub fn metrics(&self) -> &IndexMetrics {
        self.index.metrics()
    }

    /// Page size `fetch_default_page` uses
    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Logger this store writes its events to
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    // ==================================================================
    // Scans
    // ==================================================================

    /// Open a scan for `descriptor`
    pub fn scan(&self, descriptor: ScanDescriptor<K>) -> IndexResult<IndexScan<K, E>> {
        if let Err(err) = descriptor.validate() {
            return Err(self.reject(err));
        }

        let metrics = self.index.metrics();
        if descriptor.is_empty_range() {
            metrics.increment_scans();
            return Ok(IndexScan::empty(descriptor.direction()));
        }

        let state = self.index.read();
        let resume = match descriptor.cursor() {
            None => None,
            Some(cursor) => match state.resolve(cursor) {
                Some(Resolution::Live(position)) => {
                    metrics.increment_cursor_resumes();
                    Some(position)
                }
                Some(Resolution::Retired(position)) => {
                    let record = cursor.record_key().to_hex();
                    metrics.increment_stale_cursor_resumes();
                    self.logger.log_event(
                        Event::CursorStaleResume,
                        &[("record_key", record.as_str())],
                    );
                    Some(position)
                }
                None => {
                    let record = cursor.record_key().to_hex();
                    metrics.increment_unknown_cursors();
                    self.logger.log_event(Event::CursorUnknown, &[("record_key", record.as_str())]);
                    return Err(IndexError::UnknownCursor(record));
                }
            },
        };

        let source = ViewSource::new(&self.index, &state.tree);
        let view = self.strategy.open_view(&source, &descriptor);
        drop(state);

        metrics.increment_scans();
        Ok(IndexScan::new(view, descriptor, resume))
    }

    /// Every entry, in `direction` order
    pub fn scan_all(&self, direction: Direction) -> IndexScan<K, E> {
        // Without a cursor nothing can be rejected
        self.scan(ScanDescriptor::all(direction))
            .unwrap_or_else(|_| IndexScan::empty(direction))
    }

    /// Entries whose key equals `value`
    pub fn scan_equality(
        &self,
        value: K,
        direction: Direction,
        cursor: Option<Cursor>,
    ) -> IndexResult<IndexScan<K, E>> {
        self.scan(ScanDescriptor::equality(value, direction).resumed(cursor))
    }

    /// Entries whose key compares to `value` as `comparison` says
    pub fn scan_comparison(
        &self,
        comparison: Comparison,
        value: K,
        direction: Direction,
        cursor: Option<Cursor>,
    ) -> IndexResult<IndexScan<K, E>> {
        self.scan(ScanDescriptor::comparison(comparison, value, direction).resumed(cursor))
    }

    /// Entries whose key lies between `lower` and `upper`
    pub fn scan_range(
        &self,
        lower: K,
        lower_inclusive: bool,
        upper: K,
        upper_inclusive: bool,
        direction: Direction,
        cursor: Option<Cursor>,
    ) -> IndexResult<IndexScan<K, E>> {
        self.scan(
            ScanDescriptor::range(lower, lower_inclusive, upper, upper_inclusive, direction)
                .resumed(cursor),
        )
    }

    // ==================================================================
    // Pages
    // ==================================================================

    /// Up to `limit` entries of `descriptor`, plus the cursor for the rest
    pub fn fetch_page(
        &self,
        descriptor: ScanDescriptor<K>,
        limit: usize,
    ) -> IndexResult<ScanPage<E>> {
        if limit == 0 {
            return Err(self.reject(IndexError::InvalidArgument(
                "page limit must be greater than zero".to_string(),
            )));
        }
        let scan = self.scan(descriptor)?;
        Ok(ScanPage::collect(scan.entries(), limit))
    }

    /// `fetch_page` with the configured default page size
    pub fn fetch_default_page(&self, descriptor: ScanDescriptor<K>) -> IndexResult<ScanPage<E>> {
        self.fetch_page(descriptor, self.default_page_size)
    }

    // ==================================================================
    // Lookups (materialized, ascending)
    // ==================================================================

    /// Entries under `value`
    pub fn lookup_eq(&self, value: K) -> Vec<E> {
        self.materialize(ScanDescriptor::equality(value, Direction::Ascending))
    }

    /// Entries under any of `values`, each key visited once, keys ascending
    pub fn lookup_in(&self, values: impl IntoIterator<Item = K>) -> Vec<E> {
        let keys: BTreeSet<K> = values.into_iter().collect();
        keys.into_iter().flat_map(|key| self.lookup_eq(key)).collect()
    }

    /// Entries whose key compares to `value` as `comparison` says
    pub fn lookup_comparison(&self, comparison: Comparison, value: K) -> Vec<E> {
        self.materialize(ScanDescriptor::comparison(
            comparison,
            value,
            Direction::Ascending,
        ))
    }

    /// Entries whose key lies between `lower` and `upper`
    pub fn lookup_range(
        &self,
        lower: K,
        lower_inclusive: bool,
        upper: K,
        upper_inclusive: bool,
    ) -> Vec<E> {
        self.materialize(ScanDescriptor::range(
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
            Direction::Ascending,
        ))
    }

    fn materialize(&self, descriptor: ScanDescriptor<K>) -> Vec<E> {
        self.scan(descriptor)
            .map(|scan| scan.entries().collect())
            .unwrap_or_default()
    }

    fn reject(&self, err: IndexError) -> IndexError {
        let reason = err.to_string();
        self.index.metrics().increment_scans_rejected();
        self.logger.log_event(
            Event::ScanRejected,
            &[("code", err.code()), ("reason", reason.as_str())],
        );
        err
    }
}

impl<K, E> OrderedIndexStore<K, E, Visibility>
where
    K: Ord + Clone,
    E: IndexedRecord + Clone,
{
    /// Create an empty store as `config` describes, logging at its level
    pub fn from_config(config: &IndexConfig) -> IndexResult<Self> {
        config.validate()?;

        Ok(Self::build(
            Visibility::new(config.visibility),
            config.retired_cursor_capacity,
            config.default_page_size,
            config.logger()?,
        ))
    }
}

impl<K, E, S> Default for OrderedIndexStore<K, E, S>
where
    K: Ord + Clone,
    E: IndexedRecord + Clone,
    S: VisibilityStrategy + Default,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}
