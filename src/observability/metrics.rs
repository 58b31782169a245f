//! Index metrics
//!
//! - Counters only, monotonic
//! - Relaxed atomics; exact once writers quiesce

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one index store
#[derive(Debug, Default)]
pub struct IndexMetrics {
    inserts: AtomicU64,
    removes: AtomicU64,
    noop_removes: AtomicU64,
    scans: AtomicU64,
    scans_rejected: AtomicU64,
    cursor_resumes: AtomicU64,
    stale_cursor_resumes: AtomicU64,
    unknown_cursors: AtomicU64,
    tree_copies: AtomicU64,
    bucket_copies: AtomicU64,
    read_copies: AtomicU64,
}

impl IndexMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment inserts
    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment effective removes
    pub fn increment_removes(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment removes that found nothing to remove
    pub fn increment_noop_removes(&self) {
        self.noop_removes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment opened scans
    pub fn increment_scans(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment scans rejected at the call boundary
    pub fn increment_scans_rejected(&self) {
        self.scans_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment scans resumed from a live cursor
    pub fn increment_cursor_resumes(&self) {
        self.cursor_resumes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment scans resumed from a retired cursor
    pub fn increment_stale_cursor_resumes(&self) {
        self.stale_cursor_resumes.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment cursors that could not be resolved
    pub fn increment_unknown_cursors(&self) {
        self.unknown_cursors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment key mapping copies made because a scan pinned the version
    pub fn increment_tree_copies(&self) {
        self.tree_copies.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment bucket copies made because a scan pinned the version
    pub fn increment_bucket_copies(&self) {
        self.bucket_copies.fetch_add(1, Ordering::Relaxed);
    }

    /// Add buckets copied at read time
    pub fn add_read_copies(&self, buckets: u64) {
        self.read_copies.fetch_add(buckets, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> IndexMetricsSnapshot {
        IndexMetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            noop_removes: self.noop_removes.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            scans_rejected: self.scans_rejected.load(Ordering::Relaxed),
            cursor_resumes: self.cursor_resumes.load(Ordering::Relaxed),
            stale_cursor_resumes: self.stale_cursor_resumes.load(Ordering::Relaxed),
            unknown_cursors: self.unknown_cursors.load(Ordering::Relaxed),
            tree_copies: self.tree_copies.load(Ordering::Relaxed),
            bucket_copies: self.bucket_copies.load(Ordering::Relaxed),
            read_copies: self.read_copies.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        // A struct of plain integers always serializes
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexMetricsSnapshot {
    pub inserts: u64,
    pub removes: u64,
    pub noop_removes: u64,
    pub scans: u64,
    pub scans_rejected: u64,
    pub cursor_resumes: u64,
    pub stale_cursor_resumes: u64,
    pub unknown_cursors: u64,
    pub tree_copies: u64,
    pub bucket_copies: u64,
    pub read_copies: u64,
}
