//! Mutation visibility strategies
//!
//! A strategy decides what version of the index a scan reads. Writers are
//! identical under every strategy; they go through `Arc::make_mut`, so they
//! copy only what an open scan still holds.
//!
//! - `InPlace`: scans read the live version, one group at a time, and
//!   observe writes made between groups
//! - `CopyOnWrite`: scans pin the version current at call time; the first
//!   write after that pays the copy
//! - `CopyOnRead`: scans copy the in-range buckets at call time; writers
//!   never copy on their behalf

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::live::LiveIndex;
use super::tree::IndexTree;
use crate::scan::ScanDescriptor;

/// Strategy selector, as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    /// Scans observe intervening writes
    InPlace,
    /// Scans read a frozen snapshot pinned at call time
    #[default]
    CopyOnWrite,
    /// Scans read a private copy taken at call time
    CopyOnRead,
}

impl VisibilityMode {
    /// Returns the string representation of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityMode::InPlace => "in_place",
            VisibilityMode::CopyOnWrite => "copy_on_write",
            VisibilityMode::CopyOnRead => "copy_on_read",
        }
    }

    /// Returns true if scans in this mode never observe later writes
    pub fn is_snapshot(&self) -> bool {
        !matches!(self, VisibilityMode::InPlace)
    }
}

impl fmt::Display for VisibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a scan reads from
pub enum TreeView<K, E> {
    /// The live index, re-read under the read guard for every group
    Live(Arc<LiveIndex<K, E>>),
    /// A fixed version nobody will mutate
    Pinned(Arc<IndexTree<K, E>>),
}

impl<K: Ord + Clone, E> TreeView<K, E> {
    /// A view of nothing
    pub fn empty() -> Self {
        TreeView::Pinned(Arc::new(IndexTree::new()))
    }

    /// Run `f` against the viewed version
    pub fn with_tree<R>(&self, f: impl FnOnce(&IndexTree<K, E>) -> R) -> R {
        match self {
            TreeView::Live(index) => index.with_tree(f),
            TreeView::Pinned(tree) => f(tree.as_ref()),
        }
    }
}

impl<K, E> fmt::Debug for TreeView<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeView::Live(_) => write!(f, "TreeView::Live"),
            TreeView::Pinned(_) => write!(f, "TreeView::Pinned"),
        }
    }
}

/// The index as seen while a scan is being opened.
///
/// Only exists while the store holds its read guard, so every view it hands
/// out agrees with the cursor resolution made under the same guard.
pub struct ViewSource<'a, K, E> {
    index: &'a Arc<LiveIndex<K, E>>,
    current: &'a Arc<IndexTree<K, E>>,
}

impl<'a, K: Ord + Clone, E: Clone> ViewSource<'a, K, E> {
    pub(crate) fn new(index: &'a Arc<LiveIndex<K, E>>, current: &'a Arc<IndexTree<K, E>>) -> Self {
        Self { index, current }
    }

    /// The live index
    pub fn live(&self) -> TreeView<K, E> {
        TreeView::Live(Arc::clone(self.index))
    }

    /// The current version, pinned
    pub fn pinned(&self) -> TreeView<K, E> {
        TreeView::Pinned(Arc::clone(self.current))
    }

    /// A private copy of the buckets `descriptor` can reach
    pub fn copied(&self, descriptor: &ScanDescriptor<K>) -> TreeView<K, E> {
        let (copy, buckets) = self.current.copy_range(descriptor);
        self.index.metrics().add_read_copies(buckets);
        TreeView::Pinned(Arc::new(copy))
    }
}

/// Decides which version of the index a scan reads
pub trait VisibilityStrategy: fmt::Debug + Send + Sync {
    /// Mode this strategy implements
    fn mode(&self) -> VisibilityMode;

    /// Open the view a new scan over `descriptor` will read
    fn open_view<K: Ord + Clone, E: Clone>(
        &self,
        source: &ViewSource<'_, K, E>,
        descriptor: &ScanDescriptor<K>,
    ) -> TreeView<K, E>;
}

/// Scans read the live structure
#[derive(Debug, Clone, Copy, Default)]
pub struct InPlace;

impl VisibilityStrategy for InPlace {
    fn mode(&self) -> VisibilityMode {
        VisibilityMode::InPlace
    }

    fn open_view<K: Ord + Clone, E: Clone>(
        &self,
        source: &ViewSource<'_, K, E>,
        _descriptor: &ScanDescriptor<K>,
    ) -> TreeView<K, E> {
        source.live()
    }
}

/// Scans pin the current version; writers copy what is pinned
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOnWrite;

impl VisibilityStrategy for CopyOnWrite {
    fn mode(&self) -> VisibilityMode {
        VisibilityMode::CopyOnWrite
    }

    fn open_view<K: Ord + Clone, E: Clone>(
        &self,
        source: &ViewSource<'_, K, E>,
        _descriptor: &ScanDescriptor<K>,
    ) -> TreeView<K, E> {
        source.pinned()
    }
}

/// Scans copy the in-range buckets up front
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOnRead;

impl VisibilityStrategy for CopyOnRead {
    fn mode(&self) -> VisibilityMode {
        VisibilityMode::CopyOnRead
    }

    fn open_view<K: Ord + Clone, E: Clone>(
        &self,
        source: &ViewSource<'_, K, E>,
        descriptor: &ScanDescriptor<K>,
    ) -> TreeView<K, E> {
        source.copied(descriptor)
    }
}

/// Strategy chosen at runtime, e.g. from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility(VisibilityMode);

impl Visibility {
    /// Strategy for `mode`
    pub fn new(mode: VisibilityMode) -> Self {
        Self(mode)
    }
}

impl From<VisibilityMode> for Visibility {
    fn from(mode: VisibilityMode) -> Self {
        Self(mode)
    }
}

impl VisibilityStrategy for Visibility {
    fn mode(&self) -> VisibilityMode {
        self.0
    }

    fn open_view<K: Ord + Clone, E: Clone>(
        &self,
        source: &ViewSource<'_, K, E>,
        descriptor: &ScanDescriptor<K>,
    ) -> TreeView<K, E> {
        match self.0 {
            VisibilityMode::InPlace => InPlace.open_view(source, descriptor),
            VisibilityMode::CopyOnWrite => CopyOnWrite.open_view(source, descriptor),
            VisibilityMode::CopyOnRead => CopyOnRead.open_view(source, descriptor),
        }
    }
}
