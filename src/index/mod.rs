//! Ordered index subsystem
//!
//! An index maps ordered keys to insertion-ordered buckets of entries and is
//! in-memory only; the surrounding record store owns the records and calls
//! insert/remove as they change.
//!
//! # Design Principles
//!
//! - Deterministic: BTreeMap key order, insertion order within a bucket
//! - Versioned: scans hold `Arc` handles, never borrows of the store
//! - No back-pointers: an entry is found through its record key
//!
//! # Invariants
//!
//! - Record keys are unique across the whole index
//! - A key with an empty bucket does not exist
//! - Removing an absent pair changes nothing

mod bucket;
mod config;
mod errors;
mod key;
mod live;
mod record;
mod store;
mod tree;
mod visibility;

pub use bucket::{Bucket, Sequence};
pub use config::IndexConfig;
pub use errors::{IndexError, IndexResult, Severity};
pub use key::IndexKey;
pub use live::LiveIndex;
pub use record::{IndexedRecord, RecordKey, RecordRef};
pub use store::OrderedIndexStore;
pub use tree::IndexTree;
pub use visibility::{
    CopyOnRead, CopyOnWrite, InPlace, TreeView, ViewSource, Visibility, VisibilityMode,
    VisibilityStrategy,
};
