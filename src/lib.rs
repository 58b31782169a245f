//! aero-ordered-index - A deterministic ordered index store
//!
//! Maps attribute values to the records holding them and serves range and
//! point scans as resumable, cursor-paginated batches.

pub mod index;
pub mod observability;
pub mod scan;

pub use index::{IndexConfig, IndexError, IndexKey, IndexResult, OrderedIndexStore, RecordKey};
pub use scan::{Comparison, Cursor, Direction, IndexScan, ScanDescriptor, ScanPage};
