//! Scan protocol for ordered indexes
//!
//! Scans are requested through a normalized `ScanDescriptor`, consumed as a
//! lazy `IndexScan`, and continued across calls with a `Cursor`.
//!
//! # Invariants
//!
//! - Ascending visits keys low to high, entries in insertion order
//! - Descending visits keys high to low, entries in reverse insertion order
//! - `scan(D, cursor = C)` yields exactly what `scan(D)` yields after C

mod cursor;
mod descriptor;
mod iterator;
mod page;

pub use cursor::{Cursor, Locator, Position, Resolution};
pub use descriptor::{Comparison, Direction, ScanBound, ScanDescriptor};
pub use iterator::{BucketEntries, IndexKeyEntries, IndexScan};
pub use page::ScanPage;
