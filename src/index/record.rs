//! Record identity
//!
//! Every indexed entry exposes a `RecordKey`: the serialized identity of the
//! record it points at. Record keys are unique across the whole index, not
//! just within one bucket, which is what lets a cursor name exactly one entry.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Globally unique, serialized identity of an indexed record.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey(Vec<u8>);

impl RecordKey {
    /// Wraps serialized record-key bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the key, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex rendering, used in log fields and error messages
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordKey({})", self.to_hex())
    }
}

impl From<Vec<u8>> for RecordKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for RecordKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// An entry that can be stored in an ordered index.
///
/// The payload itself stays owned by the record store; implementors are
/// expected to be cheap handles (ids, `Arc`s) since scans hand out clones.
pub trait IndexedRecord {
    /// Serialized identity of the record
    fn record_key(&self) -> &RecordKey;
}

impl<T: IndexedRecord + ?Sized> IndexedRecord for Arc<T> {
    fn record_key(&self) -> &RecordKey {
        (**self).record_key()
    }
}

/// Ready-made entry pairing a record key with a shared payload.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordRef<V> {
    key: RecordKey,
    value: Arc<V>,
}

impl<V> RecordRef<V> {
    /// Creates an entry for `value` identified by `key`
    pub fn new(key: RecordKey, value: V) -> Self {
        Self {
            key,
            value: Arc::new(value),
        }
    }

    /// Returns the payload
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V> Clone for RecordRef<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: Arc::clone(&self.value),
        }
    }
}

impl<V> IndexedRecord for RecordRef<V> {
    fn record_key(&self) -> &RecordKey {
        &self.key
    }
}
