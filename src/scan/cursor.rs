//! Cursor codec and resolver
//!
//! A cursor is exactly the record-key bytes of the last entry a consumer
//! received; it never encodes the index key. Resolution maps those bytes back
//! to a scan position through the store's `Locator`.
//!
//! # Positions
//!
//! An entry's position is `(index key, insertion sequence)`. Ascending scans
//! visit positions in increasing order, descending scans in decreasing order,
//! so "strictly after the cursor" is a pure comparison on positions and does
//! not depend on which version of the tree a scan reads.
//!
//! # Stale cursors
//!
//! Removed entries leave their position in a bounded FIFO of retired
//! positions. A cursor naming a retired entry resumes at the first surviving
//! entry strictly after where it stood. A cursor naming a record key that is
//! neither live nor retired does not resolve.
//!
//! # Transport tokens
//!
//! `Cursor::to_token` renders URL-safe base64 of a 4-byte little-endian
//! CRC32 followed by the raw bytes, so a token mangled in transit is refused
//! instead of silently resuming somewhere else.

use std::collections::{HashMap, VecDeque};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::index::{Bucket, IndexError, IndexResult, IndexedRecord, RecordKey, Sequence};

const CHECKSUM_LEN: usize = 4;

/// Opaque resumption token naming one previously delivered entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor(RecordKey);

impl Cursor {
    /// Cursor for the given entry
    pub fn for_entry<E: IndexedRecord>(entry: &E) -> Self {
        Self(entry.record_key().clone())
    }

    /// Cursor from raw record-key bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(RecordKey::new(bytes))
    }

    /// Record key this cursor names
    pub fn record_key(&self) -> &RecordKey {
        &self.0
    }

    /// Raw cursor bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consumes the cursor, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }

    /// Checksummed text form for shipping across process boundaries
    pub fn to_token(&self) -> String {
        let bytes = self.as_bytes();
        let mut framed = Vec::with_capacity(CHECKSUM_LEN + bytes.len());
        framed.extend_from_slice(&checksum(bytes).to_le_bytes());
        framed.extend_from_slice(bytes);
        URL_SAFE_NO_PAD.encode(framed)
    }

    /// Parses a token produced by `to_token`
    pub fn from_token(token: &str) -> IndexResult<Self> {
        let framed = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| IndexError::MalformedCursor(format!("invalid base64: {}", e)))?;

        if framed.len() < CHECKSUM_LEN {
            return Err(IndexError::MalformedCursor(format!(
                "token too short: {} bytes",
                framed.len()
            )));
        }

        let (head, bytes) = framed.split_at(CHECKSUM_LEN);
        let mut expected = [0u8; CHECKSUM_LEN];
        expected.copy_from_slice(head);
        if checksum(bytes) != u32::from_le_bytes(expected) {
            return Err(IndexError::MalformedCursor("checksum mismatch".to_string()));
        }

        Ok(Self::from_bytes(bytes))
    }
}

impl From<RecordKey> for Cursor {
    fn from(key: RecordKey) -> Self {
        Self(key)
    }
}

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Position of an entry in scan order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position<K> {
    /// Index key of the entry's bucket
    pub key: K,
    /// Insertion sequence within the store
    pub seq: Sequence,
}

impl<K> Position<K> {
    /// Creates a position
    pub fn new(key: K, seq: Sequence) -> Self {
        Self { key, seq }
    }

    /// Half-open slice of `bucket` lying strictly after this position.
    ///
    /// `bucket` must be the bucket for `self.key`. Returned as
    /// `(start, end)` insertion indexes; for descending scans the slice is
    /// walked back to front.
    pub fn remainder_in<E>(&self, bucket: &Bucket<E>, descending: bool) -> (usize, usize) {
        if descending {
            (0, bucket.first_not_before(self.seq))
        } else {
            (bucket.first_after(self.seq), bucket.len())
        }
    }
}

/// How a cursor resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<K> {
    /// The entry is still indexed at this position
    Live(Position<K>),
    /// The entry was removed; this is where it stood
    Retired(Position<K>),
}

impl<K> Resolution<K> {
    /// The resolved position
    pub fn position(&self) -> &Position<K> {
        match self {
            Resolution::Live(p) | Resolution::Retired(p) => p,
        }
    }

    /// True when the cursor named a removed entry
    pub fn is_stale(&self) -> bool {
        matches!(self, Resolution::Retired(_))
    }
}

/// Record key to position map, with bounded memory of removed entries.
#[derive(Debug)]
pub struct Locator<K> {
    live: HashMap<RecordKey, Position<K>>,
    retired: HashMap<RecordKey, (Position<K>, u64)>,
    retired_order: VecDeque<(RecordKey, u64)>,
    retired_capacity: usize,
    retire_stamp: u64,
}

impl<K: Clone> Locator<K> {
    /// Creates a locator remembering up to `retired_capacity` removed entries
    pub fn new(retired_capacity: usize) -> Self {
        Self {
            live: HashMap::new(),
            retired: HashMap::new(),
            retired_order: VecDeque::new(),
            retired_capacity,
            retire_stamp: 0,
        }
    }

    /// Position of a live record
    pub fn live_position(&self, key: &RecordKey) -> Option<&Position<K>> {
        self.live.get(key)
    }

    /// Number of remembered removed records
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// Records that `key` now lives at `position`
    pub fn place(&mut self, key: RecordKey, position: Position<K>) {
        self.retired.remove(&key);
        self.live.insert(key, position);
    }

    /// Moves a live record to the retired set
    pub fn retire(&mut self, key: &RecordKey) {
        let Some(position) = self.live.remove(key) else {
            return;
        };
        if self.retired_capacity == 0 {
            return;
        }

        self.retire_stamp += 1;
        let stamp = self.retire_stamp;
        self.retired.insert(key.clone(), (position, stamp));
        self.retired_order.push_back((key.clone(), stamp));

        while self.retired.len() > self.retired_capacity {
            let Some((oldest, oldest_stamp)) = self.retired_order.pop_front() else {
                break;
            };
            if self.retired.get(&oldest).map(|(_, s)| *s) == Some(oldest_stamp) {
                self.retired.remove(&oldest);
            }
        }

        // Revived records leave stale order entries behind
        if self.retired_order.len() > self.retired_capacity.saturating_mul(2) {
            let retired = &self.retired;
            self.retired_order
                .retain(|(k, s)| retired.get(k).map(|(_, cur)| cur) == Some(s));
        }
    }

    /// Resolves a cursor to a position
    pub fn resolve(&self, cursor: &Cursor) -> Option<Resolution<K>> {
        let key = cursor.record_key();
        if let Some(position) = self.live.get(key) {
            return Some(Resolution::Live(position.clone()));
        }
        self.retired
            .get(key)
            .map(|(position, _)| Resolution::Retired(position.clone()))
    }

    /// Forgets everything
    pub fn clear(&mut self) {
        self.live.clear();
        self.retired.clear();
        self.retired_order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rk(id: u8) -> RecordKey {
        RecordKey::new(vec![id])
    }

    #[test]
    fn test_cursor_is_record_key_bytes() {
        let cursor = Cursor::from(RecordKey::new(vec![0, 0, 0, 7]));
        assert_eq!(cursor.as_bytes(), &[0, 0, 0, 7]);
        assert_eq!(cursor.clone().into_bytes(), vec![0, 0, 0, 7]);
        assert_eq!(Cursor::from_bytes(vec![0, 0, 0, 7]), cursor);
    }

    #[test]
    fn test_token_round_trip() {
        let cursor = Cursor::from_bytes(b"user/42".to_vec());
        let token = cursor.to_token();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(Cursor::from_token(&token).unwrap(), cursor);

        let empty = Cursor::from_bytes(Vec::new());
        assert_eq!(Cursor::from_token(&empty.to_token()).unwrap(), empty);
    }

    #[test]
    fn test_token_corruption_detected() {
        let cursor = Cursor::from_bytes(b"user/42".to_vec());
        let mut framed = URL_SAFE_NO_PAD.decode(cursor.to_token()).unwrap();
        let last = framed.len() - 1;
        framed[last] ^= 0x01;
        let tampered = URL_SAFE_NO_PAD.encode(framed);

        let err = Cursor::from_token(&tampered).unwrap_err();
        assert_eq!(err.code(), "AERO_INDEX_MALFORMED_CURSOR");
        assert!(err.to_string().contains("checksum"));

        assert!(Cursor::from_token("!!not base64!!").is_err());
        assert!(Cursor::from_token("AAA").is_err());
    }

    #[test]
    fn test_locator_live_then_retired() {
        let mut locator = Locator::new(8);
        locator.place(rk(1), Position::new(10, 1));

        let cursor = Cursor::from(rk(1));
        assert_eq!(
            locator.resolve(&cursor),
            Some(Resolution::Live(Position::new(10, 1)))
        );

        locator.retire(&rk(1));
        let resolution = locator.resolve(&cursor).unwrap();
        assert!(resolution.is_stale());
        assert_eq!(resolution.position(), &Position::new(10, 1));

        assert_eq!(locator.resolve(&Cursor::from(rk(9))), None);
    }

    #[test]
    fn test_locator_revive_clears_retirement() {
        let mut locator = Locator::new(8);
        locator.place(rk(1), Position::new(10, 1));
        locator.retire(&rk(1));
        locator.place(rk(1), Position::new(20, 5));

        assert_eq!(locator.retired_len(), 0);
        assert_eq!(
            locator.resolve(&Cursor::from(rk(1))),
            Some(Resolution::Live(Position::new(20, 5)))
        );
    }

    #[test]
    fn test_locator_retired_capacity_is_fifo() {
        let mut locator = Locator::new(2);
        for id in 1..=3u8 {
            locator.place(rk(id), Position::new(i64::from(id), u64::from(id)));
            locator.retire(&rk(id));
        }

        assert_eq!(locator.retired_len(), 2);
        assert_eq!(locator.resolve(&Cursor::from(rk(1))), None);
        assert!(locator.resolve(&Cursor::from(rk(2))).is_some());
        assert!(locator.resolve(&Cursor::from(rk(3))).is_some());
    }

    #[test]
    fn test_locator_zero_capacity_forgets_immediately() {
        let mut locator = Locator::new(0);
        locator.place(rk(1), Position::new(1, 1));
        locator.retire(&rk(1));
        assert_eq!(locator.resolve(&Cursor::from(rk(1))), None);
    }

    #[test]
    fn test_remainder_in_bucket() {
        #[derive(Clone)]
        struct Item(RecordKey);
        impl IndexedRecord for Item {
            fn record_key(&self) -> &RecordKey {
                &self.0
            }
        }

        let mut bucket = Bucket::new();
        for seq in [3u64, 6, 9] {
            bucket.append(seq, Item(rk(seq as u8)));
        }

        assert_eq!(Position::new(0, 6).remainder_in(&bucket, false), (2, 3));
        assert_eq!(Position::new(0, 6).remainder_in(&bucket, true), (0, 1));
        // A retired sequence between survivors
        assert_eq!(Position::new(0, 7).remainder_in(&bucket, false), (2, 3));
        assert_eq!(Position::new(0, 7).remainder_in(&bucket, true), (0, 2));
    }
}
