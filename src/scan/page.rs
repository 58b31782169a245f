//! Bounded pages over a scan
//!
//! A page carries at most `limit` entries and, when more entries follow, the
//! cursor naming its last entry. Feeding that cursor back into the same
//! descriptor continues exactly where the page stopped.

use super::cursor::Cursor;
use crate::index::IndexedRecord;

/// One bounded batch of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage<E> {
    /// Entries in scan order
    pub entries: Vec<E>,
    /// Resumes after the last entry; `None` once the scan is exhausted
    pub cursor: Option<Cursor>,
}

impl<E: IndexedRecord> ScanPage<E> {
    /// Take up to `limit` entries from `entries`.
    ///
    /// Pulls one entry past the limit to learn whether a cursor is needed.
    pub fn collect(entries: impl Iterator<Item = E>, limit: usize) -> Self {
        let mut entries = entries.peekable();
        let page: Vec<E> = entries.by_ref().take(limit).collect();

        let cursor = if page.len() == limit && entries.peek().is_some() {
            page.last().map(Cursor::for_entry)
        } else {
            None
        };

        Self {
            entries: page,
            cursor,
        }
    }
}

impl<E> ScanPage<E> {
    /// Returns true if another page follows
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Number of entries in this page
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the page holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecordKey;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(RecordKey);

    impl IndexedRecord for Item {
        fn record_key(&self) -> &RecordKey {
            &self.0
        }
    }

    fn items(n: u8) -> impl Iterator<Item = Item> {
        (0..n).map(|id| Item(RecordKey::new(vec![id])))
    }

    #[test]
    fn test_full_page_with_more_has_cursor() {
        let page = ScanPage::collect(items(5), 2);
        assert_eq!(page.len(), 2);
        assert!(page.has_more());
        assert_eq!(page.cursor, Some(Cursor::from_bytes(vec![1])));
    }

    #[test]
    fn test_exact_fit_has_no_cursor() {
        let page = ScanPage::collect(items(3), 3);
        assert_eq!(page.len(), 3);
        assert!(!page.has_more());
    }

    #[test]
    fn test_short_page_has_no_cursor() {
        let page = ScanPage::collect(items(1), 4);
        assert_eq!(page.len(), 1);
        assert_eq!(page.cursor, None);

        let empty = ScanPage::collect(items(0), 4);
        assert!(empty.is_empty());
        assert!(!empty.has_more());
    }
}
