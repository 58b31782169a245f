//! Observability Format Tests
//!
//! Tests for observability invariants:
//! - Log lines are single-line JSON, `event` first, fields sorted
//! - Events carry stable names and severities
//! - Counters track store activity and serialize to JSON
//! - Errors expose stable codes

use aero_ordered_index::index::{RecordKey, RecordRef};
use aero_ordered_index::observability::{Event, Logger, Severity};
use aero_ordered_index::{Cursor, Direction, IndexError, OrderedIndexStore, ScanDescriptor};

// =============================================================================
// Logger Format
// =============================================================================

/// Rendered lines parse as JSON with the expected fields.
#[test]
fn test_rendered_line_is_json() {
    let line = Logger::render(
        Severity::Warn,
        Event::ScanRejected.as_str(),
        &[("reason", "both \"bounds\" open"), ("code", "AERO_INDEX_INVALID_ARGUMENT")],
    );
    assert!(line.ends_with('\n'));
    assert_eq!(line.matches('\n').count(), 1);

    let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(parsed["event"], "SCAN_REJECTED");
    assert_eq!(parsed["severity"], "WARN");
    assert_eq!(parsed["reason"], "both \"bounds\" open");
    assert_eq!(parsed["code"], "AERO_INDEX_INVALID_ARGUMENT");
}

/// Field order is event, severity, then keys alphabetically.
#[test]
fn test_field_order_is_deterministic() {
    let a = Logger::render(Severity::Info, "X", &[("b", "2"), ("a", "1")]);
    let b = Logger::render(Severity::Info, "X", &[("a", "1"), ("b", "2")]);
    assert_eq!(a, b);
    assert!(a.starts_with(r#"{"event":"X","severity":"INFO","a":"1","b":"2"}"#));
}

/// Events log at their own severity.
#[test]
fn test_event_severities() {
    assert_eq!(Event::CursorUnknown.severity(), Severity::Warn);
    assert_eq!(Event::CursorStaleResume.severity(), Severity::Info);
    assert_eq!(Event::ConfigLoaded.as_str(), "CONFIG_LOADED");
}

// =============================================================================
// Metrics
// =============================================================================

/// Counters reflect activity and serialize to JSON.
#[test]
fn test_store_metrics_json() {
    let store: OrderedIndexStore<i64, RecordRef<u8>> = OrderedIndexStore::default();
    for id in 0..4u8 {
        store.insert(i64::from(id), RecordRef::new(RecordKey::new(vec![id]), id));
    }
    store.remove(&0, &RecordRef::new(RecordKey::new(vec![0]), 0));
    store.remove(&0, &RecordRef::new(RecordKey::new(vec![0]), 0));

    let _ = store.scan_all(Direction::Ascending);
    let _ = store.scan(
        ScanDescriptor::all(Direction::Ascending).with_cursor(Cursor::from_bytes(vec![0])),
    );
    let _ = store.scan(
        ScanDescriptor::all(Direction::Ascending).with_cursor(Cursor::from_bytes(vec![9])),
    );

    let parsed: serde_json::Value = serde_json::from_str(&store.metrics().to_json()).unwrap();
    assert_eq!(parsed["inserts"], 4);
    assert_eq!(parsed["removes"], 1);
    assert_eq!(parsed["noop_removes"], 1);
    assert_eq!(parsed["scans"], 2);
    assert_eq!(parsed["stale_cursor_resumes"], 1);
    assert_eq!(parsed["unknown_cursors"], 1);
}

// =============================================================================
// Error Codes
// =============================================================================

/// Every error kind has a stable code; only configuration errors are fatal.
#[test]
fn test_error_codes() {
    let cases = [
        (IndexError::InvalidArgument("x".into()), "AERO_INDEX_INVALID_ARGUMENT", false),
        (IndexError::UnknownCursor("00".into()), "AERO_INDEX_UNKNOWN_CURSOR", false),
        (IndexError::MalformedCursor("x".into()), "AERO_INDEX_MALFORMED_CURSOR", false),
        (IndexError::Config("x".into()), "AERO_INDEX_CONFIG_INVALID", true),
    ];
    for (err, code, fatal) in cases {
        assert_eq!(err.code(), code);
        assert_eq!(err.is_fatal(), fatal);
    }
}
