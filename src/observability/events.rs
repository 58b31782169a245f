//! Observable index events
//!
//! Events are explicit and typed; each carries its own severity.

use std::fmt;

use super::logger::Severity;

/// Observable events of an ordered index store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Store constructed
    IndexCreated,
    /// All entries dropped
    IndexCleared,
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// Scan arguments rejected before traversal
    ScanRejected,
    /// Cursor named a removed entry; scan resumed after its former position
    CursorStaleResume,
    /// Cursor named a record key with no known position
    CursorUnknown,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexCleared => "INDEX_CLEARED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ScanRejected => "SCAN_REJECTED",
            Event::CursorStaleResume => "CURSOR_STALE_RESUME",
            Event::CursorUnknown => "CURSOR_UNKNOWN",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexCreated | Event::IndexCleared | Event::ConfigLoaded => Severity::Info,
            Event::CursorStaleResume => Severity::Info,
            Event::ScanRejected | Event::CursorUnknown => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::IndexCreated,
            Event::IndexCleared,
            Event::ConfigLoaded,
            Event::ScanRejected,
            Event::CursorStaleResume,
            Event::CursorUnknown,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_rejections_are_warnings() {
        assert_eq!(Event::ScanRejected.severity(), Severity::Warn);
        assert_eq!(Event::CursorUnknown.severity(), Severity::Warn);
        assert_eq!(Event::IndexCreated.severity(), Severity::Info);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::CursorStaleResume), "CURSOR_STALE_RESUME");
    }
}
