//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    BootComplete,
    ShutdownStart,
    ShutdownComplete,

    // Configuration and storage
    ConfigLoaded,
    StoreOpened,
    /// Store checksum mismatch (FATAL)
    StoreCorrupted,
    /// A write to the store failed; the record set is unchanged
    StoreWriteFailed,

    // Record operations
    RecordCreated,
    RecordUpdated,
    RecordDeleted,
    /// Input rejected by validation
    ValidationRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "VITALSDB_STARTUP_BEGIN",
            Event::BootComplete => "VITALSDB_STARTUP_COMPLETE",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreCorrupted => "STORE_CORRUPTED",
            Event::StoreWriteFailed => "STORE_WRITE_FAILED",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorrupted)
    }

    /// Failed operations the process survives.
    pub fn is_error(&self) -> bool {
        matches!(self, Event::StoreWriteFailed)
    }

    /// Events reporting rejected input rather than progress.
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::ValidationRejected)
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
    fn test_event_names() {
        assert_eq!(Event::BootStart.as_str(), "VITALSDB_STARTUP_BEGIN");
        assert_eq!(Event::ValidationRejected.to_string(), "VALIDATION_REJECTED");
    }

    #[test]
    fn test_event_classes() {
        assert!(Event::StoreCorrupted.is_fatal());
        assert!(!Event::RecordCreated.is_fatal());
        assert!(Event::ValidationRejected.is_warning());
        assert!(!Event::RecordDeleted.is_warning());
        assert!(Event::StoreWriteFailed.is_error());
        assert!(!Event::StoreCorrupted.is_error());
    }
}
