//! Observability for vitalsdb
//!
//! Structured JSON lifecycle and operation logging.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. A logging failure never fails an operation
//! 3. No background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use vitalsdb::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordCreated, &[("id", "P001")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_error() {
        Severity::Error
    } else if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_event() {
        assert_eq!(severity_for(Event::StoreCorrupted), Severity::Fatal);
        assert_eq!(severity_for(Event::StoreWriteFailed), Severity::Error);
        assert_eq!(severity_for(Event::ValidationRejected), Severity::Warn);
        assert_eq!(severity_for(Event::RecordCreated), Severity::Info);
    }

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::BootStart);
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", "/tmp/vitals")]);
    }
}
