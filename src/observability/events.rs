//! Observable events
//!
//! Events are explicit and typed. Each event carries its default severity so
//! call sites never pick one ad hoc.

use std::fmt;

use super::logger::Severity;

/// Observable events in the binding layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Queries
    /// A fetch request was executed against a context
    FetchExecuted,
    /// A fetch request failed in the store
    FetchFailed,
    /// A fetch was attempted with no context available
    ContextMissing,

    // Writes
    /// A context save completed
    SaveCompleted,
    /// A context save failed
    SaveFailed,
    /// A validation rule rejected a value
    ValidationRejected,
    /// A uniqueness check found a conflicting record
    UniqueViolation,

    // Live updates
    /// A subscriber attached to a live stream
    StreamSubscribed,
    /// A live stream was cancelled
    StreamCancelled,
    /// A snapshot was handed to a subscriber
    SnapshotDelivered,
    /// A change arrived with no outstanding demand
    SnapshotDeferred,
    /// Re-executing the query after a change failed
    RefetchFailed,

    // Configuration
    /// Configuration loaded and installed
    ConfigLoaded,
}

impl Event {
    /// Returns the event name as used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::FetchExecuted => "FETCH_EXECUTED",
            Event::FetchFailed => "FETCH_FAILED",
            Event::ContextMissing => "CONTEXT_MISSING",
            Event::SaveCompleted => "SAVE_COMPLETED",
            Event::SaveFailed => "SAVE_FAILED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::UniqueViolation => "UNIQUE_VIOLATION",
            Event::StreamSubscribed => "STREAM_SUBSCRIBED",
            Event::StreamCancelled => "STREAM_CANCELLED",
            Event::SnapshotDelivered => "SNAPSHOT_DELIVERED",
            Event::SnapshotDeferred => "SNAPSHOT_DEFERRED",
            Event::RefetchFailed => "REFETCH_FAILED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Default severity for this event
    pub fn severity(&self) -> Severity {
        match self {
            Event::FetchExecuted
            | Event::SnapshotDelivered
            | Event::SnapshotDeferred => Severity::Trace,
            Event::SaveCompleted
            | Event::StreamSubscribed
            | Event::StreamCancelled
            | Event::ConfigLoaded
            | Event::ValidationRejected
            | Event::UniqueViolation => Severity::Info,
            Event::RefetchFailed | Event::ContextMissing => Severity::Warn,
            Event::FetchFailed | Event::SaveFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
