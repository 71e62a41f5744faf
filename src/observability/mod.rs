//! Observability for the binding layer
//!
//! - Structured logging (JSON lines)
//! - Counter metrics
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes the outcome of a fetch,
//! save or stream delivery.
//!
//! # Usage
//!
//! ```
//! use recordbind::observability::{log_event, metrics, Event};
//!
//! log_event(Event::FetchExecuted, &[("entity", "Player"), ("count", "3")]);
//! metrics().record_fetch(3);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{LogStream, Logger, Severity};
pub use metrics::{metrics, MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
