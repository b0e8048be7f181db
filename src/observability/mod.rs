//! Observability for the field framework
//!
//! - Structured logging (JSON lines)
//! - Typed events for registry, assembly and walker activity
//!
//! Observability is read-only: nothing here changes the outcome of an
//! operation, and a failed write is ignored.
//!
//! # Usage
//!
//! ```ignore
//! use related::observability::{log_event, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! log_event(Event::ModelRegistered, &[("model", "Person")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    #[cfg(test)]
    recorded::push(event);
    Logger::log(event.severity(), event.as_str(), fields);
}
