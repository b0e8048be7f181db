//! Observable events of the field framework
//!
//! Events are explicit and typed. Each one carries the severity it is
//! logged at.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Registry
    /// Model type registered under its name
    ModelRegistered,
    /// Forward reference resolved against the registry
    ForwardRefResolved,
    /// Forward reference looked up but never registered
    ForwardRefUnresolved,

    // Assembly
    /// Model construction aborted by a field error
    ConstructionFailed,

    // Walkers
    /// External tree rejected while decoding
    WalkerDecodeFailed,
    /// External tree carried a key no field declares
    WalkerUnknownKey,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ModelRegistered => "MODEL_REGISTERED",
            Event::ForwardRefResolved => "FORWARD_REF_RESOLVED",
            Event::ForwardRefUnresolved => "FORWARD_REF_UNRESOLVED",
            Event::ConstructionFailed => "CONSTRUCTION_FAILED",
            Event::WalkerDecodeFailed => "WALKER_DECODE_FAILED",
            Event::WalkerUnknownKey => "WALKER_UNKNOWN_KEY",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ModelRegistered | Event::ForwardRefResolved | Event::ConstructionFailed => {
                Severity::Trace
            }
            Event::ForwardRefUnresolved | Event::WalkerDecodeFailed | Event::WalkerUnknownKey => {
                Severity::Warn
            }
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
