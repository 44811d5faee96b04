//! Metric helpers for `blebridge`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking connected sessions.
pub const SESSIONS_CONNECTED: &str = "blebridge_sessions_connected";
/// Name of the counter tracking notification fragments received.
pub const FRAGMENTS_RECEIVED: &str = "blebridge_fragments_received_total";
/// Name of the counter tracking reassembled responses.
pub const MESSAGES_REASSEMBLED: &str = "blebridge_messages_reassembled_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "blebridge_errors_total";

/// Category of a recorded error.
#[derive(Clone, Copy, Debug)]
pub enum ErrorKind {
    /// Framing violation detected during reassembly.
    Protocol,
    /// Failure reported by the transport.
    Transport,
    /// A response arrived with nobody waiting for it.
    Unclaimed,
}

impl ErrorKind {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Protocol => "protocol",
            ErrorKind::Transport => "transport",
            ErrorKind::Unclaimed => "unclaimed",
        }
    }
}

/// Increment the connected sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_CONNECTED).increment(1.0);
}

/// Decrement the connected sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_CONNECTED).decrement(1.0);
}

/// Record a received notification fragment.
pub fn inc_fragments() {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_RECEIVED).increment(1);
}

/// Record a completed reassembly.
pub fn inc_messages() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_REASSEMBLED).increment(1);
}

/// Record an error occurrence.
pub fn inc_errors(kind: ErrorKind) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}
