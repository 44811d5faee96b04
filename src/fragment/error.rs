//! Error types emitted by the reassembly layer.
//!
//! Every variant is recoverable: the buffer clears itself before returning
//! the error, so the next header fragment starts from a clean slate.

use thiserror::Error;

/// Protocol violations detected while reassembling notifications.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The transport handed over a zero-length notification.
    #[error("empty fragment")]
    EmptyFragment,
    /// A header announced more bytes than the configured ceiling.
    #[error("declared length {declared} exceeds limit {limit}")]
    DeclaredLengthTooLarge { declared: u32, limit: usize },
    /// Accumulated bytes grew past the buffer limit without completing.
    #[error("reassembly buffer overflow: {attempted} bytes exceeds limit {limit}")]
    BufferOverflow { attempted: usize, limit: usize },
}
