//! Fragment framing and reassembly for wallet BLE notifications.
//!
//! The wallet answers every request with a header fragment followed by zero
//! or more continuation fragments. This module collects the wire constants,
//! the classifier that tells the two apart, the stateful buffer that joins
//! them, and the outbound helper that produces the same layout. None of it
//! depends on a transport, so tests and tools reuse it directly.

pub mod classifier;
pub mod config;
pub mod error;
pub mod fragmenter;
pub mod header;
pub mod reassembler;

pub use classifier::{Classification, classify};
pub use config::{DEFAULT_MAX_MESSAGE_SIZE, ReassemblyConfig};
pub use error::ReassemblyError;
pub use fragmenter::{FragmentationError, Fragmenter, encode_frame};
pub use header::{
    DEFAULT_MTU,
    FRAME_MARKER,
    FrameHeader,
    HEADER_OVERHEAD,
    LENGTH_OFFSET,
    MIN_HEADER_LEN,
    PAYLOAD_OFFSET,
};
pub use reassembler::{CompletedMessage, ReassemblyBuffer};

#[cfg(test)]
mod tests;
