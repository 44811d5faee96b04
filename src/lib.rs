#![doc(html_root_url = "https://docs.rs/blebridge/latest")]
//! Public API for the `blebridge` library.
//!
//! This crate connects a hardware-wallet SDK's request/response channel to
//! a BLE transport: it reassembles the wallet's notification fragments into
//! complete responses and hands each one to the single caller waiting for
//! it.

pub mod address;
pub mod bridge;
pub mod config;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod session;
pub mod transport;
pub mod waiter;

pub use address::DeviceAddress;
pub use bridge::{Bridge, BridgeRequest, BridgeResponse, ErrorBody, RequestKind};
pub use config::SessionConfig;
pub use error::{BridgeError, Result, TransportError};
pub use fragment::{
    Classification,
    CompletedMessage,
    FRAME_MARKER,
    FrameHeader,
    FragmentationError,
    Fragmenter,
    HEADER_OVERHEAD,
    ReassemblyBuffer,
    ReassemblyConfig,
    ReassemblyError,
    classify,
    encode_frame,
};
pub use metrics::{ERRORS_TOTAL, FRAGMENTS_RECEIVED, MESSAGES_REASSEMBLED, SESSIONS_CONNECTED};
pub use session::Session;
pub use transport::{NotificationStream, Transport};
pub use waiter::{ResponseHandle, ResponseSlot};
