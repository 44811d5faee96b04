//! Canonical error and result types for the crate.
//!
//! [`TransportError`] is what a [`Transport`](crate::transport::Transport)
//! implementation reports; [`BridgeError`] is the single surface returned by
//! sessions and the bridge, wrapping transport and reassembly failures.

use std::{io, time::Duration};

use thiserror::Error;

use crate::{address::DeviceAddress, fragment::ReassemblyError};

/// Failures raised by the BLE transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No link is established.
    #[error("transport not connected")]
    NotConnected,
    /// The link was closed underneath us.
    #[error("transport closed")]
    Closed,
    /// An I/O failure in the underlying stack.
    #[error("transport i/o error: {0}")]
    Io(#[from] io::Error),
    /// The peer or the platform rejected the operation.
    #[error("transport rejected operation: {0}")]
    Rejected(String),
}

/// Top-level error type exposed by `blebridge`.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The inbound notification stream violated the framing protocol.
    #[error("protocol error: {0}")]
    Protocol(#[from] ReassemblyError),
    /// The transport failed while writing or delivering notifications.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The session disconnected while a response was pending.
    #[error("device disconnected")]
    Disconnected,
    /// A newer receive request replaced this one.
    #[error("receive request superseded by a newer request")]
    Superseded,
    /// No response arrived within the configured window.
    #[error("no response within {0:?}")]
    Timeout(Duration),
    /// The operation requires a connected device.
    #[error("no device connected")]
    NotConnected,
    /// The request names a device other than the connected one.
    #[error("unknown device {0}")]
    UnknownDevice(DeviceAddress),
    /// A device address could not be parsed.
    #[error("invalid device address: {0:?}")]
    InvalidAddress(String),
    /// Request data was not valid hexadecimal.
    #[error("invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The bridge call could not be decoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// A call of the same kind is already in flight.
    #[error("{0} already in progress")]
    Busy(&'static str),
}

impl BridgeError {
    /// Stable numeric code reported to bridge callers.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::InvalidHex(_) => 401,
            Self::InvalidAddress(_) => 402,
            Self::UnknownDevice(_) => 404,
            Self::Busy(_) => 409,
            Self::Timeout(_) => 408,
            Self::Superseded => 410,
            Self::Protocol(_) => 500,
            Self::Transport(_) => 502,
            Self::NotConnected => 503,
            Self::Disconnected => 504,
        }
    }

    /// Returns true if retrying after reconnecting may succeed.
    #[must_use]
    pub const fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::NotConnected | Self::Transport(TransportError::Closed)
        )
    }
}

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
