//! Outbound helper that frames a body and splits it into notifications.
//!
//! The wallet side of the link emits one header fragment followed by raw
//! continuation fragments, each at most one MTU long. [`Fragmenter`]
//! reproduces that layout so device simulators and diagnostics can generate
//! traffic the [`ReassemblyBuffer`](super::ReassemblyBuffer) accepts.
//!
//! Continuations carry no marker of their own. A continuation that happens
//! to begin with [`FRAME_MARKER`](super::FRAME_MARKER) will be read as a new
//! header by the receiver; the wire protocol has no escape for this.

use std::num::NonZeroUsize;

use thiserror::Error;

use super::{DEFAULT_MTU, FrameHeader, MIN_HEADER_LEN};

/// Errors produced while framing outbound bodies.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The body length does not fit the 32-bit length field.
    #[error("body of {len} bytes exceeds the 32-bit length field")]
    BodyTooLarge { len: usize },
    /// The MTU cannot hold a complete header.
    #[error("mtu {mtu} is smaller than the {MIN_HEADER_LEN}-byte header")]
    MtuTooSmall { mtu: usize },
}

/// Build a complete wire frame: marker, message type, length, body.
///
/// # Errors
///
/// Returns [`FragmentationError::BodyTooLarge`] when `body` is longer than
/// `u32::MAX` bytes.
///
/// # Examples
///
/// ```
/// use blebridge::fragment::encode_frame;
/// let frame = encode_frame(0x0011, &[0xCC, 0xDD]).expect("small body");
/// assert_eq!(frame, [0x3F, 0x23, 0x23, 0x00, 0x11, 0, 0, 0, 2, 0xCC, 0xDD]);
/// ```
pub fn encode_frame(message_type: u16, body: &[u8]) -> Result<Vec<u8>, FragmentationError> {
    let declared = u32::try_from(body.len())
        .map_err(|_| FragmentationError::BodyTooLarge { len: body.len() })?;
    let mut frame = FrameHeader::new(message_type, declared).encode(body.len());
    frame.extend_from_slice(body);
    Ok(frame)
}

/// Splits framed messages into MTU-sized notification fragments.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    mtu: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter emitting fragments of at most `mtu` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::MtuTooSmall`] when `mtu` cannot hold
    /// the header fields.
    pub fn new(mtu: usize) -> Result<Self, FragmentationError> {
        match NonZeroUsize::new(mtu) {
            Some(mtu) if mtu.get() >= MIN_HEADER_LEN => Ok(Self { mtu }),
            _ => Err(FragmentationError::MtuTooSmall { mtu }),
        }
    }

    /// Maximum fragment size in bytes.
    #[must_use]
    pub const fn mtu(&self) -> NonZeroUsize { self.mtu }

    /// Frame `body` and split the frame into fragments.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::BodyTooLarge`] when the body does not
    /// fit the length field.
    pub fn fragment(
        &self,
        message_type: u16,
        body: &[u8],
    ) -> Result<Vec<Vec<u8>>, FragmentationError> {
        let frame = encode_frame(message_type, body)?;
        Ok(self.split(&frame))
    }

    /// Split an already framed message into fragments.
    #[must_use]
    pub fn split(&self, frame: &[u8]) -> Vec<Vec<u8>> {
        frame.chunks(self.mtu.get()).map(<[u8]>::to_vec).collect()
    }
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            mtu: NonZeroUsize::new(DEFAULT_MTU).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
