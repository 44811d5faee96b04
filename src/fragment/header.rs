//! Wire constants and the decoded view of a header fragment.
//!
//! A logical response starts with a header fragment laid out as:
//!
//! ```text
//! offset  0   1   2   3   4   5   6   7   8   9 ...
//!        '?' '#' '#' [type ] [ length (u32 BE) ] [body ...]
//! ```
//!
//! Everything from offset 3 onward is accumulated, so a completed message
//! carries the 2-byte type and 4-byte length in front of its body. Those six
//! bytes are the [`HEADER_OVERHEAD`] subtracted when checking completion.

/// Magic marker opening every header fragment.
pub const FRAME_MARKER: [u8; 3] = [0x3F, 0x23, 0x23];

/// Offset of the big-endian declared payload length.
pub const LENGTH_OFFSET: usize = 5;

/// Offset at which a header fragment's accumulated payload begins.
pub const PAYLOAD_OFFSET: usize = FRAME_MARKER.len();

/// Bytes preceding the body inside the accumulated payload.
pub const HEADER_OVERHEAD: usize = 6;

/// Shortest fragment eligible for header classification.
pub const MIN_HEADER_LEN: usize = LENGTH_OFFSET + 4;

/// Default notification size of the wallet's BLE characteristic.
pub const DEFAULT_MTU: usize = 64;

/// Header information decoded from the first fragment of a message.
///
/// # Examples
///
/// ```
/// use blebridge::fragment::FrameHeader;
/// let header = FrameHeader::new(0x0011, 42);
/// assert_eq!(header.message_type(), 0x0011);
/// assert_eq!(header.declared_length(), 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    message_type: u16,
    declared_length: u32,
}

impl FrameHeader {
    /// Create a new frame header.
    #[must_use]
    pub const fn new(message_type: u16, declared_length: u32) -> Self {
        Self {
            message_type,
            declared_length,
        }
    }

    /// Decode the header fields from a fragment that starts with
    /// [`FRAME_MARKER`].
    ///
    /// Returns `None` when the fragment is shorter than [`MIN_HEADER_LEN`].
    /// The marker itself is not checked here.
    #[must_use]
    pub fn decode(fragment: &[u8]) -> Option<Self> {
        let type_bytes: [u8; 2] = fragment
            .get(PAYLOAD_OFFSET..LENGTH_OFFSET)?
            .try_into()
            .ok()?;
        let length_bytes: [u8; 4] = fragment
            .get(LENGTH_OFFSET..MIN_HEADER_LEN)?
            .try_into()
            .ok()?;
        Some(Self::new(
            u16::from_be_bytes(type_bytes),
            u32::from_be_bytes(length_bytes),
        ))
    }

    /// Write the marker and header fields into a new buffer sized for
    /// `body_capacity` additional bytes.
    #[must_use]
    pub fn encode(&self, body_capacity: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_HEADER_LEN + body_capacity);
        out.extend_from_slice(&FRAME_MARKER);
        out.extend_from_slice(&self.message_type.to_be_bytes());
        out.extend_from_slice(&self.declared_length.to_be_bytes());
        out
    }

    /// Message type carried at offsets 3 and 4.
    #[must_use]
    pub const fn message_type(&self) -> u16 { self.message_type }

    /// Payload length announced by the header.
    #[must_use]
    pub const fn declared_length(&self) -> u32 { self.declared_length }
}
