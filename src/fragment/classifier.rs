//! Header/continuation classification of raw notification fragments.

use super::{FRAME_MARKER, FrameHeader, MIN_HEADER_LEN, PAYLOAD_OFFSET};

/// Outcome of inspecting a single fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification<'a> {
    /// The fragment opens a new logical message.
    Header {
        /// Fields decoded from the fragment.
        header: FrameHeader,
        /// Bytes to accumulate, starting at [`PAYLOAD_OFFSET`].
        payload: &'a [u8],
    },
    /// The fragment continues the message in progress and is accumulated
    /// verbatim.
    Continuation(&'a [u8]),
}

impl<'a> Classification<'a> {
    /// Bytes this fragment contributes to the accumulated message.
    #[must_use]
    pub const fn payload(&self) -> &'a [u8] {
        match self {
            Self::Header { payload, .. } | Self::Continuation(payload) => payload,
        }
    }

    /// Whether the fragment was recognised as a header.
    #[must_use]
    pub const fn is_header(&self) -> bool { matches!(self, Self::Header { .. }) }
}

/// Classify `fragment` as a header or continuation.
///
/// A fragment is a header when it is at least [`MIN_HEADER_LEN`] bytes long
/// and its first three bytes equal [`FRAME_MARKER`]. Shorter fragments are
/// always continuations. Classification never fails.
///
/// # Examples
///
/// ```
/// use blebridge::fragment::{Classification, classify};
///
/// let header = [0x3F, 0x23, 0x23, 0xAA, 0xBB, 0x00, 0x00, 0x00, 0x02, 0xCC];
/// match classify(&header) {
///     Classification::Header { header, payload } => {
///         assert_eq!(header.declared_length(), 2);
///         assert_eq!(payload, &[0xAA, 0xBB, 0x00, 0x00, 0x00, 0x02, 0xCC]);
///     }
///     Classification::Continuation(_) => unreachable!(),
/// }
///
/// assert!(!classify(&[0x3F, 0x23, 0x23]).is_header());
/// ```
#[must_use]
pub fn classify(fragment: &[u8]) -> Classification<'_> {
    if fragment.len() >= MIN_HEADER_LEN
        && fragment.starts_with(&FRAME_MARKER)
        && let Some(header) = FrameHeader::decode(fragment)
    {
        return Classification::Header {
            header,
            payload: &fragment[PAYLOAD_OFFSET..],
        };
    }
    Classification::Continuation(fragment)
}
