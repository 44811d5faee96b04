//! Inbound helper that stitches notification fragments back into responses.
//!
//! [`ReassemblyBuffer`] holds the state of one in-progress message: the
//! length announced by the latest header fragment and every payload byte
//! received since. It is a synchronous state machine; callers feed it one
//! fragment at a time and receive a [`CompletedMessage`] once
//! `accumulated - HEADER_OVERHEAD >= declared_length`.

use tracing::{debug, trace, warn};

use super::{
    Classification,
    HEADER_OVERHEAD,
    ReassemblyConfig,
    ReassemblyError,
    classify,
};

/// A fully reassembled response.
///
/// The bytes are exactly what was accumulated: the 2-byte message type, the
/// 4-byte declared length and the body, including any padding that arrived
/// in the final fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedMessage {
    declared_length: u32,
    bytes: Vec<u8>,
}

impl CompletedMessage {
    /// Construct a new [`CompletedMessage`].
    #[must_use]
    pub fn new(declared_length: u32, bytes: Vec<u8>) -> Self {
        Self {
            declared_length,
            bytes,
        }
    }

    /// Body length announced by the header fragment.
    #[must_use]
    pub const fn declared_length(&self) -> u32 { self.declared_length }

    /// Borrow the accumulated bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { self.bytes.as_slice() }

    /// Consume the message, returning the owned bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> { self.bytes }

    /// Lowercase hexadecimal rendering of the accumulated bytes.
    #[must_use]
    pub fn to_hex(&self) -> String { hex::encode(&self.bytes) }

    /// Message type carried in the first two accumulated bytes.
    #[must_use]
    pub fn message_type(&self) -> Option<u16> {
        let bytes: [u8; 2] = self.bytes.get(..2)?.try_into().ok()?;
        Some(u16::from_be_bytes(bytes))
    }

    /// Body bytes, trimmed to the declared length.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        let start = HEADER_OVERHEAD.min(self.bytes.len());
        let declared = usize::try_from(self.declared_length).unwrap_or(usize::MAX);
        let end = start.saturating_add(declared).min(self.bytes.len());
        &self.bytes[start..end]
    }
}

/// Stateful accumulator for one logical response at a time.
///
/// A header fragment always restarts the buffer. Continuations arriving
/// before any header are held but never complete a message; if they pile up
/// past [`ReassemblyConfig::buffer_limit`] the buffer is cleared and
/// [`ReassemblyError::BufferOverflow`] is returned.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    config: ReassemblyConfig,
    declared_length: u32,
    framed: bool,
    accumulated: Vec<u8>,
}

impl ReassemblyBuffer {
    /// Create an empty buffer using `config`.
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            declared_length: 0,
            framed: false,
            accumulated: Vec::new(),
        }
    }

    /// Process one notification fragment.
    ///
    /// Returns `Ok(Some(_))` when the fragment completes a message and
    /// `Ok(None)` while more bytes are required. The buffer is empty again
    /// after either a completion or an error.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::EmptyFragment`] for a zero-length
    /// fragment (state untouched), [`ReassemblyError::DeclaredLengthTooLarge`]
    /// when a header announces more than the configured ceiling, and
    /// [`ReassemblyError::BufferOverflow`] when accumulated bytes exceed the
    /// buffer limit.
    pub fn push(&mut self, fragment: &[u8]) -> Result<Option<CompletedMessage>, ReassemblyError> {
        if fragment.is_empty() {
            return Err(ReassemblyError::EmptyFragment);
        }

        match classify(fragment) {
            Classification::Header { header, payload } => {
                let declared = header.declared_length();
                let limit = self.config.max_message_size.get();
                if usize::try_from(declared).map_or(true, |len| len > limit) {
                    self.reset();
                    warn!(declared, limit, "header declares oversized message");
                    return Err(ReassemblyError::DeclaredLengthTooLarge { declared, limit });
                }
                if self.framed {
                    debug!(
                        discarded = self.accumulated.len(),
                        "header fragment restarts reassembly"
                    );
                }
                self.accumulated.clear();
                self.accumulated.extend_from_slice(payload);
                self.declared_length = declared;
                self.framed = true;
                trace!(declared, received = payload.len(), "header fragment");
            }
            Classification::Continuation(payload) => {
                self.accumulated.extend_from_slice(payload);
                trace!(
                    received = payload.len(),
                    accumulated = self.accumulated.len(),
                    framed = self.framed,
                    "continuation fragment"
                );
            }
        }

        if self.is_complete() {
            let bytes = std::mem::take(&mut self.accumulated);
            let message = CompletedMessage::new(self.declared_length, bytes);
            self.reset();
            debug!(
                declared = message.declared_length(),
                len = message.as_bytes().len(),
                "message reassembled"
            );
            return Ok(Some(message));
        }

        let limit = self.config.buffer_limit();
        let attempted = self.accumulated.len();
        if attempted > limit {
            self.reset();
            warn!(attempted, limit, "reassembly buffer overflow");
            return Err(ReassemblyError::BufferOverflow { attempted, limit });
        }

        Ok(None)
    }

    /// Discard any partial message.
    pub fn reset(&mut self) {
        self.accumulated.clear();
        self.declared_length = 0;
        self.framed = false;
    }

    /// Length announced by the current header, or 0 when none was seen.
    #[must_use]
    pub const fn declared_length(&self) -> u32 { self.declared_length }

    /// Number of payload bytes accumulated so far.
    #[must_use]
    pub fn accumulated_len(&self) -> usize { self.accumulated.len() }

    /// Whether a header fragment has opened the current message.
    #[must_use]
    pub const fn is_framed(&self) -> bool { self.framed }

    /// Whether the buffer holds no partial state.
    #[must_use]
    pub fn is_idle(&self) -> bool { !self.framed && self.accumulated.is_empty() }

    /// The limits this buffer enforces.
    #[must_use]
    pub const fn config(&self) -> &ReassemblyConfig { &self.config }

    fn is_complete(&self) -> bool {
        let Ok(declared) = usize::try_from(self.declared_length) else {
            return false;
        };
        self.framed && self.accumulated.len() >= declared.saturating_add(HEADER_OVERHEAD)
    }
}
