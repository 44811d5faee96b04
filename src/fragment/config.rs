//! Limits applied while reassembling inbound notifications.

use std::num::NonZeroUsize;

use super::HEADER_OVERHEAD;

/// Default ceiling on the body length a header may declare (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(1024 * 1024) {
    Some(size) => size,
    None => unreachable!(),
};

/// Settings that bound reassembly resource usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Largest body length a header fragment may declare. Headers announcing
    /// more are rejected instead of waiting for bytes that will never come.
    pub max_message_size: NonZeroUsize,
}

impl ReassemblyConfig {
    /// Create a configuration with the given declared-length ceiling.
    #[must_use]
    pub const fn new(max_message_size: NonZeroUsize) -> Self { Self { max_message_size } }

    /// Most bytes the buffer may hold without completing a message.
    ///
    /// This is the declared-length ceiling plus the fixed header overhead;
    /// orphan continuations that pile up past it are discarded.
    #[must_use]
    pub const fn buffer_limit(&self) -> usize {
        self.max_message_size.get().saturating_add(HEADER_OVERHEAD)
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self { Self::new(DEFAULT_MAX_MESSAGE_SIZE) }
}
