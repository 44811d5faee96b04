//! Session configuration.
//!
//! [`SessionConfig`] bundles the reassembly limits with the request-level
//! receive timeout. Values are plain data; construct with [`Default`] and
//! adjust through the `with_*` methods.

use std::{num::NonZeroUsize, time::Duration};

use crate::fragment::ReassemblyConfig;

/// Settings applied to every connection a session makes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Limits enforced by the reassembly buffer.
    pub reassembly: ReassemblyConfig,
    /// How long `receive_next` waits before giving up. `None` waits until a
    /// response, an error or a disconnect arrives.
    pub receive_timeout: Option<Duration>,
}

impl SessionConfig {
    /// Override the largest message a header may declare.
    #[must_use]
    pub fn with_max_message_size(mut self, max_message_size: NonZeroUsize) -> Self {
        self.reassembly.max_message_size = max_message_size;
        self
    }

    /// Bound how long `receive_next` waits for a response.
    #[must_use]
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }
}
