//! Single-slot delivery of reassembled responses.
//!
//! A [`ResponseSlot`] holds at most one pending receive request. Asking for
//! the next response while one is pending fails the older
//! [`ResponseHandle`] with [`BridgeError::Superseded`] and installs the new
//! one, so a stale request is never answered with a later response.
//!
//! Callers usually write a request first and ask for its reply afterwards,
//! so the reply may complete before anyone waits. After
//! [`ResponseSlot::expect_reply`] the first completion is held until the
//! next [`ResponseSlot::await_next`]. Writing another request or failing the
//! slot discards it.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll, ready},
};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{error::BridgeError, fragment::CompletedMessage};

type Outcome = Result<String, BridgeError>;

/// Future resolving to the next reassembled response, hex encoded.
///
/// Resolves with [`BridgeError::Disconnected`] if the owning slot is dropped
/// without resolving it.
#[derive(Debug)]
#[must_use = "a response handle does nothing unless awaited"]
pub struct ResponseHandle {
    rx: oneshot::Receiver<Outcome>,
}

impl Future for ResponseHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = ready!(Pin::new(&mut self.rx).poll(cx));
        Poll::Ready(outcome.unwrap_or(Err(BridgeError::Disconnected)))
    }
}

/// Holder of the single outstanding receive request.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    pending: Option<oneshot::Sender<Outcome>>,
    expecting: bool,
    held: Option<CompletedMessage>,
}

impl ResponseSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Note that a request was just written and its reply is due.
    ///
    /// A reply held for an earlier request is discarded.
    pub fn expect_reply(&mut self) {
        if self.held.take().is_some() {
            warn!("discarding unclaimed reply to an earlier request");
        }
        self.expecting = true;
    }

    /// Forget an expected reply, for example after a failed write.
    pub fn cancel_reply(&mut self) { self.expecting = false; }

    /// Register interest in the next completed response.
    ///
    /// Any request already pending is failed with
    /// [`BridgeError::Superseded`]. A reply held since the last
    /// [`expect_reply`](Self::expect_reply) resolves the handle at once.
    pub fn await_next(&mut self) -> ResponseHandle {
        let (tx, rx) = oneshot::channel();
        if let Some(stale) = self.pending.take()
            && !stale.is_closed()
        {
            warn!("receive request superseded by a newer request");
            // The stale caller may have gone away in the meantime.
            let _ = stale.send(Err(BridgeError::Superseded));
        }
        match self.held.take() {
            Some(message) => {
                debug!("handing held reply to receive request");
                let _ = tx.send(Ok(message.to_hex()));
            }
            None => self.pending = Some(tx),
        }
        ResponseHandle { rx }
    }

    /// Resolve the pending request with `message`.
    ///
    /// Returns `true` if the message was claimed: either a waiting caller
    /// received it, or it answers an expected reply and is held for the
    /// next request. Otherwise the message is dropped.
    pub fn deliver(&mut self, message: CompletedMessage) -> bool {
        let expecting = std::mem::take(&mut self.expecting);
        if let Some(tx) = self.pending.take() {
            if tx.send(Ok(message.to_hex())).is_ok() {
                return true;
            }
            debug!("receive request abandoned before its response arrived");
        }
        if expecting {
            debug!(len = message.as_bytes().len(), "holding reply until requested");
            self.held = Some(message);
            return true;
        }
        warn!(
            len = message.as_bytes().len(),
            "dropping response with no pending receive request"
        );
        false
    }

    /// Fail the pending request with `error`.
    ///
    /// Any held or expected reply is discarded. Returns `true` if a waiting
    /// caller observed the error.
    pub fn fail(&mut self, error: BridgeError) -> bool {
        self.expecting = false;
        self.held = None;
        let Some(tx) = self.pending.take() else {
            debug!(%error, "no pending receive request to fail");
            return false;
        };
        tx.send(Err(error)).is_ok()
    }

    /// Drop a pending request whose caller has stopped waiting, together
    /// with the reply it expected.
    ///
    /// Returns `true` if an abandoned request was removed.
    pub fn discard_abandoned(&mut self) -> bool {
        if self.pending.as_ref().is_some_and(oneshot::Sender::is_closed) {
            self.pending = None;
            self.expecting = false;
            return true;
        }
        false
    }

    /// Whether a caller is currently waiting.
    #[must_use]
    pub fn is_pending(&self) -> bool { self.pending.as_ref().is_some_and(|tx| !tx.is_closed()) }

    /// Whether a reply is held for the next request.
    #[must_use]
    pub const fn has_held_reply(&self) -> bool { self.held.is_some() }
}

impl Drop for ResponseSlot {
    fn drop(&mut self) {
        if let Some(tx) = self.pending.take() {
            let _ = tx.send(Err(BridgeError::Disconnected));
        }
    }
}
