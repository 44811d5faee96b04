//! One device connection and its request/response pairing.
//!
//! A [`Session`] owns the transport, the reassembly buffer and the pending
//! receive request for a single wallet. Notifications are pumped by a
//! background task that feeds each fragment into the buffer under the same
//! lock that guards the pending request, so completion and delivery are a
//! single step. Disconnecting (explicitly, by the stream ending, or by
//! dropping the session) fails whoever is still waiting.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    address::DeviceAddress,
    config::SessionConfig,
    error::{BridgeError, Result},
    fragment::{ReassemblyBuffer, ReassemblyError},
    metrics::{self, ErrorKind},
    transport::{NotificationStream, Transport},
    waiter::{ResponseHandle, ResponseSlot},
};

/// Mutable state shared between the session and its notification pump.
#[derive(Debug)]
struct SessionState {
    device: Option<DeviceAddress>,
    buffer: ReassemblyBuffer,
    slot: ResponseSlot,
}

impl SessionState {
    fn on_fragment(&mut self, fragment: &[u8]) {
        metrics::inc_fragments();
        match self.buffer.push(fragment) {
            Ok(Some(message)) => {
                metrics::inc_messages();
                if !self.slot.deliver(message) {
                    metrics::inc_errors(ErrorKind::Unclaimed);
                }
            }
            Ok(None) => {}
            Err(ReassemblyError::EmptyFragment) => debug!("ignoring empty notification"),
            Err(err) => {
                metrics::inc_errors(ErrorKind::Protocol);
                self.slot.fail(err.into());
            }
        }
    }

    fn fail(&mut self, error: BridgeError) {
        self.buffer.reset();
        self.slot.fail(error);
    }
}

#[derive(Debug)]
struct Link {
    device: DeviceAddress,
    cancel: CancellationToken,
    pump: JoinHandle<()>,
}

/// A connection to one wallet over a [`Transport`].
///
/// Dropping a connected session stops its notification pump and fails any
/// pending receive, but it cannot call the async [`Transport::disconnect`].
/// Call [`disconnect`](Self::disconnect) first to release the BLE link.
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    state: Arc<Mutex<SessionState>>,
    link: tokio::sync::Mutex<Option<Link>>,
}

impl<T: Transport> Session<T> {
    /// Create a disconnected session.
    #[must_use]
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let state = SessionState {
            device: None,
            buffer: ReassemblyBuffer::new(config.reassembly),
            slot: ResponseSlot::new(),
        };
        Self {
            transport,
            config,
            state: Arc::new(Mutex::new(state)),
            link: tokio::sync::Mutex::new(None),
        }
    }

    /// Connect to `device` and start pumping its notifications.
    ///
    /// Connecting to the device that is already connected is a no-op. Any
    /// other existing link is torn down first.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the transport cannot connect.
    pub async fn connect(&self, device: DeviceAddress) -> Result<()> {
        let mut link = self.link.lock().await;
        if let Some(current) = link.take() {
            if current.device == device && !current.pump.is_finished() && self.is_connected() {
                debug!(%device, "already connected");
                *link = Some(current);
                return Ok(());
            }
            let previous = current.device;
            self.teardown(current);
            if let Err(err) = self.transport.disconnect(&previous).await {
                warn!(device = %previous, error = %err, "failed to disconnect previous device");
            }
        }

        let stream = self.transport.connect(&device).await?;
        {
            let mut state = self.lock_state();
            state.buffer.reset();
            state.device = Some(device);
        }
        let cancel = CancellationToken::new();
        let pump = tokio::spawn(pump_notifications(
            stream,
            Arc::clone(&self.state),
            cancel.clone(),
            device,
        ));
        *link = Some(Link {
            device,
            cancel,
            pump,
        });
        metrics::inc_sessions();
        info!(%device, "connected");
        Ok(())
    }

    /// Disconnect from `device`.
    ///
    /// Any pending receive request fails with [`BridgeError::Disconnected`]
    /// and partial reassembly state is discarded. Disconnecting while no
    /// device is connected succeeds without touching the transport.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnknownDevice`] when `device` is not the
    /// connected device, or [`BridgeError::Transport`] if the transport
    /// fails to disconnect.
    pub async fn disconnect(&self, device: &DeviceAddress) -> Result<()> {
        let mut link = self.link.lock().await;
        let Some(current) = link.take() else {
            debug!(%device, "disconnect requested while not connected");
            return Ok(());
        };
        if current.device != *device {
            *link = Some(current);
            return Err(BridgeError::UnknownDevice(*device));
        }
        self.teardown(current);
        self.transport.disconnect(device).await?;
        info!(%device, "disconnected");
        Ok(())
    }

    /// Write `bytes` to the connected device.
    ///
    /// The first response completed afterwards answers this request. If it
    /// arrives before anyone asks for it, it is held for the next
    /// [`await_next`](Self::await_next) and discarded by the next `send`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] without a live connection, or
    /// [`BridgeError::Transport`] if the write fails.
    pub async fn send(&self, bytes: Bytes) -> Result<()> {
        let device = {
            let mut state = self.lock_state();
            let device = state.device.ok_or(BridgeError::NotConnected)?;
            state.slot.expect_reply();
            device
        };
        debug!(%device, len = bytes.len(), "writing request");
        if let Err(err) = self.transport.write(bytes).await {
            self.lock_state().slot.cancel_reply();
            return Err(err.into());
        }
        Ok(())
    }

    /// Register interest in the next reassembled response.
    ///
    /// A request that is already pending is failed with
    /// [`BridgeError::Superseded`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotConnected`] without a live connection.
    pub fn await_next(&self) -> Result<ResponseHandle> {
        let mut state = self.lock_state();
        if state.device.is_none() {
            return Err(BridgeError::NotConnected);
        }
        Ok(state.slot.await_next())
    }

    /// Wait for the next reassembled response, hex encoded.
    ///
    /// When a receive timeout is configured and expires, partial reassembly
    /// state is discarded and [`BridgeError::Timeout`] is returned.
    ///
    /// # Errors
    ///
    /// Returns the error that failed the request: a protocol or transport
    /// error, a disconnect, supersession by a newer request, or a timeout.
    pub async fn receive_next(&self) -> Result<String> {
        let handle = self.await_next()?;
        let Some(limit) = self.config.receive_timeout else {
            return handle.await;
        };
        if let Ok(outcome) = tokio::time::timeout(limit, handle).await {
            return outcome;
        }
        let mut state = self.lock_state();
        if state.slot.discard_abandoned() {
            state.buffer.reset();
        }
        warn!(?limit, "timed out waiting for response");
        Err(BridgeError::Timeout(limit))
    }

    /// Address of the connected device, if the link is up.
    #[must_use]
    pub fn device(&self) -> Option<DeviceAddress> { self.lock_state().device }

    /// Whether a device is connected and its notifications are flowing.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.device().is_some() }

    /// Settings this session applies.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig { &self.config }

    /// Borrow the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T { &self.transport }

    fn teardown(&self, link: Link) {
        link.cancel.cancel();
        close(&mut self.lock_state());
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> { lock(&self.state) }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        if let Some(link) = self.link.get_mut().take() {
            link.cancel.cancel();
            close(&mut lock(&self.state));
        }
    }
}

/// Mark the link down and fail whoever is waiting. The gauge only drops for
/// a link that was still up, so a link the pump already closed counts once.
fn close(state: &mut SessionState) {
    if state.device.take().is_some() {
        metrics::dec_sessions();
    }
    state.fail(BridgeError::Disconnected);
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pump_notifications(
    mut stream: NotificationStream,
    state: Arc<Mutex<SessionState>>,
    cancel: CancellationToken,
    device: DeviceAddress,
) {
    loop {
        let item = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            item = stream.next() => item,
        };
        if cancel.is_cancelled() {
            return;
        }
        match item {
            Some(Ok(fragment)) => lock(&state).on_fragment(&fragment),
            Some(Err(err)) => {
                warn!(%device, error = %err, "notification stream error");
                metrics::inc_errors(ErrorKind::Transport);
                lock(&state).fail(err.into());
            }
            None => {
                info!(%device, "notification stream ended");
                let mut state = lock(&state);
                if !cancel.is_cancelled() {
                    close(&mut state);
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroUsize,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use rstest::{fixture, rstest};
    use tokio::sync::mpsc;

    use super::Session;
    use crate::{
        address::DeviceAddress,
        config::SessionConfig,
        error::{BridgeError, TransportError},
        fragment::{Fragmenter, encode_frame},
        transport::{NotificationStream, Transport},
    };

    type Notification = Result<Bytes, TransportError>;

    #[derive(Clone, Default)]
    struct ChannelTransport {
        notify: Arc<Mutex<Option<mpsc::UnboundedSender<Notification>>>>,
        written: Arc<Mutex<Vec<Bytes>>>,
    }

    impl ChannelTransport {
        fn notify(&self, fragment: &[u8]) {
            self.push(Ok(Bytes::copy_from_slice(fragment)));
        }

        fn push(&self, item: Notification) {
            let guard = self.notify.lock().expect("notify lock");
            guard
                .as_ref()
                .expect("device connected")
                .send(item)
                .expect("pump alive");
        }

        fn close(&self) { self.notify.lock().expect("notify lock").take(); }
    }

    #[async_trait]
    impl Transport for ChannelTransport {
        async fn connect(&self, _: &DeviceAddress) -> Result<NotificationStream, TransportError> {
            let (tx, mut rx) = mpsc::unbounded_channel();
            *self.notify.lock().expect("notify lock") = Some(tx);
            Ok(async_stream::stream! {
                while let Some(item) = rx.recv().await {
                    yield item;
                }
            }
            .boxed())
        }

        async fn write(&self, bytes: Bytes) -> Result<(), TransportError> {
            self.written.lock().expect("written lock").push(bytes);
            Ok(())
        }

        async fn disconnect(&self, _: &DeviceAddress) -> Result<(), TransportError> {
            self.close();
            Ok(())
        }
    }

    const DEVICE: DeviceAddress = DeviceAddress::new([0xEA, 0x21, 0x88, 0x12, 0x75, 0x86]);

    #[fixture]
    fn transport() -> ChannelTransport { ChannelTransport::default() }

    async fn connected(
        transport: &ChannelTransport,
        config: SessionConfig,
    ) -> Session<ChannelTransport> {
        let session = Session::new(transport.clone(), config);
        session.connect(DEVICE).await.expect("connect");
        session
    }

    #[rstest]
    #[tokio::test]
    async fn reassembled_response_resolves_receive(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let handle = session.await_next().expect("connected");

        for fragment in Fragmenter::new(16)
            .expect("mtu")
            .fragment(0x0011, &[0xAB; 30])
            .expect("fragments")
        {
            transport.notify(&fragment);
        }

        let hex = handle.await.expect("response");
        let expected = encode_frame(0x0011, &[0xAB; 30]).expect("frame");
        assert_eq!(hex, hex::encode(&expected[3..]));
    }

    #[rstest]
    #[tokio::test]
    async fn send_writes_through_transport(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        session
            .send(Bytes::from_static(&[1, 2, 3]))
            .await
            .expect("send");

        let written = transport.written.lock().expect("written lock").clone();
        assert_eq!(written, [Bytes::from_static(&[1, 2, 3])]);
    }

    #[rstest]
    #[tokio::test]
    async fn operations_require_connection(transport: ChannelTransport) {
        let session = Session::new(transport, SessionConfig::default());

        assert!(matches!(session.await_next(), Err(BridgeError::NotConnected)));
        assert!(matches!(
            session.send(Bytes::from_static(&[1])).await,
            Err(BridgeError::NotConnected)
        ));
        session.disconnect(&DEVICE).await.expect("no-op disconnect");
    }

    #[rstest]
    #[tokio::test]
    async fn disconnect_fails_pending_receive(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let handle = session.await_next().expect("connected");

        session.disconnect(&DEVICE).await.expect("disconnect");

        assert!(matches!(handle.await, Err(BridgeError::Disconnected)));
        assert!(!session.is_connected());
    }

    #[rstest]
    #[tokio::test]
    async fn disconnect_of_other_device_is_rejected(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let other = DeviceAddress::new([0; 6]);

        let err = session.disconnect(&other).await.expect_err("unknown device");

        assert!(matches!(err, BridgeError::UnknownDevice(address) if address == other));
        assert!(session.is_connected());
    }

    #[rstest]
    #[tokio::test]
    async fn stream_end_fails_pending_receive(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let handle = session.await_next().expect("connected");

        transport.close();

        assert!(matches!(handle.await, Err(BridgeError::Disconnected)));
        assert!(!session.is_connected());
    }

    #[rstest]
    #[tokio::test]
    async fn transport_error_fails_receive_and_clears_partial(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let fragments = Fragmenter::new(16)
            .expect("mtu")
            .fragment(0x0001, &[0x11; 20])
            .expect("fragments");

        let first = session.await_next().expect("connected");
        transport.notify(&fragments[0]);
        transport.push(Err(TransportError::Rejected("gatt error".into())));
        assert!(matches!(
            first.await,
            Err(BridgeError::Transport(TransportError::Rejected(_)))
        ));

        // The stale continuation cannot complete anything once the buffer is
        // cleared; the next full message still arrives intact.
        let second = session.await_next().expect("connected");
        transport.notify(&fragments[1]);
        let fresh = encode_frame(0x0002, &[0x22]).expect("frame");
        transport.notify(&fresh);

        assert_eq!(second.await.expect("response"), hex::encode(&fresh[3..]));
    }

    #[rstest]
    #[tokio::test]
    async fn protocol_error_fails_receive(transport: ChannelTransport) {
        let config = SessionConfig::default()
            .with_max_message_size(NonZeroUsize::new(8).expect("non-zero"));
        let session = connected(&transport, config).await;
        let handle = session.await_next().expect("connected");

        transport.notify(&encode_frame(0x0001, &[0; 9]).expect("frame"));

        assert!(matches!(handle.await, Err(BridgeError::Protocol(_))));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn receive_times_out_and_clears_partial(transport: ChannelTransport) {
        let config = SessionConfig::default().with_receive_timeout(Duration::from_secs(2));
        let session = connected(&transport, config).await;
        let fragments = Fragmenter::new(16)
            .expect("mtu")
            .fragment(0x0001, &[0x33; 40])
            .expect("fragments");
        assert_eq!(fragments.len(), 4);

        transport.notify(&fragments[0]);
        let err = session.receive_next().await.expect_err("timeout");
        assert!(matches!(err, BridgeError::Timeout(limit) if limit == Duration::from_secs(2)));

        // Had the partial message survived the timeout, these would complete
        // it and answer the next request with stale bytes.
        let next = session.await_next().expect("connected");
        for fragment in &fragments[1..] {
            transport.notify(fragment);
        }
        let fresh = encode_frame(0x0002, &[0x44]).expect("frame");
        transport.notify(&fresh);
        assert_eq!(next.await.expect("response"), hex::encode(&fresh[3..]));
    }

    #[rstest]
    #[tokio::test]
    async fn dropping_session_fails_pending_receive(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let handle = session.await_next().expect("connected");

        drop(session);

        assert!(matches!(handle.await, Err(BridgeError::Disconnected)));
    }

    #[rstest]
    #[tokio::test]
    async fn reconnecting_same_device_keeps_link(transport: ChannelTransport) {
        let session = connected(&transport, SessionConfig::default()).await;
        let handle = session.await_next().expect("connected");

        session.connect(DEVICE).await.expect("idempotent connect");
        transport.notify(&encode_frame(0x0001, &[]).expect("frame"));

        assert_eq!(handle.await.expect("response"), "000100000000");
    }
}
