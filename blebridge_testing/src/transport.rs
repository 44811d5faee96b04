//! In-memory [`Transport`] double.

use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use blebridge::{DeviceAddress, NotificationStream, Transport, TransportError};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;

type Notification = Result<Bytes, TransportError>;

/// Computes the notifications a simulated wallet sends for a request.
pub type Responder = Arc<dyn Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync>;

#[derive(Default)]
struct Inner {
    notify: Mutex<Option<mpsc::UnboundedSender<Notification>>>,
    written: Mutex<Vec<Bytes>>,
    connections: Mutex<Vec<DeviceAddress>>,
    disconnections: Mutex<Vec<DeviceAddress>>,
    responder: Mutex<Option<Responder>>,
    refuse_connections: AtomicBool,
}

/// Cloneable transport whose clones share one simulated link.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Create a transport with no responder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Answer every write with the fragments `responder` returns.
    #[must_use]
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        *lock(&self.inner.responder) = Some(Arc::new(responder));
        self
    }

    /// Make subsequent `connect` calls fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    /// Deliver one notification. Returns `false` when no link is up.
    pub fn notify(&self, fragment: impl AsRef<[u8]>) -> bool {
        self.push(Ok(Bytes::copy_from_slice(fragment.as_ref())))
    }

    /// Deliver several notifications in order.
    pub fn notify_all<I>(&self, fragments: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        fragments.into_iter().all(|fragment| self.notify(fragment))
    }

    /// Surface `error` on the notification stream.
    pub fn inject_error(&self, error: TransportError) -> bool { self.push(Err(error)) }

    /// End the notification stream as if the device vanished.
    pub fn drop_link(&self) { lock(&self.inner.notify).take(); }

    /// Whether a notification stream is currently open.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        lock(&self.inner.notify)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Every payload written so far.
    #[must_use]
    pub fn written(&self) -> Vec<Bytes> { lock(&self.inner.written).clone() }

    /// Devices passed to `connect`, in call order.
    #[must_use]
    pub fn connections(&self) -> Vec<DeviceAddress> { lock(&self.inner.connections).clone() }

    /// Devices passed to `disconnect`, in call order.
    #[must_use]
    pub fn disconnections(&self) -> Vec<DeviceAddress> {
        lock(&self.inner.disconnections).clone()
    }

    fn push(&self, item: Notification) -> bool {
        lock(&self.inner.notify)
            .as_ref()
            .is_some_and(|tx| tx.send(item).is_ok())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, device: &DeviceAddress) -> Result<NotificationStream, TransportError> {
        if self.inner.refuse_connections.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected(format!("connection to {device} refused")));
        }
        lock(&self.inner.connections).push(*device);
        let (tx, mut rx) = mpsc::unbounded_channel();
        *lock(&self.inner.notify) = Some(tx);
        Ok(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }
        .boxed())
    }

    async fn write(&self, bytes: Bytes) -> Result<(), TransportError> {
        if !self.is_linked() {
            return Err(TransportError::NotConnected);
        }
        lock(&self.inner.written).push(bytes.clone());
        let responder = lock(&self.inner.responder).clone();
        if let Some(responder) = responder {
            for fragment in responder(&bytes) {
                self.notify(fragment);
            }
        }
        Ok(())
    }

    async fn disconnect(&self, device: &DeviceAddress) -> Result<(), TransportError> {
        lock(&self.inner.disconnections).push(*device);
        self.drop_link();
        Ok(())
    }
}
