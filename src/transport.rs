//! The BLE transport seam.
//!
//! Connection establishment and GATT discovery live outside this crate. A
//! [`Transport`] hands back a stream of raw notification payloads once a
//! device is connected and accepts raw bytes for the write characteristic.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::{address::DeviceAddress, error::TransportError};

/// Notifications from the device, one item per characteristic
/// notification. The stream ends when the link goes away.
pub type NotificationStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Byte-level access to a wallet's BLE characteristics.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connect to `device` and subscribe to its notify characteristic.
    ///
    /// Each successful call yields a fresh notification stream.
    async fn connect(&self, device: &DeviceAddress) -> Result<NotificationStream, TransportError>;

    /// Write `bytes` to the device's write characteristic.
    async fn write(&self, bytes: Bytes) -> Result<(), TransportError>;

    /// Tear down the link to `device`.
    async fn disconnect(&self, device: &DeviceAddress) -> Result<(), TransportError>;
}
