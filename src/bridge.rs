//! JSON request surface for the in-page hardware SDK.
//!
//! The SDK's low-level plugin issues four calls: `send`, `receive`,
//! `connect` and `disconnect`. [`Bridge`] decodes them, runs them against a
//! [`Session`] and encodes a [`BridgeResponse`]. Byte payloads travel as
//! lowercase hex; device identifiers are BLE MAC addresses.
//!
//! At most one `send`, `connect` or `disconnect` may be in flight; a second
//! concurrent call of the same kind is refused with [`BridgeError::Busy`].
//! `receive` instead follows the session's replace policy: a new `receive`
//! fails the pending one with [`BridgeError::Superseded`], so an SDK that
//! gave up on a request after its own timeout can always ask again.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    address::DeviceAddress,
    error::{BridgeError, Result},
    session::Session,
    transport::Transport,
};

/// A decoded call from the SDK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum BridgeRequest {
    /// Write hex-encoded `data` to the device.
    Send { uuid: String, data: String },
    /// Wait for the next reassembled response.
    Receive,
    /// Connect to the device with address `uuid`.
    Connect { uuid: String },
    /// Disconnect from the device with address `uuid`.
    Disconnect { uuid: String },
}

impl BridgeRequest {
    /// Kind of call, used for the single-flight guard and logging.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        match self {
            Self::Send { .. } => RequestKind::Send,
            Self::Receive => RequestKind::Receive,
            Self::Connect { .. } => RequestKind::Connect,
            Self::Disconnect { .. } => RequestKind::Disconnect,
        }
    }
}

/// The four call kinds the bridge serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Send,
    Receive,
    Connect,
    Disconnect,
}

impl RequestKind {
    /// Name used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Send => 0,
            Self::Receive => 1,
            Self::Connect => 2,
            Self::Disconnect => 3,
        }
    }
}

/// Error details returned to the SDK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable numeric code, see [`BridgeError::code`].
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}

/// Reply to a [`BridgeRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Whether the call succeeded.
    pub success: bool,
    /// Hex payload for `receive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Failure details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl BridgeResponse {
    /// Successful reply carrying an optional payload.
    #[must_use]
    pub fn ok(payload: Option<String>) -> Self {
        Self {
            success: true,
            payload,
            error: None,
        }
    }

    /// Failed reply describing `error`.
    #[must_use]
    pub fn failure(error: &BridgeError) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(ErrorBody {
                code: error.code(),
                message: error.to_string(),
            }),
        }
    }
}

impl From<Result<Option<String>>> for BridgeResponse {
    fn from(result: Result<Option<String>>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(error) => Self::failure(&error),
        }
    }
}

#[derive(Debug, Default)]
struct InFlight([AtomicBool; 4]);

impl InFlight {
    fn claim(&self, kind: RequestKind) -> Result<Option<InFlightGuard<'_>>> {
        if kind == RequestKind::Receive {
            return Ok(None);
        }
        let flag = &self.0[kind.index()];
        if flag.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::Busy(kind.as_str()));
        }
        Ok(Some(InFlightGuard(flag)))
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

/// Dispatches SDK calls onto a [`Session`].
pub struct Bridge<T> {
    session: Session<T>,
    in_flight: InFlight,
}

impl<T: Transport> Bridge<T> {
    /// Serve calls against `session`.
    #[must_use]
    pub fn new(session: Session<T>) -> Self {
        Self {
            session,
            in_flight: InFlight::default(),
        }
    }

    /// Borrow the underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session<T> { &self.session }

    /// Run `request` and build the reply.
    pub async fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        let kind = request.kind();
        let result = self.dispatch(request).await;
        if let Err(error) = &result {
            warn!(call = kind.as_str(), code = error.code(), %error, "bridge call failed");
        }
        result.into()
    }

    /// Decode a JSON call, run it and encode the JSON reply.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<BridgeRequest>(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                let error = BridgeError::InvalidRequest(err.to_string());
                warn!(%error, "undecodable bridge call");
                BridgeResponse::failure(&error)
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            warn!(error = %err, "failed to encode bridge reply");
            String::from(r#"{"success":false}"#)
        })
    }

    async fn dispatch(&self, request: BridgeRequest) -> Result<Option<String>> {
        let _guard = self.in_flight.claim(request.kind())?;
        debug!(call = request.kind().as_str(), "bridge call");
        match request {
            BridgeRequest::Send { uuid, data } => {
                let device: DeviceAddress = uuid.parse()?;
                let bytes = hex::decode(data.trim())?;
                match self.session.device() {
                    Some(connected) if connected == device => {}
                    Some(_) => return Err(BridgeError::UnknownDevice(device)),
                    None => return Err(BridgeError::NotConnected),
                }
                self.session.send(Bytes::from(bytes)).await?;
                Ok(None)
            }
            BridgeRequest::Receive => self.session.receive_next().await.map(Some),
            BridgeRequest::Connect { uuid } => {
                self.session.connect(uuid.parse()?).await?;
                Ok(None)
            }
            BridgeRequest::Disconnect { uuid } => {
                self.session.disconnect(&uuid.parse()?).await?;
                Ok(None)
            }
        }
    }
}
