//! Utilities for exercising `blebridge` sessions in tests.
//!
//! [`MockTransport`] stands in for the BLE stack: tests push notification
//! fragments through it, inject stream errors, and inspect what the session
//! wrote. An optional responder turns it into a simulated wallet that
//! answers every write.
//!
//! ```rust
//! use blebridge::{Session, SessionConfig};
//! use blebridge_testing::{MockTransport, wallet_fragments};
//!
//! # async fn example() {
//! let transport = MockTransport::new()
//!     .with_responder(|_request| wallet_fragments(0x0011, b"pong", 64));
//! let session = Session::new(transport.clone(), SessionConfig::default());
//! # }
//! ```

pub mod frames;
pub mod logging;
pub mod macros;
pub mod transport;

pub use frames::{expected_hex, wallet_fragments};
pub use logging::{LoggerHandle, logger};
pub use transport::{MockTransport, Responder};
