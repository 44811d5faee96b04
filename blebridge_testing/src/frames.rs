//! Builders for wallet-side notification traffic.

use blebridge::fragment::{Fragmenter, PAYLOAD_OFFSET, encode_frame};

/// Frame `body` as the wallet would and split it into notifications of at
/// most `mtu` bytes.
///
/// # Panics
///
/// Panics if `mtu` cannot hold a header or the body overflows the length
/// field.
#[must_use]
pub fn wallet_fragments(message_type: u16, body: &[u8], mtu: usize) -> Vec<Vec<u8>> {
    Fragmenter::new(mtu)
        .and_then(|fragmenter| fragmenter.fragment(message_type, body))
        .unwrap_or_else(|err| panic!("cannot fragment test body: {err}"))
}

/// Hex string a session reports for a response carrying `body`.
///
/// # Panics
///
/// Panics if the body overflows the length field.
#[must_use]
pub fn expected_hex(message_type: u16, body: &[u8]) -> String {
    let frame = encode_frame(message_type, body)
        .unwrap_or_else(|err| panic!("cannot frame test body: {err}"));
    hex::encode(&frame[PAYLOAD_OFFSET..])
}
