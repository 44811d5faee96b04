//! BLE device addresses as exchanged with bridge callers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BridgeError;

/// A 6-byte Bluetooth device address (MAC).
///
/// # Examples
///
/// ```
/// use blebridge::DeviceAddress;
/// let address: DeviceAddress = "ea:21:88:12:75:86".parse().expect("valid address");
/// assert_eq!(address.to_string(), "EA:21:88:12:75:86");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceAddress([u8; 6]);

impl DeviceAddress {
    /// Create an address from raw bytes, most significant first.
    #[must_use]
    pub const fn new(bytes: [u8; 6]) -> Self { Self(bytes) }

    /// Return the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] { &self.0 }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for DeviceAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BridgeError::InvalidAddress(s.to_owned());
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in &mut bytes {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(bytes))
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::DeviceAddress;
    use crate::error::BridgeError;

    #[test]
    fn parses_and_displays_uppercase() {
        let address: DeviceAddress = "ea:21:88:12:75:86".parse().expect("valid address");
        assert_eq!(address.as_bytes(), &[0xEA, 0x21, 0x88, 0x12, 0x75, 0x86]);
        assert_eq!(address.to_string(), "EA:21:88:12:75:86");
    }

    #[rstest]
    #[case("")]
    #[case("EA:21:88:12:75")]
    #[case("EA:21:88:12:75:86:00")]
    #[case("EA:21:88:12:75:8")]
    #[case("EA-21-88-12-75-86")]
    #[case("GG:21:88:12:75:86")]
    #[case("+1:21:88:12:75:86")]
    fn rejects_malformed_addresses(#[case] raw: &str) {
        let err = raw.parse::<DeviceAddress>().expect_err("malformed address");
        assert!(matches!(err, BridgeError::InvalidAddress(ref s) if s == raw));
    }

    #[test]
    fn serde_uses_string_form() {
        let address = DeviceAddress::new([1, 2, 3, 4, 5, 6]);
        let json = serde_json::to_string(&address).expect("serialize");
        assert_eq!(json, "\"01:02:03:04:05:06\"");
        let back: DeviceAddress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, address);
    }
}
