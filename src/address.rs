use std::str::FromStr;

use crate::error::ErrorKind;
use crate::Error;

/// The address of the remote end of a serial session.
///
/// The address is an opaque, platform-specific string. On every platform with a classic Bluetooth stack it is the
/// colon-separated hardware address (e.g. `20:17:01:04:22:27`); the helpers on this type understand that form, but
/// [`PeerAddress::new`] accepts any string so that transports with other addressing schemes can be used.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct PeerAddress(String);

impl PeerAddress {
    /// Creates an address from a platform-specific string without validating it.
    pub fn new(addr: impl Into<String>) -> Self {
        PeerAddress(addr.into())
    }

    /// The address as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the address as a 48-bit hardware address in `XX:XX:XX:XX:XX:XX` form, most significant octet first.
    pub fn to_bytes(&self) -> Option<[u8; 6]> {
        let mut bytes = [0u8; 6];
        let mut parts = self.0.split(':');
        for byte in &mut bytes {
            let part = parts.next()?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            *byte = u8::from_str_radix(part, 16).ok()?;
        }
        parts.next().is_none().then_some(bytes)
    }

    /// Returns `true` for the all-zero placeholder address `00:00:00:00:00:00`.
    pub fn is_unset(&self) -> bool {
        self.to_bytes() == Some([0; 6])
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(bytes: [u8; 6]) -> Self {
        let [a, b, c, d, e, g] = bytes;
        PeerAddress(format!("{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}"))
    }
}

impl FromStr for PeerAddress {
    type Err = Error;

    /// Parses and normalizes a hardware address. Use [`PeerAddress::new`] for other address formats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PeerAddress::new(s)
            .to_bytes()
            .map(PeerAddress::from)
            .ok_or_else(|| Error::new(ErrorKind::InvalidParameter, None, format!("invalid Bluetooth address {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hardware_addresses() {
        let addr: PeerAddress = "20:17:01:04:22:27".parse().unwrap();
        assert_eq!(addr.to_bytes(), Some([0x20, 0x17, 0x01, 0x04, 0x22, 0x27]));
        assert!(!addr.is_unset());

        let addr: PeerAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for input in ["", "AA:BB:CC:DD:EE", "AA:BB:CC:DD:EE:FF:00", "AABBCCDDEEFF", "A:BB:CC:DD:EE:FFF", "GG:BB:CC:DD:EE:FF"] {
            let err = input.parse::<PeerAddress>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter, "{input:?}");
        }
    }

    #[test]
    fn detects_placeholder_address() {
        assert!(PeerAddress::new("00:00:00:00:00:00").is_unset());
        assert!(!PeerAddress::new("not-a-mac").is_unset());
        assert_eq!(PeerAddress::new("not-a-mac").to_bytes(), None);
    }
}
