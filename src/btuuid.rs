//! `Uuid` extensions for Bluetooth UUIDs

use uuid::Uuid;

/// This is the Bluetooth Base UUID. SIG-assigned 16-bit service class UUIDs
/// ([assigned numbers](https://www.bluetooth.com/specifications/assigned-numbers/)) are offsets into it.
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Const function to create a 16-bit Bluetooth UUID
pub const fn bluetooth_uuid_from_u16(uuid: u16) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Extension trait for [uuid::Uuid] for service classes given by their 16-bit short form
pub trait BluetoothUuidExt: private::Sealed {
    /// Creates a 16-bit Bluetooth UUID
    fn from_u16(uuid: u16) -> Self;

    /// Returns the 16-bit short form if self is one of the SIG-assigned UUIDs.
    fn try_to_u16(&self) -> Option<u16>;
}

impl BluetoothUuidExt for Uuid {
    fn from_u16(uuid: u16) -> Self {
        bluetooth_uuid_from_u16(uuid)
    }

    fn try_to_u16(&self) -> Option<u16> {
        let u = self.as_u128();
        let short = (u & ((1 << 96) - 1)) == BLUETOOTH_BASE_UUID && (u >> 112) == 0;
        short.then(|| (u >> 96) as u16)
    }
}

/// Formats a service UUID for log output, using the short `0x1101` form for SIG-assigned UUIDs.
pub(crate) fn service_label(uuid: &Uuid) -> String {
    match uuid.try_to_u16() {
        Some(short) => format!("{short:#06x}"),
        None => uuid.to_string(),
    }
}

mod private {
    use uuid::Uuid;

    pub trait Sealed {}

    impl Sealed for Uuid {}
}

/// Bluetooth classic service class 16-bit UUIDs, as published in SDP records
pub mod services {
    #![allow(missing_docs)]

    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    pub const SERVICE_DISCOVERY_SERVER: Uuid = bluetooth_uuid_from_u16(0x1000);
    pub const BROWSE_GROUP_DESCRIPTOR: Uuid = bluetooth_uuid_from_u16(0x1001);
    pub const SERIAL_PORT: Uuid = bluetooth_uuid_from_u16(0x1101);
    pub const LAN_ACCESS_USING_PPP: Uuid = bluetooth_uuid_from_u16(0x1102);
    pub const DIALUP_NETWORKING: Uuid = bluetooth_uuid_from_u16(0x1103);
    pub const IRMC_SYNC: Uuid = bluetooth_uuid_from_u16(0x1104);
    pub const OBEX_OBJECT_PUSH: Uuid = bluetooth_uuid_from_u16(0x1105);
    pub const OBEX_FILE_TRANSFER: Uuid = bluetooth_uuid_from_u16(0x1106);
    pub const HEADSET: Uuid = bluetooth_uuid_from_u16(0x1108);
    pub const AUDIO_SOURCE: Uuid = bluetooth_uuid_from_u16(0x110a);
    pub const AUDIO_SINK: Uuid = bluetooth_uuid_from_u16(0x110b);
    pub const AV_REMOTE_CONTROL_TARGET: Uuid = bluetooth_uuid_from_u16(0x110c);
    pub const AV_REMOTE_CONTROL: Uuid = bluetooth_uuid_from_u16(0x110e);
    pub const HANDSFREE: Uuid = bluetooth_uuid_from_u16(0x111e);
    pub const HANDSFREE_AUDIO_GATEWAY: Uuid = bluetooth_uuid_from_u16(0x111f);
    pub const PHONEBOOK_ACCESS_PSE: Uuid = bluetooth_uuid_from_u16(0x112f);
    pub const MESSAGE_ACCESS_SERVER: Uuid = bluetooth_uuid_from_u16(0x1132);
    pub const PNP_INFORMATION: Uuid = bluetooth_uuid_from_u16(0x1200);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_port_uuid_is_the_well_known_value() {
        let expected = Uuid::parse_str("00001101-0000-1000-8000-00805F9B34FB").unwrap();
        assert_eq!(services::SERIAL_PORT, expected);
        assert_eq!(Uuid::from_u16(0x1101), expected);
        assert_eq!(services::SERIAL_PORT.try_to_u16(), Some(0x1101));
    }

    #[test]
    fn only_base_uuid_offsets_are_short() {
        let custom = Uuid::from_u128(0xFEED0000F00D);
        assert_eq!(custom.try_to_u16(), None);
        assert_eq!(service_label(&custom), custom.to_string());
        assert_eq!(service_label(&services::SERIAL_PORT), "0x1101");

        let wide = Uuid::from_u128((0x0001_1101u128 << 96) | BLUETOOTH_BASE_UUID);
        assert_eq!(wide.try_to_u16(), None);
    }
}
