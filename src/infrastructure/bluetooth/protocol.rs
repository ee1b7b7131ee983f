//! Vehicle link protocol.
//!
//! The single place that defines the wire representation of a control
//! frame, plus the identifiers the link is established with.

use crate::domain::models::ControlRecord;
use crate::domain::settings::LinkSettings;
use crate::infrastructure::bluetooth::error::LinkError;
use anyhow::Result;
use windows::core::GUID;

/// Advertised name prefixes accepted during discovery.
pub const DEVICE_NAME_PREFIXES: &[&str] = &["ESP32MPU"];

/// Control service UUID advertised by the vehicle firmware.
pub const SERVICE_UUID: &str = "4fafc201-1fb5-459e-8fcc-c5c9c331914b";

/// Telemetry characteristic UUID. Declared by the firmware and resolved at
/// connect time, but never written from this side.
pub const TELEMETRY_CHAR_UUID: &str = "beb5483e-36e1-4688-b7f5-ea07361b26a8";

/// Control characteristic UUID. Every control frame is written here.
pub const CONTROL_CHAR_UUID: &str = "beb5483f-36e1-4688-b7f5-ea07361b26a8";

/// Immutable link configuration, parsed once when the link worker starts.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub device_name_prefixes: Vec<String>,
    pub service_uuid: GUID,
    pub telemetry_char_uuid: GUID,
    pub control_char_uuid: GUID,
}

impl LinkOptions {
    pub fn from_settings(link: &LinkSettings) -> std::result::Result<Self, LinkError> {
        let parse = |label: &str, value: &str| {
            parse_uuid(value)
                .map_err(|e| LinkError::ResolutionFailed(format!("invalid {label} UUID: {e}")))
        };
        Ok(Self {
            device_name_prefixes: link.device_name_prefixes.clone(),
            service_uuid: parse("service", &link.service_uuid)?,
            telemetry_char_uuid: parse("telemetry characteristic", &link.telemetry_char_uuid)?,
            control_char_uuid: parse("control characteristic", &link.control_char_uuid)?,
        })
    }
}

/// Encode a control frame as the UTF-8 JSON text the firmware parses.
///
/// Deterministic: field order follows the `ControlRecord` declaration
/// (`id, x, y, z, yaw, pitch, roll`) on every call. Serialization of a
/// plain numeric struct cannot fail in practice; the `Result` is mapped to
/// `SendFailed` at the send boundary.
pub fn encode_frame(record: &ControlRecord) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(record)
}

/// True when the advertised local name matches one of the configured
/// prefixes. Unnamed advertisements never match.
pub fn matches_name_prefix(name: &str, prefixes: &[String]) -> bool {
    !name.is_empty() && prefixes.iter().any(|prefix| name.starts_with(prefix))
}

/// Parse a UUID string into a Windows GUID.
pub fn parse_uuid(uuid_str: &str) -> Result<GUID> {
    let uuid_str = uuid_str.replace('-', "");

    if uuid_str.len() != 32 {
        return Err(anyhow::anyhow!("Invalid UUID format"));
    }

    let d1 = u32::from_str_radix(&uuid_str[0..8], 16)?;
    let d2 = u16::from_str_radix(&uuid_str[8..12], 16)?;
    let d3 = u16::from_str_radix(&uuid_str[12..16], 16)?;

    let mut d4 = [0u8; 8];
    for i in 0..8 {
        d4[i] = u8::from_str_radix(&uuid_str[16 + i * 2..18 + i * 2], 16)?;
    }

    Ok(GUID {
        data1: d1,
        data2: d2,
        data3: d3,
        data4: d4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let guid = parse_uuid(SERVICE_UUID).unwrap();
        assert_eq!(guid.data1, 0x4fafc201);

        assert!(parse_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn characteristic_uuids_differ_only_in_the_marker_byte() {
        let telemetry = parse_uuid(TELEMETRY_CHAR_UUID).unwrap();
        let control = parse_uuid(CONTROL_CHAR_UUID).unwrap();
        assert_ne!(telemetry, control);
        assert_eq!(telemetry.data2, control.data2);
    }

    #[test]
    fn encode_produces_the_exact_expected_text() {
        let record = ControlRecord {
            id: 1,
            x: 0.0,
            y: 0.5,
            z: -0.5,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        };
        let bytes = encode_frame(&record).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"id":1,"x":0.0,"y":0.5,"z":-0.5,"yaw":0.0,"pitch":0.0,"roll":0.0}"#
        );
    }

    #[test]
    fn encode_is_deterministic() {
        let record = ControlRecord {
            id: 1,
            x: 0.125,
            y: -0.25,
            z: 1.0,
            yaw: -1.0,
            pitch: 0.0,
            roll: 0.0,
        };
        assert_eq!(encode_frame(&record).unwrap(), encode_frame(&record).unwrap());
    }

    #[test]
    fn neutral_record_encodes_all_axes_at_zero() {
        let bytes = encode_frame(&ControlRecord::neutral()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(r#"{"id":1,"#));
        assert!(text.ends_with(r#""roll":0.0}"#));
    }

    #[test]
    fn name_prefix_matching() {
        let prefixes = vec!["ESP32MPU".to_string(), "DRONE-".to_string()];
        assert!(matches_name_prefix("ESP32MPU", &prefixes));
        assert!(matches_name_prefix("ESP32MPU-rev2", &prefixes));
        assert!(matches_name_prefix("DRONE-07", &prefixes));
        assert!(!matches_name_prefix("ESP32", &prefixes));
        assert!(!matches_name_prefix("", &prefixes));
        assert!(!matches_name_prefix("mpu-esp32", &prefixes));
    }

    #[test]
    fn default_settings_parse_into_options() {
        let options = LinkOptions::from_settings(&LinkSettings::default()).unwrap();
        assert_eq!(options.service_uuid, parse_uuid(SERVICE_UUID).unwrap());
        assert_eq!(options.device_name_prefixes, DEVICE_NAME_PREFIXES);
    }
}
