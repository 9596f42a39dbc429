//! Decoding of manufacturer-specific advertisement payloads.
//!
//! TPMS beacons pack their sensor fields as pipe-delimited ASCII text inside
//! the manufacturer-specific data of a BLE advertisement. Hardware revisions
//! differ in two ways: where each field sits in the delimited record, and
//! whether the payload carries the text directly or behind an extra
//! hex-of-ASCII indirection. Both are configuration ([`SensorFormat`]), never
//! sniffed from the data.

use crate::reading::SensorReading;
use std::collections::HashMap;
use std::fmt;

/// Field separator used by all observed wire-format revisions.
pub const FIELD_DELIMITER: char = '|';

/// Manufacturer ID used by the supported TPMS beacons.
pub const DEFAULT_MANUFACTURER_ID: u16 = 0x7C50;

/// How the payload bytes carry the delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PayloadEncoding {
    /// Payload bytes, read as ASCII, are the delimited text.
    #[default]
    #[value(name = "ascii")]
    DirectAscii,
    /// Payload bytes render to uppercase hex digits; the hex string's byte
    /// pairs decode to the ASCII characters of the delimited text.
    #[value(name = "hex-ascii")]
    HexOfAscii,
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadEncoding::DirectAscii => write!(f, "ascii"),
            PayloadEncoding::HexOfAscii => write!(f, "hex-ascii"),
        }
    }
}

/// Field-index-to-meaning mapping for one wire-format revision.
///
/// Index variance between revisions is data, not behavior: every observed
/// revision is representable as a `FieldMap`, including ones not listed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub pressure: usize,
    pub temperature: usize,
    pub accelerometer: Option<usize>,
    pub battery: Option<usize>,
}

impl FieldMap {
    /// Two-field revision: pressure at index 0, temperature at index 2.
    pub fn legacy() -> Self {
        Self {
            pressure: 0,
            temperature: 2,
            accelerometer: None,
            battery: None,
        }
    }

    /// Two-field revision with the record shifted by one: pressure at 1,
    /// temperature at 3.
    pub fn shifted() -> Self {
        Self {
            pressure: 1,
            temperature: 3,
            accelerometer: None,
            battery: None,
        }
    }

    /// Six-field revision adding accelerometer (4) and battery percentage (5).
    pub fn extended() -> Self {
        Self {
            pressure: 0,
            temperature: 2,
            accelerometer: Some(4),
            battery: Some(5),
        }
    }
}

/// Named wire-format revisions selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FormatPreset {
    /// Pressure at index 0, temperature at index 2
    Legacy,
    /// Pressure at index 1, temperature at index 3
    Shifted,
    /// Pressure 0, temperature 2, accelerometer 4, battery 5
    #[default]
    Extended,
}

impl FormatPreset {
    pub fn field_map(self) -> FieldMap {
        match self {
            FormatPreset::Legacy => FieldMap::legacy(),
            FormatPreset::Shifted => FieldMap::shifted(),
            FormatPreset::Extended => FieldMap::extended(),
        }
    }
}

impl fmt::Display for FormatPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatPreset::Legacy => write!(f, "legacy"),
            FormatPreset::Shifted => write!(f, "shifted"),
            FormatPreset::Extended => write!(f, "extended"),
        }
    }
}

/// Complete wire-format configuration for one sensor revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorFormat {
    /// Manufacturer ID whose data record carries the sensor fields
    pub manufacturer_id: u16,
    pub encoding: PayloadEncoding,
    pub fields: FieldMap,
}

impl SensorFormat {
    pub fn new(manufacturer_id: u16, encoding: PayloadEncoding, fields: FieldMap) -> Self {
        Self {
            manufacturer_id,
            encoding,
            fields,
        }
    }
}

/// Decode the manufacturer data of one advertisement into a sensor reading.
///
/// Returns `None` when the target manufacturer ID is absent — most
/// advertisements are irrelevant, so this is not an error. Malformed payloads
/// never fail past this boundary: an out-of-range field index, non-ASCII
/// bytes, or a broken hex layer leave the affected fields empty, and a
/// reading with all fields empty is valid ("no usable sensor data").
pub fn decode(
    manufacturer_data: &HashMap<u16, Vec<u8>>,
    format: &SensorFormat,
) -> Option<SensorReading> {
    let payload = manufacturer_data.get(&format.manufacturer_id)?;

    let text = match format.encoding {
        PayloadEncoding::DirectAscii => ascii_text(payload),
        PayloadEncoding::HexOfAscii => {
            hex_of_ascii_decode(&payload_hex(payload)).unwrap_or_default()
        }
    };

    let fields: Vec<&str> = text.split(FIELD_DELIMITER).collect();
    let field_at = |index: usize| fields.get(index).copied().unwrap_or_default().to_string();

    Some(SensorReading {
        pressure: field_at(format.fields.pressure),
        temperature: field_at(format.fields.temperature),
        accelerometer: format.fields.accelerometer.map(&field_at).unwrap_or_default(),
        battery: format.fields.battery.map(&field_at).unwrap_or_default(),
    })
}

/// Interpret the payload as ASCII text, or empty when it is not ASCII.
fn ascii_text(payload: &[u8]) -> String {
    if payload.is_ascii() {
        payload.iter().map(|&b| b as char).collect()
    } else {
        String::new()
    }
}

/// Render the payload as concatenated uppercase hex digit pairs.
fn payload_hex(payload: &[u8]) -> String {
    payload.iter().map(|b| format!("{b:02X}")).collect()
}

/// Encode delimited text into its hex-of-ASCII representation.
///
/// # Example
/// ```
/// use tpms_listener::decoder::hex_of_ascii_encode;
///
/// assert_eq!(hex_of_ascii_encode("30|95"), "33307C3935");
/// ```
pub fn hex_of_ascii_encode(text: &str) -> String {
    text.bytes().map(|b| format!("{b:02X}")).collect()
}

/// Decode a hex-of-ASCII string back into text.
///
/// Returns `None` when the string is not well-formed hex byte pairs or a
/// pair decodes outside ASCII.
pub fn hex_of_ascii_decode(hex: &str) -> Option<String> {
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut text = String::with_capacity(hex.len() / 2);
    for pair in hex.as_bytes().chunks_exact(2) {
        let pair = std::str::from_utf8(pair).ok()?;
        let value = u8::from_str_radix(pair, 16).ok()?;
        if !value.is_ascii() {
            return None;
        }
        text.push(value as char);
    }
    Some(text)
}
