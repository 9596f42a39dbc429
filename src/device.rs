//! Discovered TPMS device.

use crate::reading::SensorReading;
use std::fmt;

/// A device discovered during a scan pass.
///
/// Equality is full-value: two devices with the same name and address but a
/// different reading are distinct registry entries. A changed sensor value is
/// therefore a new discovery, never an in-place update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Advertised device name
    pub name: String,
    /// Hardware address as reported by the radio stack
    pub address: String,
    /// Sensor fields decoded from the advertisement
    pub reading: SensorReading,
}

impl Device {
    pub fn new(name: String, address: String, reading: SensorReading) -> Self {
        Self {
            name,
            address,
            reading,
        }
    }

    /// Whether the device carries a usable identity. Advertisements with a
    /// blank name or address are discarded before they reach the registry.
    pub fn has_identity(&self) -> bool {
        !self.name.trim().is_empty() && !self.address.trim().is_empty()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} pressure={} temperature={} accelerometer={} battery={}",
            self.address,
            self.name,
            self.reading.pressure,
            self.reading.temperature,
            self.reading.accelerometer,
            self.reading.battery
        )
    }
}
