//! Decoded sensor reading for one TPMS beacon.

/// Sensor fields decoded from one manufacturer-data record.
///
/// The wire format carries the fields as ASCII text, not binary-encoded
/// numbers, so they are kept as text here. A field that the active wire
/// format does not carry (or that failed to decode) stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SensorReading {
    /// Tire pressure as reported by the sensor
    pub pressure: String,
    /// Temperature as reported by the sensor
    pub temperature: String,
    /// Accelerometer value (richer hardware revisions only)
    pub accelerometer: String,
    /// Battery percentage (richer hardware revisions only)
    pub battery: String,
}

impl SensorReading {
    /// Whether the reading carries no usable sensor data at all.
    pub fn is_empty(&self) -> bool {
        self.pressure.is_empty()
            && self.temperature.is_empty()
            && self.accelerometer.is_empty()
            && self.battery.is_empty()
    }
}
