//! `tpms-listener` library.
//!
//! Discovers TPMS beacons over BLE, decodes their manufacturer-specific
//! advertisement payloads into sensor readings, and keeps a deduplicated,
//! insertion-ordered registry of the devices found in each scan pass.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing and process
//! exit codes. The core logic lives in [`crate::app`] and below, where it
//! can be tested deterministically with an injected radio and output stream.

pub mod app;
pub mod decoder;
pub mod device;
pub mod duration;
pub mod export;
pub mod permission;
pub mod radio;
pub mod reading;
pub mod registry;
pub mod scheduler;
pub mod session;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the crate root
pub use decoder::{
    FieldMap, FormatPreset, PayloadEncoding, SensorFormat, decode, hex_of_ascii_decode,
    hex_of_ascii_encode,
};
pub use device::Device;
pub use duration::parse_duration;
pub use export::{FileExporter, format_log_line};
pub use permission::{AlwaysGranted, PermissionGate};
pub use radio::{Radio, RawAdvertisement, ScanError};
pub use reading::SensorReading;
pub use registry::DeviceRegistry;
pub use scheduler::ScanScheduler;
pub use session::{ScanOutcome, ScanSession, ScanState};
