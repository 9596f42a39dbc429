//! Session-scoped registry of discovered devices.

use crate::device::Device;

/// Insertion-ordered, deduplicating store of discovered devices.
///
/// The registry is a per-session result set, not a cache: it grows without
/// bound within one scan pass and is cleared at the start of the next.
/// Deduplication uses full-value equality, so a repeated advertisement is a
/// no-op while a changed sensor value appends a new entry. The registry is
/// not internally synchronized; the scan session serializes all access on a
/// single task.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all entries. Returns the number of removed entries so the
    /// caller can fire its range-removed notification.
    pub fn reset(&mut self) -> usize {
        let removed = self.devices.len();
        self.devices.clear();
        removed
    }

    /// Append the device unless an equal one is already present or it lacks
    /// an identity. Returns the insertion index on success.
    pub fn admit(&mut self, device: Device) -> Option<usize> {
        if !device.has_identity() {
            return None;
        }
        if self.devices.contains(&device) {
            return None;
        }
        self.devices.push(device);
        Some(self.devices.len() - 1)
    }

    /// Read-only view of the entries in discovery order.
    pub fn snapshot(&self) -> Vec<Device> {
        self.devices.clone()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
