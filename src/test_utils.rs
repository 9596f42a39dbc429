//! Shared fixtures for unit tests.

use crate::device::Device;
use crate::permission::PermissionGate;
use crate::radio::{Radio, RawAdvertisement, ScanError};
use crate::reading::SensorReading;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Manufacturer ID used by test payloads.
pub const TEST_MANUFACTURER_ID: u16 = 0x7C50;

/// Build a raw advertisement carrying the test manufacturer ID when a
/// payload is given.
pub fn advertisement(
    address: &str,
    name: Option<&str>,
    payload: Option<&[u8]>,
) -> RawAdvertisement {
    let mut manufacturer_data = HashMap::new();
    if let Some(payload) = payload {
        manufacturer_data.insert(TEST_MANUFACTURER_ID, payload.to_vec());
    }
    RawAdvertisement {
        address: address.to_string(),
        name: name.map(str::to_string),
        manufacturer_data,
    }
}

/// Build a device with pressure and temperature set.
pub fn device(name: &str, address: &str, pressure: &str, temperature: &str) -> Device {
    Device::new(
        name.to_string(),
        address.to_string(),
        SensorReading {
            pressure: pressure.to_string(),
            temperature: temperature.to_string(),
            ..SensorReading::default()
        },
    )
}

/// Radio that replays a fixed list of advertisements, then ends the stream.
pub struct FakeRadio {
    events: Mutex<Vec<RawAdvertisement>>,
}

impl FakeRadio {
    pub fn new(events: Vec<RawAdvertisement>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }
}

impl Radio for FakeRadio {
    fn start_scan(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<RawAdvertisement>, ScanError>> + Send + '_>,
    > {
        let events = self.events.lock().unwrap().clone();
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(events.len().max(1));
            tokio::spawn(async move {
                for event in events {
                    let _ = tx.send(event).await;
                }
                // tx drops here, closing the stream
            });
            Ok(rx)
        })
    }

    fn stop_scan(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Radio whose stream stays open until `stop_scan`, for re-entrancy tests.
pub struct HangingRadio {
    tx: Mutex<Option<mpsc::Sender<RawAdvertisement>>>,
}

impl HangingRadio {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }
}

impl Radio for HangingRadio {
    fn start_scan(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<RawAdvertisement>, ScanError>> + Send + '_>,
    > {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(1);
            *self.tx.lock().unwrap() = Some(tx);
            Ok(rx)
        })
    }

    fn stop_scan(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.tx.lock().unwrap().take();
        })
    }
}

/// Radio that always fails to start.
pub struct UnavailableRadio;

impl Radio for UnavailableRadio {
    fn start_scan(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<RawAdvertisement>, ScanError>> + Send + '_>,
    > {
        Box::pin(async { Err(ScanError::RadioUnavailable("no adapter".to_string())) })
    }

    fn stop_scan(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// Permission gate that always denies.
pub struct DeniedGate;

impl PermissionGate for DeniedGate {
    fn is_granted(&self) -> bool {
        false
    }

    fn request(&self) -> bool {
        false
    }
}
