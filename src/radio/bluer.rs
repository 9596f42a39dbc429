//! BlueZ D-Bus radio backend.
//!
//! Talks to the `bluetoothd` daemon through the `bluer` crate. Registers a
//! passive advertisement monitor filtered on the configured manufacturer ID
//! and forwards matching advertisements over a bounded channel.

use super::{EVENT_CHANNEL_BUFFER_SIZE, Radio, RawAdvertisement, ScanError};
use bluer::monitor::{Monitor, MonitorEvent, Pattern};
use bluer::{Adapter, Address, Session};
use futures::StreamExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bluetooth manufacturer-specific data type (AD type 0xFF)
const MANUFACTURER_DATA_TYPE: u8 = 0xff;

impl From<bluer::Error> for ScanError {
    fn from(err: bluer::Error) -> Self {
        ScanError::Bluetooth(err.to_string())
    }
}

/// Radio capability backed by BlueZ.
pub struct BluerRadio {
    manufacturer_id: u16,
    active: Mutex<Option<CancellationToken>>,
}

impl BluerRadio {
    pub fn new(manufacturer_id: u16) -> Self {
        Self {
            manufacturer_id,
            active: Mutex::new(None),
        }
    }

    /// Little-endian bytes of the manufacturer ID, as they appear on the wire.
    fn manufacturer_id_pattern(&self) -> Vec<u8> {
        self.manufacturer_id.to_le_bytes().to_vec()
    }
}

impl Radio for BluerRadio {
    fn start_scan(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<RawAdvertisement>, ScanError>> + Send + '_>,
    > {
        Box::pin(async move {
            let session = Session::new()
                .await
                .map_err(|e| ScanError::RadioUnavailable(e.to_string()))?;
            let adapter = session
                .default_adapter()
                .await
                .map_err(|e| ScanError::RadioUnavailable(e.to_string()))?;
            adapter.set_powered(true).await?;

            let pattern = Pattern {
                data_type: MANUFACTURER_DATA_TYPE,
                start_position: 0,
                content: self.manufacturer_id_pattern(),
            };
            let monitor_manager = adapter.monitor().await?;
            let mut monitor_handle = monitor_manager
                .register(Monitor {
                    patterns: Some(vec![pattern]),
                    ..Default::default()
                })
                .await?;

            let stop = CancellationToken::new();
            *self.active.lock().expect("radio state lock poisoned") = Some(stop.clone());

            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);

            // The spawned task owns all Bluetooth state; dropping it tears
            // the monitor down.
            tokio::spawn(async move {
                let _session = session;
                let _monitor_manager = monitor_manager;

                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        event = monitor_handle.next() => match event {
                            Some(MonitorEvent::DeviceFound(device_id)) => {
                                match advertisement_for(&adapter, device_id.device).await {
                                    Ok(Some(advertisement)) => {
                                        if tx.send(advertisement).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(None) => {}
                                    Err(error) => {
                                        debug!(%error, "failed to read advertisement");
                                    }
                                }
                            }
                            Some(_) => {}
                            None => break,
                        }
                    }
                }
            });

            Ok(rx)
        })
    }

    fn stop_scan(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if let Some(stop) = self.active.lock().expect("radio state lock poisoned").take() {
                stop.cancel();
            }
        })
    }
}

/// Read one discovered device's advertisement fields from BlueZ.
async fn advertisement_for(
    adapter: &Adapter,
    address: Address,
) -> Result<Option<RawAdvertisement>, ScanError> {
    let device = adapter.device(address)?;

    let manufacturer_data = match device.manufacturer_data().await? {
        Some(data) => data,
        None => return Ok(None),
    };
    let name = device.name().await?;

    Ok(Some(RawAdvertisement {
        address: address.to_string(),
        name,
        manufacturer_data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_id_pattern_is_little_endian() {
        let radio = BluerRadio::new(0x7C50);
        assert_eq!(radio.manufacturer_id_pattern(), vec![0x50, 0x7C]);
    }
}
