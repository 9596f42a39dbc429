//! Radio capability seam.
//!
//! The scan pipeline consumes the radio as a capability: `start_scan` yields
//! a stream of raw advertisement events, `stop_scan` ends it. The trait keeps
//! the pipeline testable without Bluetooth hardware; the real BlueZ backend
//! lives in [`bluer`].

#[cfg(feature = "bluer")]
pub mod bluer;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel buffer size for advertisement events.
pub const EVENT_CHANNEL_BUFFER_SIZE: usize = 100;

/// One advertisement as reported by the radio stack.
///
/// Transient: dropped after decoding. Manufacturer data is keyed by
/// manufacturer ID exactly as advertised, without reinterpretation.
#[derive(Debug, Clone, Default)]
pub struct RawAdvertisement {
    /// Hardware address of the advertising device
    pub address: String,
    /// Advertised device name, if any
    pub name: Option<String>,
    /// Manufacturer-specific data records
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

/// Error type for scan operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A scan pass is already running. Overlapping radio scan requests are
    /// rejected rather than restarted.
    #[error("a scan is already in progress")]
    AlreadyScanning,
    /// No usable adapter, or the radio stack is disabled.
    #[error("radio unavailable: {0}")]
    RadioUnavailable(String),
    /// The radio stack reported an error.
    #[error("bluetooth error: {0}")]
    Bluetooth(String),
}

/// Radio capability consumed by the scan session.
pub trait Radio: Send + Sync {
    /// Begin emitting advertisement events. The stream ends when the radio
    /// stops on its own or `stop_scan` is called.
    fn start_scan(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<RawAdvertisement>, ScanError>> + Send + '_>,
    >;

    /// Stop an in-flight scan. A no-op when nothing is scanning.
    fn stop_scan(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
