//! Append-only device log, the export sink of the scan pipeline.
//!
//! Lines are handed to a background worker over a bounded channel so file IO
//! never blocks the radio event path. Open and write failures are logged and
//! the entries dropped; nothing here ever reaches scan state.

use crate::device::Device;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const LOG_CHANNEL_BUFFER_SIZE: usize = 64;

/// Format one log line for an admitted device.
pub fn format_log_line(timestamp: SystemTime, device: &Device) -> String {
    let seconds = timestamp
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!(
        "{}: {}, {}, {}, {}, {}, {}",
        seconds,
        device.name,
        device.address,
        device.reading.pressure,
        device.reading.temperature,
        device.reading.accelerometer,
        device.reading.battery,
    )
}

/// Background writer appending one line per discovered device.
pub struct FileExporter {
    tx: mpsc::Sender<String>,
    worker: JoinHandle<()>,
}

impl FileExporter {
    /// Spawn the writer task. An unopenable path is a logged warning, not a
    /// startup failure; the worker then drains and discards entries.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(LOG_CHANNEL_BUFFER_SIZE);
        let worker = tokio::spawn(async move {
            let mut file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not open device log, discarding entries");
                    while rx.recv().await.is_some() {}
                    return;
                }
            };
            while let Some(line) = rx.recv().await {
                if let Err(error) = writeln!(file, "{line}") {
                    warn!(%error, "device log write failed");
                }
            }
        });
        Self { tx, worker }
    }

    /// Callback handed to the scan session. Never blocks: a backlogged
    /// channel drops the entry.
    pub fn sink(&self) -> Box<dyn Fn(&Device) + Send + Sync> {
        let tx = self.tx.clone();
        Box::new(move |device: &Device| {
            let line = format_log_line(SystemTime::now(), device);
            if tx.try_send(line).is_err() {
                debug!("device log backlogged, dropping entry");
            }
        })
    }

    /// Flush remaining entries and stop the worker. Callers must drop any
    /// outstanding sink callbacks first, or the worker keeps waiting.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
