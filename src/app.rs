//! Core application runner for `tpms-listener`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit
//! codes so it can be tested deterministically with an injected radio,
//! permission gate, and output stream.

use crate::decoder::{FormatPreset, PayloadEncoding, SensorFormat};
use crate::device::Device;
use crate::duration::parse_duration;
use crate::export::FileExporter;
use crate::permission::PermissionGate;
use crate::radio::{Radio, ScanError};
use crate::scheduler::ScanScheduler;
use crate::session::{ScanOutcome, ScanSession};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Manufacturer ID carrying the sensor record, as four hex digits.
    #[arg(long, default_value = "7C50", value_parser = parse_manufacturer_id)]
    pub manufacturer_id: u16,

    /// Wire-format revision (field index layout).
    #[arg(long, default_value_t, value_enum)]
    pub format: FormatPreset,

    /// Payload encoding used by the sensor revision.
    #[arg(long, default_value_t, value_enum)]
    pub encoding: PayloadEncoding,

    /// Only admit advertisements from this address.
    /// Format: --address 48:23:35:03:4F:3C
    #[arg(long)]
    pub address: Option<String>,

    /// Length of one scan pass.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub scan_duration: Duration,

    /// Delay between scan passes, measured from completion of the previous
    /// one.
    #[arg(long, default_value = "50s", value_parser = parse_duration)]
    pub scan_interval: Duration,

    /// Append one line per admitted device to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run a single scan pass and exit.
    #[arg(long)]
    pub once: bool,

    /// Verbose logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    /// The wire-format configuration selected by these options.
    pub fn sensor_format(&self) -> SensorFormat {
        SensorFormat::new(self.manufacturer_id, self.encoding, self.format.field_map())
    }
}

/// Parse a manufacturer ID given as hex digits, with or without `0x`.
fn parse_manufacturer_id(src: &str) -> Result<u16, String> {
    let digits = src
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|_| format!("invalid manufacturer id: {src}"))
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Run the scan pipeline, writing one line per discovered device to `out`.
///
/// With `--once` a single pass runs to completion; otherwise the scheduler
/// repeats passes until `shutdown` fires. Only a failed `--once` pass is an
/// error; the recurring schedule treats every pass outcome as non-fatal.
pub async fn run_with_io(
    options: Options,
    radio: &dyn Radio,
    gate: &dyn PermissionGate,
    shutdown: CancellationToken,
    out: Arc<Mutex<dyn Write + Send>>,
) -> Result<(), RunError> {
    let mut session = ScanSession::new(options.sensor_format());

    let exporter = options.log_file.clone().map(FileExporter::spawn);
    let file_sink = exporter.as_ref().map(|exporter| exporter.sink());

    session.set_export_sink(move |device: &Device| {
        let mut out = out.lock().expect("output lock poisoned");
        let _ = writeln!(out, "{device}");
        if let Some(sink) = &file_sink {
            sink(device);
        }
    });

    let session = Arc::new(session);

    let result = if options.once {
        match session
            .run(
                radio,
                gate,
                options.scan_duration,
                options.address.as_deref(),
                &shutdown,
            )
            .await
        {
            Ok(ScanOutcome::Completed { admitted }) => {
                info!(admitted, "scan pass finished");
                Ok(())
            }
            Ok(ScanOutcome::PermissionDenied) => {
                warn!("permission not granted, no scan performed");
                Ok(())
            }
            Err(error) => Err(RunError::Scan(error)),
        }
    } else {
        let scheduler = ScanScheduler::new(
            Arc::clone(&session),
            options.scan_interval,
            options.scan_duration,
            options.address.clone(),
        );
        scheduler.run(radio, gate, shutdown).await;
        Ok(())
    };

    // The session owns the export sink; drop it before closing the exporter
    // so the worker sees the channel close and flushes.
    drop(session);
    if let Some(exporter) = exporter {
        exporter.close().await;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::AlwaysGranted;
    use crate::test_utils::{DeniedGate, FakeRadio, advertisement};

    fn options() -> Options {
        Options {
            manufacturer_id: 0x7C50,
            format: FormatPreset::Legacy,
            encoding: PayloadEncoding::DirectAscii,
            address: None,
            scan_duration: Duration::from_secs(5),
            scan_interval: Duration::from_secs(50),
            log_file: None,
            once: true,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn run_once_writes_discovered_devices_to_out() {
        let radio = FakeRadio::new(vec![
            advertisement("AA:AA:AA:AA:AA:AA", Some("SensorA"), None),
            advertisement("BB:BB:BB:BB:BB:BB", Some("SensorB"), Some(b"10|x|20|y")),
            advertisement("BB:BB:BB:BB:BB:BB", Some("SensorB"), Some(b"10|x|20|y")),
        ]);

        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        run_with_io(
            options(),
            &radio,
            &AlwaysGranted,
            CancellationToken::new(),
            out.clone(),
        )
        .await
        .unwrap();

        let out = String::from_utf8(out.lock().unwrap().clone()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("BB:BB:BB:BB:BB:BB SensorB"));
        assert!(out.contains("pressure=10"));
        assert!(out.contains("temperature=20"));
        assert!(!out.contains("AA:AA:AA:AA:AA:AA"));
    }

    #[tokio::test]
    async fn run_once_with_denied_permission_writes_nothing() {
        let radio = FakeRadio::new(vec![advertisement(
            "BB:BB:BB:BB:BB:BB",
            Some("SensorB"),
            Some(b"10|x|20|y"),
        )]);

        let out = Arc::new(Mutex::new(Vec::<u8>::new()));
        run_with_io(
            options(),
            &radio,
            &DeniedGate,
            CancellationToken::new(),
            out.clone(),
        )
        .await
        .unwrap();

        assert!(out.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_manufacturer_id() {
        assert_eq!(parse_manufacturer_id("7C50"), Ok(0x7C50));
        assert_eq!(parse_manufacturer_id("0x7c50"), Ok(0x7C50));
        assert_eq!(parse_manufacturer_id("0499"), Ok(0x0499));
        assert!(parse_manufacturer_id("xyz").is_err());
        assert!(parse_manufacturer_id("12345").is_err());
    }

    #[test]
    fn test_sensor_format_from_options() {
        let format = options().sensor_format();
        assert_eq!(format.manufacturer_id, 0x7C50);
        assert_eq!(format.encoding, PayloadEncoding::DirectAscii);
        assert_eq!(format.fields.pressure, 0);
        assert_eq!(format.fields.temperature, 2);
    }
}
