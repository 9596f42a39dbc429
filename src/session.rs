//! One radio scan pass: the scan lifecycle state machine.
//!
//! A [`ScanSession`] wraps a single time-bounded scan: it fires the
//! before-scan hooks, resets the registry, consumes raw advertisement events
//! from the radio, decodes and admits them, and fires the after-scan hooks on
//! the way back to idle. All registry mutations and hook invocations run on
//! the session's own task, so an `admit` can never interleave with a `reset`;
//! observers that touch UI state are expected to bridge into their own
//! serialized context from inside the hook body.

use crate::decoder::{self, SensorFormat};
use crate::device::Device;
use crate::permission::PermissionGate;
use crate::radio::{Radio, RawAdvertisement, ScanError};
use crate::registry::DeviceRegistry;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Scan lifecycle state, owned exclusively by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// Non-error result of one scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The pass ran to completion and admitted this many devices.
    Completed { admitted: usize },
    /// Permission was not granted; no scan was performed.
    PermissionDenied,
}

type Hook = Box<dyn Fn() + Send + Sync>;
type InsertedHook = Box<dyn Fn(usize) + Send + Sync>;
type RemovedHook = Box<dyn Fn(usize, usize) + Send + Sync>;
type DeviceSink = Box<dyn Fn(&Device) + Send + Sync>;

/// Resets the state to `Idle` when the pass ends, on every exit path.
struct ScanningGuard<'a>(&'a Mutex<ScanState>);

impl Drop for ScanningGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().expect("scan state lock poisoned") = ScanState::Idle;
    }
}

pub struct ScanSession {
    format: SensorFormat,
    state: Mutex<ScanState>,
    registry: Mutex<DeviceRegistry>,
    before_scan: Vec<Hook>,
    after_scan: Vec<Hook>,
    on_device_admitted: Option<InsertedHook>,
    on_registry_cleared: Option<RemovedHook>,
    export_sink: Option<DeviceSink>,
}

impl ScanSession {
    pub fn new(format: SensorFormat) -> Self {
        Self {
            format,
            state: Mutex::new(ScanState::Idle),
            registry: Mutex::new(DeviceRegistry::new()),
            before_scan: Vec::new(),
            after_scan: Vec::new(),
            on_device_admitted: None,
            on_registry_cleared: None,
            export_sink: None,
        }
    }

    /// Register a hook invoked synchronously before each scan pass, in
    /// registration order.
    pub fn add_before_scan(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.before_scan.push(Box::new(hook));
    }

    /// Register a hook invoked synchronously after each scan pass, in
    /// registration order.
    pub fn add_after_scan(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.after_scan.push(Box::new(hook));
    }

    /// Notification fired once per admitted device with its registry index.
    /// Append-at-end semantics only: no reordering, no update-in-place.
    pub fn set_on_device_admitted(&mut self, hook: impl Fn(usize) + Send + Sync + 'static) {
        self.on_device_admitted = Some(Box::new(hook));
    }

    /// Notification fired once per registry reset with the removed range
    /// `(start, count)`.
    pub fn set_on_registry_cleared(&mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) {
        self.on_registry_cleared = Some(Box::new(hook));
    }

    /// Sink invoked once per admitted device, intended for append-only
    /// persistence. Sink failures must never reach scan state, so the sink
    /// body is expected to swallow its own errors.
    pub fn set_export_sink(&mut self, sink: impl Fn(&Device) + Send + Sync + 'static) {
        self.export_sink = Some(Box::new(sink));
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().expect("scan state lock poisoned")
    }

    /// Registry contents in discovery order.
    pub fn snapshot(&self) -> Vec<Device> {
        self.registry.lock().expect("registry lock poisoned").snapshot()
    }

    /// Run one scan pass, bounded by `duration`.
    ///
    /// Re-entrant calls while a pass is running return
    /// [`ScanError::AlreadyScanning`] and leave registry and state untouched.
    /// A denied permission gate yields [`ScanOutcome::PermissionDenied`]
    /// without firing any hook. The after-scan hooks fire on every path on
    /// which the before-scan hooks fired, including radio failures, so
    /// observers can always re-enable their controls.
    pub async fn run(
        &self,
        radio: &dyn Radio,
        gate: &dyn PermissionGate,
        duration: Duration,
        address_filter: Option<&str>,
        shutdown: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        if !gate.is_granted() && !gate.request() {
            debug!("scan permission not granted, no scan performed");
            return Ok(ScanOutcome::PermissionDenied);
        }

        {
            let mut state = self.state.lock().expect("scan state lock poisoned");
            if *state == ScanState::Scanning {
                return Err(ScanError::AlreadyScanning);
            }
            *state = ScanState::Scanning;
        }
        let _scanning = ScanningGuard(&self.state);

        for hook in &self.before_scan {
            hook();
        }

        let removed = self.registry.lock().expect("registry lock poisoned").reset();
        if let Some(notify) = &self.on_registry_cleared {
            notify(0, removed);
        }

        let result = self.scan_pass(radio, duration, address_filter, shutdown).await;

        for hook in &self.after_scan {
            hook();
        }

        result.map(|admitted| ScanOutcome::Completed { admitted })
    }

    async fn scan_pass(
        &self,
        radio: &dyn Radio,
        duration: Duration,
        address_filter: Option<&str>,
        shutdown: &CancellationToken,
    ) -> Result<usize, ScanError> {
        let mut events = radio.start_scan().await?;
        let deadline = tokio::time::Instant::now() + duration;
        let mut admitted = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("scan pass cancelled");
                    break;
                }
                _ = tokio::time::sleep_until(deadline) => break,
                event = events.recv() => match event {
                    Some(advertisement) => {
                        if self.handle_advertisement(advertisement, address_filter) {
                            admitted += 1;
                        }
                    }
                    None => break,
                }
            }
        }

        radio.stop_scan().await;
        Ok(admitted)
    }

    /// Decode one raw event and admit the result. Returns whether a device
    /// entered the registry.
    fn handle_advertisement(
        &self,
        advertisement: RawAdvertisement,
        address_filter: Option<&str>,
    ) -> bool {
        if let Some(wanted) = address_filter
            && !advertisement.address.eq_ignore_ascii_case(wanted)
        {
            trace!(address = %advertisement.address, "address filter mismatch");
            return false;
        }

        let Some(reading) = decoder::decode(&advertisement.manufacturer_data, &self.format) else {
            return false;
        };

        let device = Device::new(
            advertisement.name.unwrap_or_default(),
            advertisement.address,
            reading,
        );
        if !device.has_identity() {
            trace!("discarding advertisement with blank identity");
            return false;
        }

        let index = self
            .registry
            .lock()
            .expect("registry lock poisoned")
            .admit(device.clone());
        let Some(index) = index else {
            return false;
        };

        debug!(%device, index, "device admitted");
        if let Some(notify) = &self.on_device_admitted {
            notify(index);
        }
        if let Some(sink) = &self.export_sink {
            sink(&device);
        }
        true
    }
}
