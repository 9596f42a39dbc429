//! Recurring scan scheduling.
//!
//! The scheduler drives one [`ScanSession`] on a timer: delay, run a pass to
//! completion, delay again. Passes are strictly sequential and the delay is
//! measured from completion of the previous pass, so a long scan never
//! compounds drift beyond one interval. The whole loop is cancellable
//! through a [`CancellationToken`], which also reaches into a running pass.

use crate::permission::PermissionGate;
use crate::radio::{Radio, ScanError};
use crate::session::{ScanOutcome, ScanSession};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ScanScheduler {
    session: Arc<ScanSession>,
    interval: Duration,
    scan_duration: Duration,
    address_filter: Option<String>,
}

impl ScanScheduler {
    pub fn new(
        session: Arc<ScanSession>,
        interval: Duration,
        scan_duration: Duration,
        address_filter: Option<String>,
    ) -> Self {
        Self {
            session,
            interval,
            scan_duration,
            address_filter,
        }
    }

    /// Run scan passes until `shutdown` fires.
    ///
    /// No pass outcome is fatal: `AlreadyScanning` and radio errors are
    /// logged and the schedule continues. An unavailable radio backs off one
    /// extra interval instead of spinning.
    pub async fn run(
        &self,
        radio: &dyn Radio,
        gate: &dyn PermissionGate,
        shutdown: CancellationToken,
    ) {
        loop {
            if self.wait_interval(&shutdown).await {
                return;
            }

            let pass = self
                .session
                .run(
                    radio,
                    gate,
                    self.scan_duration,
                    self.address_filter.as_deref(),
                    &shutdown,
                )
                .await;

            match pass {
                Ok(ScanOutcome::Completed { admitted }) => {
                    debug!(admitted, "scan pass finished");
                }
                Ok(ScanOutcome::PermissionDenied) => {
                    warn!("scan pass skipped: permission not granted");
                }
                Err(ScanError::AlreadyScanning) => {
                    warn!("previous scan still running, skipping this cycle");
                }
                Err(ScanError::RadioUnavailable(reason)) => {
                    warn!(%reason, "radio unavailable, backing off");
                    if self.wait_interval(&shutdown).await {
                        return;
                    }
                }
                Err(error) => {
                    warn!(%error, "scan pass failed");
                }
            }
        }
    }

    /// Sleep one interval. Returns true when shutdown fired during the wait.
    async fn wait_interval(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(self.interval) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{FieldMap, PayloadEncoding, SensorFormat};
    use crate::permission::AlwaysGranted;
    use crate::test_utils::{FakeRadio, TEST_MANUFACTURER_ID, UnavailableRadio};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_session(passes: &Arc<AtomicUsize>) -> Arc<ScanSession> {
        let mut session = ScanSession::new(SensorFormat::new(
            TEST_MANUFACTURER_ID,
            PayloadEncoding::DirectAscii,
            FieldMap::legacy(),
        ));
        let passes = Arc::clone(passes);
        session.add_before_scan(move || {
            passes.fetch_add(1, Ordering::SeqCst);
        });
        Arc::new(session)
    }

    #[tokio::test]
    async fn runs_sequential_passes_until_cancelled() {
        let passes = Arc::new(AtomicUsize::new(0));
        let scheduler = ScanScheduler::new(
            counting_session(&passes),
            Duration::from_millis(20),
            Duration::from_millis(5),
            None,
        );
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let radio = FakeRadio::new(vec![]);
                scheduler.run(&radio, &AlwaysGranted, shutdown).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(110)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let ran = passes.load(Ordering::SeqCst);
        assert!(ran >= 2, "expected at least two passes, got {ran}");

        // No further passes after cancellation.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(passes.load(Ordering::SeqCst), ran);
    }

    #[tokio::test]
    async fn backs_off_when_radio_is_unavailable() {
        let passes = Arc::new(AtomicUsize::new(0));
        let scheduler = ScanScheduler::new(
            counting_session(&passes),
            Duration::from_millis(30),
            Duration::from_millis(5),
            None,
        );
        let shutdown = CancellationToken::new();

        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                scheduler.run(&UnavailableRadio, &AlwaysGranted, shutdown).await;
            })
        };

        // One attempt at ~30ms; the back-off delays the second past ~90ms.
        tokio::time::sleep(Duration::from_millis(70)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }
}
