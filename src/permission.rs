//! Permission gate for radio scanning.
//!
//! Platforms with runtime scan permissions sit behind this seam. The pipeline
//! never calls the radio until a grant is confirmed, and denial means "no
//! scan performed", never an error.

pub trait PermissionGate: Send + Sync {
    /// Whether scanning is currently permitted.
    fn is_granted(&self) -> bool;

    /// Ask the platform for permission. Returns the resulting grant state.
    fn request(&self) -> bool {
        self.is_granted()
    }
}

/// Gate for platforms without a runtime permission prompt (desktop BlueZ).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn is_granted(&self) -> bool {
        true
    }
}
