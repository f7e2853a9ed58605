//! Core types for camera capture.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which of the device's cameras to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Outward-facing (rear) camera.
    #[default]
    Environment,
    /// User-facing (front) camera.
    User,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    /// User-facing previews are shown mirrored horizontally.
    pub fn is_mirrored(self) -> bool {
        self == FacingMode::User
    }

    /// The constraint string understood by the capture API.
    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

/// Ideal resolution requested from the capture API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// Errors surfaced to the user as a non-blocking banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The capture API is missing entirely.
    #[error("Camera API not supported in this browser")]
    DeviceUnsupported,

    #[error("Failed to access camera. Please ensure permissions are granted.")]
    PermissionDenied,

    /// No matching device, device busy, or any other acquisition failure.
    #[error("Failed to access camera: {0}")]
    AcquisitionFailed(String),
}

/// Non-fatal torch outcomes. Logged, never stored as session status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TorchWarning {
    #[error("Torch is not supported by the active camera")]
    Unsupported,

    #[error("Torch cannot be toggled without an active camera")]
    NotActive,

    #[error("Failed to apply torch constraint: {0}")]
    ApplyFailed(String),
}

/// Lifecycle state of a [`CaptureSession`](super::CaptureSession).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureStatus {
    #[default]
    Idle,
    Requesting,
    Active,
    Failed(CaptureError),
}

impl CaptureStatus {
    /// Short name for logs and the JS status string.
    pub fn name(&self) -> &'static str {
        match self {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Requesting => "requesting",
            CaptureStatus::Active => "active",
            CaptureStatus::Failed(_) => "failed",
        }
    }
}

/// Identifies one acquisition attempt. Results carrying an id other than
/// the session's pending id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// An acquisition the host must start and later report back through
/// [`CaptureSession::complete`](super::CaptureSession::complete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquireRequest {
    pub id: RequestId,
    pub facing_mode: FacingMode,
    pub constraints: CaptureConstraints,
}
