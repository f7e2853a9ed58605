//! Camera capture session management.
//!
//! A [`CaptureSession`] acquires, reconfigures and releases the video stream
//! the sketch is traced over. Acquisition itself is asynchronous and lives in
//! the host; the session only decides when to request, which results to
//! accept, and which streams to stop.
//!
//! ```text
//! Idle ──mount──▶ Requesting ──ok──▶ Active
//!                  │    ▲              │
//!                 err   └─facing change┘
//!                  ▼
//!                Failed ──facing change──▶ Requesting
//! ```

mod session;
mod types;

pub use session::{CaptureDevice, CaptureSession};
pub use types::{
    AcquireRequest, CaptureConstraints, CaptureError, CaptureStatus, FacingMode, RequestId,
    TorchWarning,
};
