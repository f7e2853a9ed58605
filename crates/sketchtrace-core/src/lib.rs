//! SketchTrace Core - overlay placement and camera session logic
//!
//! This crate provides the platform-independent core of SketchTrace, which
//! overlays an uploaded sketch on a live camera feed for tracing:
//! pointer gestures, affine and perspective placement, the camera session
//! state machine, and upload cropping.

pub mod capture;
pub mod config;
pub mod decode;
pub mod encode;
pub mod geometry;
pub mod gesture;
pub mod intake;
pub mod overlay;
pub mod transform;

pub use capture::{CaptureDevice, CaptureError, CaptureSession, CaptureStatus, FacingMode};
pub use config::{OverlayDefaults, SketchConfig};
pub use geometry::{Corner, Point, Quad};
pub use gesture::{GestureEffect, GestureMode, PointerTarget, PointerTracker};
pub use intake::{commit_upload, CommittedSketch, IntakeError};
pub use overlay::{OverlayController, OverlayError, OverlayImage, OverlayRecord, OverlayStack};
pub use transform::{RenderTransform, TransformComposer, TransformError};
