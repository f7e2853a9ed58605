//! JavaScript-facing data shapes and conversions.
//!
//! Everything here is plain Rust so it can be tested natively; the
//! bindings convert to and from `JsValue` with `serde_wasm_bindgen`.

use serde::Serialize;
use sketchtrace_core::capture::{AcquireRequest, CaptureError, FacingMode};
use sketchtrace_core::gesture::{GestureEffect, GestureMode, PointerTarget};
use sketchtrace_core::Corner;

/// Map a rejected `getUserMedia` error to a capture error.
///
/// `name` is the `DOMException` name (or `TypeError` when the API is
/// missing); `message` is kept for acquisition failures.
pub(crate) fn capture_error_from_dom(name: &str, message: &str) -> CaptureError {
    match name {
        "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => {
            CaptureError::PermissionDenied
        }
        "TypeError" | "NotSupportedError" => CaptureError::DeviceUnsupported,
        _ => {
            let reason = if message.is_empty() {
                name.to_string()
            } else {
                format!("{name}: {message}")
            };
            CaptureError::AcquisitionFailed(reason)
        }
    }
}

/// Parse the handle a pointer went down on: `body` (or nothing) for the
/// image itself, `tl`/`tr`/`br`/`bl` for a corner handle.
pub(crate) fn parse_pointer_target(handle: Option<&str>) -> Result<PointerTarget, String> {
    match handle {
        None | Some("") | Some("body") => Ok(PointerTarget::Body),
        Some(name) => Corner::from_name(name)
            .map(PointerTarget::Corner)
            .ok_or_else(|| format!("Unknown handle: {name}")),
    }
}

pub(crate) fn parse_facing_mode(mode: &str) -> Result<FacingMode, String> {
    match mode {
        "environment" => Ok(FacingMode::Environment),
        "user" => Ok(FacingMode::User),
        other => Err(format!("Unknown facing mode: {other}")),
    }
}

pub(crate) fn gesture_mode_name(mode: GestureMode) -> String {
    match mode {
        GestureMode::Idle => "idle".to_string(),
        GestureMode::Dragging => "dragging".to_string(),
        GestureMode::Pinching => "pinching".to_string(),
        GestureMode::WarpingCorner(corner) => format!("warping-{}", corner.name()),
    }
}

/// Pointer capture changes the page must apply with
/// `setPointerCapture` / `releasePointerCapture`.
#[derive(Debug, Default, PartialEq, Serialize)]
pub(crate) struct PointerCaptureUpdate {
    pub capture: Vec<i32>,
    pub release: Vec<i32>,
}

impl From<&[GestureEffect]> for PointerCaptureUpdate {
    fn from(effects: &[GestureEffect]) -> Self {
        let mut update = PointerCaptureUpdate::default();
        for effect in effects {
            match *effect {
                GestureEffect::CapturePointer(id) => update.capture.push(id),
                GestureEffect::ReleasePointer(id) => update.release.push(id),
                _ => {}
            }
        }
        update
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct IdealValue {
    pub ideal: u32,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoConstraints {
    pub facing_mode: &'static str,
    pub width: IdealValue,
    pub height: IdealValue,
}

/// `MediaStreamConstraints` for `navigator.mediaDevices.getUserMedia`.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct MediaConstraints {
    pub video: VideoConstraints,
    pub audio: bool,
}

/// An acquisition the page must start and report back by `id`.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct JsAcquireRequest {
    pub id: u64,
    pub constraints: MediaConstraints,
}

impl From<AcquireRequest> for JsAcquireRequest {
    fn from(request: AcquireRequest) -> Self {
        Self {
            id: request.id.0,
            constraints: MediaConstraints {
                video: VideoConstraints {
                    facing_mode: request.facing_mode.as_str(),
                    width: IdealValue {
                        ideal: request.constraints.ideal_width,
                    },
                    height: IdealValue {
                        ideal: request.constraints.ideal_height,
                    },
                },
                audio: false,
            },
        }
    }
}
