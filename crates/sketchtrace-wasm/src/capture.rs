//! Camera session WASM bindings.
//!
//! The session decides when to acquire and which results to keep; the page
//! performs the actual `getUserMedia` call and reports back by request id.
//!
//! # Example
//!
//! ```typescript
//! const camera = new JsCaptureSession();
//!
//! async function acquire(request) {
//!   if (!request) return;
//!   try {
//!     const stream = await navigator.mediaDevices.getUserMedia(request.constraints);
//!     if (camera.resolve(request.id, stream)) video.srcObject = camera.stream;
//!   } catch (err) {
//!     camera.reject(request.id, err);
//!   }
//! }
//!
//! acquire(camera.mount());
//! flipButton.onclick = () => acquire(camera.toggle_facing_mode());
//! ```

use crate::overlay::config_from_js;
use crate::types::{capture_error_from_dom, parse_facing_mode, JsAcquireRequest};
use js_sys::{Array, Function, Object, Promise, Reflect};
use sketchtrace_core::capture::{AcquireRequest, CaptureDevice, CaptureSession, RequestId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MediaStream, MediaStreamTrack};

/// Stream operations backed by `MediaStream` / `MediaStreamTrack`.
pub struct WebCaptureDevice;

fn video_track(stream: &MediaStream) -> Option<MediaStreamTrack> {
    stream.get_video_tracks().get(0).dyn_into::<MediaStreamTrack>().ok()
}

fn method(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

impl CaptureDevice for WebCaptureDevice {
    type Stream = MediaStream;

    fn stop(&mut self, stream: MediaStream) {
        for track in stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }

    fn torch_capable(&self, stream: &MediaStream) -> bool {
        let Some(track) = video_track(stream) else {
            return false;
        };
        // getCapabilities is missing on some browsers
        let Some(get_capabilities) = method(&track, "getCapabilities") else {
            return false;
        };
        get_capabilities
            .call0(&track)
            .and_then(|caps| Reflect::get(&caps, &JsValue::from_str("torch")))
            .map(|torch| torch.as_bool().unwrap_or(false))
            .unwrap_or(false)
    }

    fn apply_torch(&mut self, stream: &MediaStream, on: bool) -> Result<(), String> {
        let track = video_track(stream).ok_or_else(|| "no video track".to_string())?;
        let apply = method(&track, "applyConstraints")
            .ok_or_else(|| "applyConstraints is not available".to_string())?;

        let torch = Object::new();
        Reflect::set(&torch, &JsValue::from_str("torch"), &JsValue::from_bool(on))
            .map_err(|e| format!("{e:?}"))?;
        let constraints = Object::new();
        Reflect::set(
            &constraints,
            &JsValue::from_str("advanced"),
            &Array::of1(&torch),
        )
        .map_err(|e| format!("{e:?}"))?;

        let result = apply
            .call1(&track, &constraints)
            .map_err(|e| format!("{e:?}"))?;
        if let Ok(promise) = result.dyn_into::<Promise>() {
            let on_error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
                log::warn!("Failed to apply torch constraint: {err:?}");
            });
            let _ = promise.catch(&on_error);
            on_error.forget();
        }
        Ok(())
    }
}

fn request_to_js(request: Option<AcquireRequest>) -> Result<JsValue, JsValue> {
    match request {
        Some(request) => serde_wasm_bindgen::to_value(&JsAcquireRequest::from(request))
            .map_err(|e| JsValue::from_str(&e.to_string())),
        None => Ok(JsValue::NULL),
    }
}

fn string_field(value: &JsValue, name: &str) -> String {
    Reflect::get(value, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default()
}

#[wasm_bindgen]
pub struct JsCaptureSession {
    inner: CaptureSession<WebCaptureDevice>,
}

#[wasm_bindgen]
impl JsCaptureSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCaptureSession, JsValue> {
        let config = config_from_js(config)?;
        Ok(JsCaptureSession {
            inner: CaptureSession::new(WebCaptureDevice, config.facing_mode, config.capture),
        })
    }

    /// Start the first acquisition. Returns `{id, constraints}`.
    pub fn mount(&mut self) -> Result<JsValue, JsValue> {
        request_to_js(Some(self.inner.mount()))
    }

    /// Stop the stream; results still in flight will be discarded.
    pub fn unmount(&mut self) {
        self.inner.unmount();
    }

    /// Returns the acquisition to start, or `null`.
    pub fn set_facing_mode(&mut self, mode: &str) -> Result<JsValue, JsValue> {
        let mode = parse_facing_mode(mode).map_err(|e| JsValue::from_str(&e))?;
        request_to_js(self.inner.set_facing_mode(mode))
    }

    pub fn toggle_facing_mode(&mut self) -> Result<JsValue, JsValue> {
        request_to_js(self.inner.toggle_facing_mode())
    }

    /// Report a stream. Returns `false` (and stops the stream) when the
    /// request was superseded.
    pub fn resolve(&mut self, request_id: f64, stream: MediaStream) -> bool {
        self.inner.complete(RequestId(request_id as u64), Ok(stream))
    }

    /// Report a rejected `getUserMedia` call.
    pub fn reject(&mut self, request_id: f64, error: JsValue) -> bool {
        let name = string_field(&error, "name");
        let message = string_field(&error, "message");
        let error = capture_error_from_dom(&name, &message);
        self.inner.complete(RequestId(request_id as u64), Err(error))
    }

    /// Best-effort torch control. Returns whether the constraint was sent.
    pub fn set_torch(&mut self, on: bool) -> bool {
        self.inner.set_torch(on).is_ok()
    }

    pub fn toggle_torch(&mut self) -> bool {
        self.inner.toggle_torch().is_ok()
    }

    /// `idle`, `requesting`, `active` or `failed`.
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.inner.status().name().to_string()
    }

    /// Banner text when the last acquisition failed.
    #[wasm_bindgen(getter)]
    pub fn error_message(&self) -> Option<String> {
        self.inner.error_message()
    }

    #[wasm_bindgen(getter)]
    pub fn facing_mode(&self) -> String {
        self.inner.facing_mode().as_str().to_string()
    }

    /// The preview should be flipped horizontally.
    #[wasm_bindgen(getter)]
    pub fn mirrored(&self) -> bool {
        self.inner.is_mirrored()
    }

    #[wasm_bindgen(getter)]
    pub fn torch_capable(&self) -> bool {
        self.inner.torch_capable()
    }

    #[wasm_bindgen(getter)]
    pub fn torch_on(&self) -> bool {
        self.inner.torch_on()
    }

    #[wasm_bindgen(getter)]
    pub fn stream(&self) -> Option<MediaStream> {
        self.inner.stream().cloned()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn request_id(request: &JsValue) -> f64 {
        Reflect::get(request, &JsValue::from_str("id"))
            .unwrap()
            .as_f64()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn test_resolve_activates() {
        let mut camera = JsCaptureSession::new(JsValue::UNDEFINED).unwrap();
        let request = camera.mount().unwrap();
        assert_eq!(camera.status(), "requesting");

        let stream = MediaStream::new().unwrap();
        assert!(camera.resolve(request_id(&request), stream));
        assert_eq!(camera.status(), "active");
        assert!(!camera.torch_capable());
        assert!(!camera.set_torch(true));
        assert!(!camera.torch_on());
    }

    #[wasm_bindgen_test]
    fn test_stale_resolve_discarded() {
        let mut camera = JsCaptureSession::new(JsValue::UNDEFINED).unwrap();
        let first = camera.mount().unwrap();
        let second = camera.toggle_facing_mode().unwrap();
        assert_eq!(camera.facing_mode(), "user");
        assert!(camera.mirrored());

        assert!(!camera.resolve(request_id(&first), MediaStream::new().unwrap()));
        assert!(camera.resolve(request_id(&second), MediaStream::new().unwrap()));
        assert!(camera.stream().is_some());
    }

    #[wasm_bindgen_test]
    fn test_reject_maps_dom_error() {
        let mut camera = JsCaptureSession::new(JsValue::UNDEFINED).unwrap();
        let request = camera.mount().unwrap();
        let error = Object::new();
        Reflect::set(&error, &"name".into(), &"NotAllowedError".into()).unwrap();
        assert!(camera.reject(request_id(&request), error.into()));
        assert_eq!(camera.status(), "failed");
        assert_eq!(
            camera.error_message().as_deref(),
            Some("Failed to access camera. Please ensure permissions are granted.")
        );
    }
}
