//! Overlay WASM bindings.
//!
//! The page forwards pointer events from each overlay element and panel
//! edits from the control panel, then redraws from [`JsOverlayController::render`].
//!
//! # Example
//!
//! ```typescript
//! const overlays = new JsOverlayController({ overlay: { opacity: 0.5 } });
//! const id = overlays.add_image(url, img.naturalWidth, img.naturalHeight);
//!
//! el.onpointerdown = (e) => {
//!   const update = overlays.pointer_down(id, e.pointerId, e.clientX, e.clientY, e.target.dataset.handle);
//!   update.capture.forEach((p) => el.setPointerCapture(p));
//!   draw(overlays.render());
//! };
//! ```

use crate::types::{gesture_mode_name, parse_pointer_target, PointerCaptureUpdate};
use sketchtrace_core::overlay::{OverlayController, OverlayRecord, SourceImage};
use sketchtrace_core::{GestureEffect, Point, SketchConfig};
use wasm_bindgen::prelude::*;

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn capture_update(effects: &[GestureEffect]) -> Result<JsValue, JsValue> {
    to_js(&PointerCaptureUpdate::from(effects))
}

/// Parse an optional config object; `undefined` and `null` give defaults.
pub(crate) fn config_from_js(config: JsValue) -> Result<SketchConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(SketchConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))
}

#[wasm_bindgen]
pub struct JsOverlayController {
    inner: OverlayController,
}

#[wasm_bindgen]
impl JsOverlayController {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsOverlayController, JsValue> {
        let config = config_from_js(config)?;
        Ok(JsOverlayController {
            inner: OverlayController::new(&config),
        })
    }

    /// Add a committed sketch and select it. Returns the new id.
    pub fn add_image(&mut self, url: &str, natural_width: u32, natural_height: u32) -> String {
        self.inner
            .add(SourceImage::new(url, natural_width, natural_height))
    }

    /// Delete an image. Returns `{capture, release}` pointer ids.
    pub fn remove_image(&mut self, id: &str) -> Result<JsValue, JsValue> {
        let effects = self
            .inner
            .remove(id)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        capture_update(&effects)
    }

    pub fn select(&mut self, id: &str) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .select(id)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn active_id(&self) -> Option<String> {
        self.inner.stack().active_id().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn gesture_mode(&self) -> String {
        gesture_mode_name(self.inner.gesture_mode())
    }

    /// Record the natural size once the `<img>` element has loaded.
    pub fn set_natural_size(&mut self, id: &str, width: u32, height: u32) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .set_natural_size(id, width, height)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_opacity(&mut self, opacity: f64) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .set_opacity(opacity)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .set_scale(scale)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_rotation(&mut self, rotation: f64) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .set_rotation(rotation)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn set_grayscale(&mut self, grayscale: bool) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .set_grayscale(grayscale)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn reset_transform(&mut self) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .reset_transform()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn enter_warp(&mut self) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .enter_warp()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn exit_warp(&mut self) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .exit_warp()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn reset_warp(&mut self) -> Result<(), JsValue> {
        self.inner
            .stack_mut()
            .reset_warp()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `handle` is `undefined`/`"body"` for the image, or `tl`/`tr`/`br`/`bl`.
    pub fn pointer_down(
        &mut self,
        image_id: &str,
        pointer_id: i32,
        x: f64,
        y: f64,
        handle: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let target =
            parse_pointer_target(handle.as_deref()).map_err(|e| JsValue::from_str(&e))?;
        let effects = self
            .inner
            .pointer_down(image_id, pointer_id, Point::new(x, y), target)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        capture_update(&effects)
    }

    pub fn pointer_move(&mut self, pointer_id: i32, x: f64, y: f64) -> Result<JsValue, JsValue> {
        let effects = self.inner.pointer_move(pointer_id, Point::new(x, y));
        capture_update(&effects)
    }

    pub fn pointer_up(&mut self, pointer_id: i32) -> Result<JsValue, JsValue> {
        let effects = self.inner.pointer_up(pointer_id);
        capture_update(&effects)
    }

    pub fn pointer_cancel(&mut self, pointer_id: i32) -> Result<JsValue, JsValue> {
        let effects = self.inner.pointer_cancel(pointer_id);
        capture_update(&effects)
    }

    /// Render transforms for every overlay in paint order:
    /// `[{id, mode, matrix, opacity, grayscale, stale}]`.
    pub fn render(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.render())
    }

    /// CSS `transform` and `filter` strings for one overlay.
    pub fn css(&mut self, id: &str) -> Result<JsValue, JsValue> {
        let rendered = self
            .inner
            .render_image(id)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&[rendered.css_transform().as_str(), rendered.css_filter()])
    }

    pub fn to_records(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.to_records())
    }

    /// Replace all overlays with persisted records. Invalid records are
    /// skipped. Returns pointer ids to release.
    pub fn load_records(&mut self, records: JsValue) -> Result<JsValue, JsValue> {
        let records: Vec<OverlayRecord> = serde_wasm_bindgen::from_value(records)
            .map_err(|e| JsValue::from_str(&format!("Invalid overlay records: {}", e)))?;
        let effects = self.inner.load_records(records);
        capture_update(&effects)
    }
}
