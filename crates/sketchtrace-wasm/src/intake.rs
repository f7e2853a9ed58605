//! Upload intake WASM bindings.
//!
//! ```typescript
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const crop = { x: 50, y: 25, width: 100, height: 50 }; // from the crop modal
//! const sketch = commit_upload(bytes, crop, preview.clientWidth, preview.clientHeight);
//! const url = URL.createObjectURL(new Blob([sketch.png()], { type: 'image/png' }));
//! overlays.add_image(url, sketch.width, sketch.height);
//! ```

use sketchtrace_core::intake;
use sketchtrace_core::transform::{map_to_source, CropRect};
use wasm_bindgen::prelude::*;

/// A cropped sketch encoded as PNG.
#[wasm_bindgen]
pub struct JsCommittedSketch {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

#[wasm_bindgen]
impl JsCommittedSketch {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// PNG bytes as a `Uint8Array` (copied out of WASM memory).
    pub fn png(&self) -> Vec<u8> {
        self.png.clone()
    }
}

fn crop_from_js(crop: JsValue) -> Result<Option<CropRect>, JsValue> {
    if crop.is_undefined() || crop.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(crop)
        .map(Some)
        .map_err(|e| JsValue::from_str(&format!("Invalid crop: {}", e)))
}

/// Decode an upload, keep the cropped region at full resolution and encode
/// it as PNG.
///
/// `crop` is `{x, y, width, height}` in preview coordinates, or `null` for the
/// whole image. A zero-size crop also keeps the whole image.
#[wasm_bindgen]
pub fn commit_upload(
    bytes: &[u8],
    crop: JsValue,
    displayed_width: f64,
    displayed_height: f64,
) -> Result<JsCommittedSketch, JsValue> {
    let crop = crop_from_js(crop)?;
    intake::commit_upload(bytes, crop.as_ref(), displayed_width, displayed_height)
        .map(|sketch| JsCommittedSketch {
            width: sketch.width,
            height: sketch.height,
            png: sketch.png,
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Map a preview crop to source pixels without decoding anything.
#[wasm_bindgen]
pub fn map_crop_to_source(
    crop: JsValue,
    displayed_width: f64,
    displayed_height: f64,
    natural_width: u32,
    natural_height: u32,
) -> Result<JsValue, JsValue> {
    let crop = crop_from_js(crop)?;
    let rect = map_to_source(
        crop.as_ref(),
        displayed_width,
        displayed_height,
        natural_width,
        natural_height,
    );
    serde_wasm_bindgen::to_value(&rect).map_err(|e| JsValue::from_str(&e.to_string()))
}
