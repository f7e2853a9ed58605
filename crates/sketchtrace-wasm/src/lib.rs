//! SketchTrace WASM - WebAssembly bindings for SketchTrace
//!
//! This crate exposes the sketchtrace-core overlay, camera and intake logic
//! to the TypeScript front end.
//!
//! # Module Structure
//!
//! - `overlay` - Overlay stack, pointer gestures and render transforms
//! - `capture` - Camera session driven by `getUserMedia` results
//! - `intake` - Upload cropping and PNG encoding
//! - `logger` - Forwards core logs to the browser console
//! - `types` - JS-facing shapes and error mapping
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsOverlayController, JsCaptureSession } from '@sketchtrace/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const overlays = new JsOverlayController();
//! const camera = new JsCaptureSession();
//! ```

use wasm_bindgen::prelude::*;

mod capture;
mod intake;
mod logger;
mod overlay;
mod types;

// Re-export public types
pub use capture::{JsCaptureSession, WebCaptureDevice};
pub use intake::{commit_upload, map_crop_to_source, JsCommittedSketch};
pub use logger::set_log_level;
pub use overlay::JsOverlayController;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // a second instance on the page has already installed its logger
    let _ = logger::init_with_level(log::LevelFilter::Warn);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
