//! Sketch decoding for the upload intake.
//!
//! Uploaded bytes are decoded once, oriented according to their EXIF tag and
//! converted to RGBA. The resulting [`Raster`] is immutable: cropping
//! produces a new raster and nothing downstream edits pixels.
//!
//! All operations are synchronous and single-threaded within WASM.

mod image;
mod types;

pub use self::image::{decode_image, get_orientation};
pub use types::{DecodeError, Orientation, Raster, CHANNELS};
