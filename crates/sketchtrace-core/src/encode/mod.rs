//! Encoding of committed sketches.
//!
//! A sketch is encoded once, right after its crop is extracted, and the
//! resulting PNG becomes the overlay's image source.

mod png;

pub use png::{encode_png, encode_raster_png, EncodeError};
