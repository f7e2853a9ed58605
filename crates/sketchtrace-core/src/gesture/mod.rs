//! Pointer gestures on an overlay.
//!
//! Raw down/move/up/cancel events become placement edits:
//!
//! - one pointer on the body drags (translation)
//! - two pointers pinch (uniform scale and rotation about the center)
//! - one pointer on a corner handle of a warped image moves that corner
//!
//! Transitions between these re-baseline from the current placement, so
//! adding or lifting a finger never makes the image jump.

mod state;
mod tracker;

pub use state::{
    step, GestureEffect, GestureMode, GestureState, ManipulationTarget, PointerEvent, PointerId,
    PointerTarget,
};
pub use tracker::PointerTracker;
