//! Glue between pointer input, the overlay stack and the render transforms.

use super::{OverlayError, OverlayImage, OverlayRecord, OverlayStack, SourceImage};
use crate::config::SketchConfig;
use crate::geometry::Point;
use crate::gesture::{
    GestureEffect, GestureMode, ManipulationTarget, PointerId, PointerTarget, PointerTracker,
};
use crate::transform::{RenderTransform, TransformComposer};

impl From<&OverlayImage> for ManipulationTarget {
    fn from(image: &OverlayImage) -> Self {
        Self {
            affine: image.affine(),
            corners: image.warp_corners(),
        }
    }
}

/// Owns the overlays and routes gestures to the one being manipulated.
///
/// A gesture starts on the image the first pointer lands on, which also
/// becomes the active image. Pointers that arrive while a gesture is in
/// progress join it, whatever they hit.
#[derive(Debug, Default)]
pub struct OverlayController {
    stack: OverlayStack,
    tracker: PointerTracker,
    composer: TransformComposer,
    gesture_image: Option<String>,
}

impl OverlayController {
    pub fn new(config: &SketchConfig) -> Self {
        Self {
            stack: OverlayStack::new(config.overlay),
            tracker: PointerTracker::new(),
            composer: TransformComposer::new(config.collinear_epsilon),
            gesture_image: None,
        }
    }

    pub fn stack(&self) -> &OverlayStack {
        &self.stack
    }

    /// Panel edits go through the stack and apply to the active image.
    pub fn stack_mut(&mut self) -> &mut OverlayStack {
        &mut self.stack
    }

    pub fn add(&mut self, source: SourceImage) -> String {
        self.stack.add(source)
    }

    /// Delete an image. Returns pointer releases when it was mid-gesture.
    pub fn remove(&mut self, id: &str) -> Result<Vec<GestureEffect>, OverlayError> {
        self.stack.remove(id)?;
        self.composer.forget(id);
        if self.gesture_image.as_deref() == Some(id) {
            self.gesture_image = None;
            return Ok(self.tracker.reset());
        }
        Ok(Vec::new())
    }

    pub fn load_records(&mut self, records: Vec<OverlayRecord>) -> Vec<GestureEffect> {
        let released = self.tracker.reset();
        self.gesture_image = None;
        self.composer = TransformComposer::new(self.composer.collinear_epsilon());
        self.stack.load_records(records);
        released
    }

    pub fn to_records(&self) -> Vec<OverlayRecord> {
        self.stack.to_records()
    }

    pub fn gesture_mode(&self) -> GestureMode {
        self.tracker.mode()
    }

    pub fn pointer_down(
        &mut self,
        image_id: &str,
        pointer: PointerId,
        position: Point,
        target: PointerTarget,
    ) -> Result<Vec<GestureEffect>, OverlayError> {
        if self.tracker.is_idle() || self.gesture_image.is_none() {
            self.stack.select(image_id)?;
            self.gesture_image = Some(image_id.to_string());
        }
        let current = self.current_target()?;
        let effects = self
            .tracker
            .on_pointer_down(pointer, position, target, &current);
        self.apply(&effects);
        Ok(effects)
    }

    pub fn pointer_move(&mut self, pointer: PointerId, position: Point) -> Vec<GestureEffect> {
        let Ok(current) = self.current_target() else {
            return Vec::new();
        };
        let effects = self.tracker.on_pointer_move(pointer, position, &current);
        self.apply(&effects);
        effects
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> Vec<GestureEffect> {
        let current = self.current_target().unwrap_or_default();
        let effects = self.tracker.on_pointer_up(pointer, &current);
        self.finish(&effects);
        effects
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> Vec<GestureEffect> {
        let current = self.current_target().unwrap_or_default();
        let effects = self.tracker.on_pointer_cancel(pointer, &current);
        self.finish(&effects);
        effects
    }

    fn finish(&mut self, effects: &[GestureEffect]) {
        self.apply(effects);
        if self.tracker.is_idle() {
            self.gesture_image = None;
        }
    }

    fn current_target(&self) -> Result<ManipulationTarget, OverlayError> {
        let id = self
            .gesture_image
            .as_deref()
            .ok_or(OverlayError::NoActiveImage)?;
        self.stack
            .get(id)
            .map(ManipulationTarget::from)
            .ok_or_else(|| OverlayError::UnknownImage(id.to_string()))
    }

    fn apply(&mut self, effects: &[GestureEffect]) {
        let Some(image) = self
            .gesture_image
            .as_deref()
            .and_then(|id| self.stack.get_mut(id))
        else {
            return;
        };
        for effect in effects {
            let result = match *effect {
                GestureEffect::SetTranslation(t) => image.set_translation(t),
                GestureEffect::SetScaleRotation { scale, rotation } => {
                    image.set_scale_rotation(scale, rotation)
                }
                GestureEffect::MoveCorner { corner, position } => {
                    image.move_corner(corner, position)
                }
                GestureEffect::CapturePointer(_) | GestureEffect::ReleasePointer(_) => Ok(()),
            };
            if let Err(e) = result {
                log::debug!("Dropped gesture edit on {}: {e}", image.id());
            }
        }
    }

    /// Render transforms for every overlay in paint order.
    pub fn render(&mut self) -> Vec<RenderTransform> {
        self.composer.render_all(self.stack.images())
    }

    pub fn render_image(&mut self, id: &str) -> Result<RenderTransform, OverlayError> {
        let image = self
            .stack
            .get(id)
            .ok_or_else(|| OverlayError::UnknownImage(id.to_string()))?;
        Ok(self.composer.render(image))
    }
}
