//! Stateful pointer tracking for one overlay surface.

use super::state::{
    step, GestureEffect, GestureMode, GestureState, ManipulationTarget, PointerEvent, PointerId,
    PointerTarget,
};
use crate::geometry::Point;

/// Tracks the pointers of the current manipulation and classifies them
/// into drag, pinch and corner gestures.
///
/// Every handler takes the current placement of the manipulated image and
/// returns the effects to apply, including pointer capture and release.
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: GestureState,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer_down(
        &mut self,
        id: PointerId,
        position: Point,
        target: PointerTarget,
        current: &ManipulationTarget,
    ) -> Vec<GestureEffect> {
        self.handle(
            &PointerEvent::Down {
                id,
                position,
                target,
            },
            current,
        )
    }

    pub fn on_pointer_move(
        &mut self,
        id: PointerId,
        position: Point,
        current: &ManipulationTarget,
    ) -> Vec<GestureEffect> {
        self.handle(&PointerEvent::Move { id, position }, current)
    }

    pub fn on_pointer_up(
        &mut self,
        id: PointerId,
        current: &ManipulationTarget,
    ) -> Vec<GestureEffect> {
        self.handle(&PointerEvent::Up { id }, current)
    }

    /// System-interrupted pointers end exactly like a lift.
    pub fn on_pointer_cancel(
        &mut self,
        id: PointerId,
        current: &ManipulationTarget,
    ) -> Vec<GestureEffect> {
        self.handle(&PointerEvent::Cancel { id }, current)
    }

    pub fn handle(
        &mut self,
        event: &PointerEvent,
        current: &ManipulationTarget,
    ) -> Vec<GestureEffect> {
        let before = self.state.mode();
        let (state, effects) = step(std::mem::take(&mut self.state), event, current);
        self.state = state;

        let after = self.state.mode();
        if before != after {
            log::debug!(
                "Gesture {before:?} -> {after:?} ({} pointers)",
                self.state.pointer_count()
            );
        }
        effects
    }

    /// Drop every pointer, releasing their captures.
    pub fn reset(&mut self) -> Vec<GestureEffect> {
        let state = std::mem::take(&mut self.state);
        state.pointer_ids().map(GestureEffect::ReleasePointer).collect()
    }

    pub fn mode(&self) -> GestureMode {
        self.state.mode()
    }

    pub fn pointer_count(&self) -> usize {
        self.state.pointer_count()
    }

    pub fn is_idle(&self) -> bool {
        self.state.pointer_count() == 0
    }
}
