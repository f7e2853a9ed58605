//! Pure gesture state transitions.
//!
//! [`step`] folds one pointer event into a [`GestureState`] and returns the
//! edits the event implies for the manipulated image. It never mutates the
//! image itself, so the caller applies the effects and passes the updated
//! [`ManipulationTarget`] in with the next event.

use crate::geometry::{Corner, Point, Quad};
use crate::transform::{AffineParams, PinchBaseline};

/// Pointer identifier as reported by the input system.
pub type PointerId = i32;

/// What part of the overlay a pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerTarget {
    #[default]
    Body,
    /// A corner handle of a warped image.
    Corner(Corner),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        id: PointerId,
        position: Point,
        target: PointerTarget,
    },
    Move {
        id: PointerId,
        position: Point,
    },
    Up {
        id: PointerId,
    },
    Cancel {
        id: PointerId,
    },
}

/// Placement of the image being manipulated, as of this event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManipulationTarget {
    pub affine: AffineParams,
    /// Present while the image is in warp mode.
    pub corners: Option<Quad>,
}

impl ManipulationTarget {
    pub fn is_warped(&self) -> bool {
        self.corners.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    Dragging,
    Pinching,
    WarpingCorner(Corner),
}

/// An edit or side effect produced by a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    /// Route all further events of this pointer to the overlay.
    CapturePointer(PointerId),
    ReleasePointer(PointerId),
    SetTranslation(Point),
    SetScaleRotation { scale: f64, rotation: f64 },
    MoveCorner { corner: Corner, position: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Phase {
    #[default]
    Idle,
    Dragging {
        pointer: PointerId,
        /// Pointer position minus translation at drag start.
        origin: Point,
    },
    Pinching {
        a: PointerId,
        b: PointerId,
        baseline: PinchBaseline,
    },
    WarpingCorner {
        pointer: PointerId,
        corner: Corner,
        /// Corner position minus pointer position at grab time.
        grab_offset: Point,
    },
}

/// Transient state of one manipulation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureState {
    /// Active pointers in arrival order.
    pointers: Vec<(PointerId, Point)>,
    phase: Phase,
}

impl GestureState {
    pub fn mode(&self) -> GestureMode {
        match self.phase {
            Phase::Idle => GestureMode::Idle,
            Phase::Dragging { .. } => GestureMode::Dragging,
            Phase::Pinching { .. } => GestureMode::Pinching,
            Phase::WarpingCorner { corner, .. } => GestureMode::WarpingCorner(corner),
        }
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    pub fn pointer_ids(&self) -> impl Iterator<Item = PointerId> + '_ {
        self.pointers.iter().map(|(id, _)| *id)
    }

    pub fn position(&self, id: PointerId) -> Option<Point> {
        self.pointers
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, p)| *p)
    }

    fn is_participant(&self, id: PointerId) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Dragging { pointer, .. } | Phase::WarpingCorner { pointer, .. } => pointer == id,
            Phase::Pinching { a, b, .. } => a == id || b == id,
        }
    }

    /// Pick a phase for the remaining pointers without moving the image.
    fn rebaseline(&mut self, target: &ManipulationTarget) {
        self.phase = match self.pointers.as_slice() {
            [] => Phase::Idle,
            [(id, pos)] => Phase::Dragging {
                pointer: *id,
                origin: *pos - target.affine.translation,
            },
            [(a, pa), (b, pb), ..] => Phase::Pinching {
                a: *a,
                b: *b,
                baseline: PinchBaseline::begin(
                    target.affine.scale,
                    target.affine.rotation,
                    *pa,
                    *pb,
                ),
            },
        };
    }
}

/// Fold one event into the gesture state.
///
/// Affine edits are suppressed while the target is warped; its pointers are
/// still tracked and captured so counts stay consistent. Events for unknown
/// pointers are ignored.
pub fn step(
    mut state: GestureState,
    event: &PointerEvent,
    target: &ManipulationTarget,
) -> (GestureState, Vec<GestureEffect>) {
    let mut effects = Vec::new();

    match *event {
        PointerEvent::Down {
            id,
            position,
            target: hit,
        } => {
            if let Some(entry) = state.pointers.iter_mut().find(|(pid, _)| *pid == id) {
                entry.1 = position;
                return (state, effects);
            }
            state.pointers.push((id, position));
            effects.push(GestureEffect::CapturePointer(id));

            match (state.phase, hit, target.corners) {
                (Phase::Idle, PointerTarget::Corner(corner), Some(corners)) => {
                    state.phase = Phase::WarpingCorner {
                        pointer: id,
                        corner,
                        grab_offset: corners.corner(corner) - position,
                    };
                }
                (Phase::Idle, ..) | (Phase::Dragging { .. }, ..) => state.rebaseline(target),
                // third and later pointers only get tracked
                _ => {}
            }
        }

        PointerEvent::Move { id, position } => {
            let Some(entry) = state.pointers.iter_mut().find(|(pid, _)| *pid == id) else {
                return (state, effects);
            };
            entry.1 = position;

            match state.phase {
                Phase::Dragging { pointer, origin } if pointer == id => {
                    if !target.is_warped() {
                        effects.push(GestureEffect::SetTranslation(position - origin));
                    }
                }
                Phase::Pinching { a, b, baseline } if a == id || b == id => {
                    if let (Some(pa), Some(pb)) = (state.position(a), state.position(b)) {
                        if !target.is_warped() {
                            let (scale, rotation) = baseline.resolve(pa, pb);
                            effects.push(GestureEffect::SetScaleRotation { scale, rotation });
                        }
                    }
                }
                Phase::WarpingCorner {
                    pointer,
                    corner,
                    grab_offset,
                } if pointer == id => {
                    if target.is_warped() {
                        effects.push(GestureEffect::MoveCorner {
                            corner,
                            position: position + grab_offset,
                        });
                    }
                }
                _ => {}
            }
        }

        PointerEvent::Up { id } | PointerEvent::Cancel { id } => {
            let Some(index) = state.pointers.iter().position(|(pid, _)| *pid == id) else {
                return (state, effects);
            };
            let participant = state.is_participant(id);
            state.pointers.remove(index);
            effects.push(GestureEffect::ReleasePointer(id));

            if participant || state.pointers.is_empty() {
                state.rebaseline(target);
            }
        }
    }

    (state, effects)
}
