//! Fling gesture recognition
//!
//! A gesture is a pointer-down followed by a pointer-up (or the pointer
//! leaving the play surface while held). The only state kept between events
//! is the in-flight down-point.

use glam::Vec2;

use crate::direction_angle;

/// Raw pointer input delivered by the host view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    /// Pointer left the surface
    Exit { x: f32, y: f32 },
}

/// A recognized fling, summarized as one direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fling {
    /// Radians, screen coordinates (y grows downward, so "up" is -π/2)
    pub angle: f32,
}

/// Turns pointer down/up pairs into flings
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    down: Option<Vec2>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self { down: None }
    }

    /// Whether a pointer is currently held
    pub fn is_tracking(&self) -> bool {
        self.down.is_some()
    }

    /// Feed one pointer event. Returns a fling when the gesture completes.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Option<Fling> {
        match event {
            PointerEvent::Down { x, y } => {
                self.down = Some(Vec2::new(x, y));
                None
            }
            PointerEvent::Move { .. } => None,
            PointerEvent::Up { x, y } => {
                // An up with no matching down flings from the origin
                let from = self.down.take().unwrap_or(Vec2::ZERO);
                Some(Fling {
                    angle: direction_angle(from, Vec2::new(x, y)),
                })
            }
            PointerEvent::Exit { x, y } => {
                let from = self.down.take()?;
                Some(Fling {
                    angle: direction_angle(from, Vec2::new(x, y)),
                })
            }
        }
    }
}
