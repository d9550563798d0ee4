//! Pointer input for stroke capture.

use serde::{Deserialize, Serialize};

/// A point in surface-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfacePoint {
    /// X position, 0 at the left edge of the surface.
    pub x: f32,
    /// Y position, 0 at the top edge of the surface.
    pub y: f32,
}

impl SurfacePoint {
    /// Create a surface-local point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for SurfacePoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// On-screen bounds of the capture surface, in viewport coordinates.
///
/// Hosts read these per event; they are never cached across events since the
/// surface may move or resize between them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceBounds {
    /// Left edge in viewport coordinates.
    pub left: f32,
    /// Top edge in viewport coordinates.
    pub top: f32,
}

impl SurfaceBounds {
    /// Create bounds from the surface's top-left corner.
    #[must_use]
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }

    /// Translate a viewport position into surface-local coordinates.
    #[must_use]
    pub fn to_local(&self, client_x: f32, client_y: f32) -> SurfacePoint {
        SurfacePoint::new(client_x - self.left, client_y - self.top)
    }
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Primary button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Primary button released.
    Up,
    /// Pointer left the surface.
    Leave,
}

/// A single pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// What happened.
    pub phase: PointerPhase,
    /// X position in viewport coordinates.
    pub client_x: f32,
    /// Y position in viewport coordinates.
    pub client_y: f32,
}

impl PointerEvent {
    /// Create a pointer event.
    #[must_use]
    pub const fn new(phase: PointerPhase, client_x: f32, client_y: f32) -> Self {
        Self {
            phase,
            client_x,
            client_y,
        }
    }

    /// Resolve this event against the surface's current bounds.
    #[must_use]
    pub fn local(&self, bounds: &SurfaceBounds) -> SurfacePoint {
        bounds.to_local(self.client_x, self.client_y)
    }

    /// Whether this event terminates an active stroke.
    #[must_use]
    pub fn ends_stroke(&self) -> bool {
        matches!(self.phase, PointerPhase::Up | PointerPhase::Leave)
    }
}
