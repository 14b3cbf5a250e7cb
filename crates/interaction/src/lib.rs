//! Pointer-level editing: the drag state machine that turns raw pointer
//! events into timeline edit operations, and drop-zone handling for
//! items dragged in from the media panel.

use timeline::{Sec, PIXELS_PER_SECOND};

mod drag;
pub use drag::*;
mod drop;
pub use drop::*;

/// Per-event view parameters the host supplies with every pointer event.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub zoom: f32,
    pub fps: f64,
    pub playhead: Sec,
}

impl View {
    /// Timeline time under a ruler x coordinate, unclamped.
    pub fn time_at(&self, x_px: f32) -> Sec {
        (x_px / (PIXELS_PER_SECOND * self.zoom)) as Sec
    }
}
