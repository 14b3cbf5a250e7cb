//! Software frame compositor for the preview surface, plus the frame
//! cache and render throttle that keep it affordable during scrubbing.

use image::RgbaImage;
use thiserror::Error;

use timeline::{MediaId, Sec};

mod compositor;
pub use compositor::*;
mod cache;
pub use cache::*;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("no frame available for media {media} at {local_time}s: {reason}")]
    FrameUnavailable {
        media: MediaId,
        local_time: Sec,
        reason: String,
    },
    #[error("invalid font data for family {0}")]
    InvalidFont(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Supplies decoded pixels for a media item at a source-local time.
/// Implemented by the host over its decoder sessions; still images
/// ignore `local_time`.
pub trait FrameSource {
    fn frame_at(&mut self, media: MediaId, local_time: Sec) -> Result<RgbaImage, RendererError>;
}
