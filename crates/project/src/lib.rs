//! Project settings collaborator: canvas size, frame rate and background.
//! The engine treats the frame rate as its quantization unit and the
//! canvas size as the renderer's output dimensions. How projects are
//! persisted is someone else's problem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid frame rate: {0}")]
    InvalidFps(f64),
    #[error("invalid canvas size: {0}x{1}")]
    InvalidCanvasSize(u32, u32),
}

pub const FPS_PRESETS: [f64; 6] = [23.976, 24.0, 29.97, 30.0, 60.0, 120.0];
pub const DEFAULT_FPS: f64 = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const HD: CanvasSize = CanvasSize {
        width: 1920,
        height: 1080,
    };

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }

    /// Nearest canvas matching an arbitrary media aspect ratio, keeping
    /// the current height.
    pub fn with_aspect_ratio(&self, aspect: f64) -> CanvasSize {
        let height = self.height.max(1);
        let width = ((height as f64 * aspect).round() as u32).max(1);
        // Keep dimensions even for downstream encoders.
        CanvasSize {
            width: width + (width & 1),
            height,
        }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::HD
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    /// Solid color as a "#rrggbb" hex string.
    Color { color: String },
    /// The first active visual media, cover-scaled and blurred.
    Blur { intensity: u8 },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color {
            color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSettings {
    pub id: Uuid,
    pub name: String,
    pub canvas_size: CanvasSize,
    pub fps: f64,
    #[serde(default)]
    pub background: Background,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectSettings {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            canvas_size: CanvasSize::default(),
            fps: DEFAULT_FPS,
            background: Background::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_fps(&mut self, fps: f64) -> Result<(), ProjectError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ProjectError::InvalidFps(fps));
        }
        self.fps = fps;
        self.touch();
        Ok(())
    }

    pub fn set_canvas_size(&mut self, size: CanvasSize) -> Result<(), ProjectError> {
        if size.width == 0 || size.height == 0 {
            return Err(ProjectError::InvalidCanvasSize(size.width, size.height));
        }
        self.canvas_size = size;
        self.touch();
        Ok(())
    }

    /// Adopt the aspect ratio of the first media element added to an
    /// empty timeline.
    pub fn set_canvas_from_aspect_ratio(&mut self, aspect: f64) {
        if aspect.is_finite() && aspect > 0.0 {
            self.canvas_size = self.canvas_size.with_aspect_ratio(aspect);
            self.touch();
        }
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
        self.touch();
    }

    /// Length of one frame in seconds; the minimum effective element
    /// length for trim clamping.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
