//! Rendered-frame cache keyed by frame index, invalidated by a content
//! fingerprint, plus the fps-based throttle that limits live re-renders
//! while the transport runs.

use image::RgbaImage;
use serde::Serialize;
use std::collections::HashMap;

use project::ProjectSettings;
use timeline::{time_to_frame, ElementKind, Sec, Timeline, TrackKind};

/// Upper bound on cached frames; ten seconds of 30 fps preview.
pub const FRAME_CACHE_CAPACITY: usize = 300;

/// The subset of element state that affects pixels. Timing fields are
/// quantized to micros so a no-op float round trip does not invalidate.
#[derive(Serialize)]
struct ElementFingerprint<'a> {
    name: &'a str,
    start_us: i64,
    trim_start_us: i64,
    trim_end_us: i64,
    kind: &'a ElementKind,
}

/// Everything that determines the pixels of the frame at `time`: active
/// visual elements in paint order, background and canvas size. Two
/// timelines with the same fingerprint render identically at that time.
pub fn frame_fingerprint(timeline: &Timeline, settings: &ProjectSettings, time: Sec) -> String {
    let mut parts: Vec<ElementFingerprint<'_>> = Vec::new();
    for track in timeline.tracks() {
        if track.kind == TrackKind::Audio {
            continue;
        }
        for element in &track.elements {
            if element.hidden || !element.is_active_at(time) {
                continue;
            }
            parts.push(ElementFingerprint {
                name: &element.name,
                start_us: (element.start_time * 1e6).round() as i64,
                trim_start_us: (element.trim_start * 1e6).round() as i64,
                trim_end_us: (element.trim_end * 1e6).round() as i64,
                kind: &element.kind,
            });
        }
    }
    let scene = serde_json::json!({
        "elements": parts,
        "background": settings.background,
        "canvas": settings.canvas_size,
    });
    scene.to_string()
}

struct CachedFrame {
    image: RgbaImage,
    fingerprint: String,
    seq: u64,
}

/// LRU-by-insertion cache of composited frames.
#[derive(Default)]
pub struct FrameCache {
    frames: HashMap<i64, CachedFrame>,
    next_seq: u64,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Cached image for `frame`, provided the scene has not changed since
    /// it was rendered. A stale entry is evicted on the spot.
    pub fn get(&mut self, frame: i64, fingerprint: &str) -> Option<&RgbaImage> {
        let stale = match self.frames.get(&frame) {
            Some(cached) => cached.fingerprint != fingerprint,
            None => return None,
        };
        if stale {
            self.frames.remove(&frame);
            return None;
        }
        self.frames.get(&frame).map(|cached| &cached.image)
    }

    pub fn insert(&mut self, frame: i64, fingerprint: String, image: RgbaImage) {
        if self.frames.len() >= FRAME_CACHE_CAPACITY && !self.frames.contains_key(&frame) {
            if let Some(oldest) = self
                .frames
                .iter()
                .min_by_key(|(_, cached)| cached.seq)
                .map(|(frame, _)| *frame)
            {
                self.frames.remove(&oldest);
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.frames.insert(
            frame,
            CachedFrame {
                image,
                fingerprint,
                seq,
            },
        );
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Frame index for a timeline instant at the project frame rate.
    pub fn frame_index(time: Sec, fps: f64) -> i64 {
        time_to_frame(time, fps)
    }
}

/// Caps live re-render frequency at the project frame rate. Paused
/// renders (scrubbing, one-off edits) always pass.
#[derive(Debug, Default)]
pub struct RenderThrottle {
    last_render: Option<Sec>,
}

impl RenderThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// `now` is wall-clock seconds from any monotonic origin.
    pub fn should_render(&mut self, now: Sec, fps: f64, playing: bool) -> bool {
        if !playing {
            self.last_render = Some(now);
            return true;
        }
        let min_interval = 1.0 / fps.max(1.0);
        match self.last_render {
            Some(last) if now - last < min_interval => false,
            _ => {
                self.last_render = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_render = None;
    }
}
