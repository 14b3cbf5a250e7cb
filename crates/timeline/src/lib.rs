use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

mod element;
pub use element::*;
mod track;
pub use track::*;
mod model;
pub use model::*;
mod ops;
pub use ops::*;
mod snapping;
pub use snapping::*;
mod history;
pub use history::*;
mod timecode;
pub use timecode::*;

/// Timeline time in seconds. All committed values are frame-aligned via
/// [`snap_time_to_frame`].
pub type Sec = f64;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("track not found: {0}")]
    TrackNotFound(TrackId),
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),
    #[error(
        "range [{start}, {end}) overlaps element {blocking} on track {track}"
    )]
    Overlap {
        track: TrackId,
        blocking: ElementId,
        start: Sec,
        end: Sec,
    },
    #[error("split time {at} is not strictly inside [{start}, {end})")]
    InvalidSplitPoint { at: Sec, start: Sec, end: Sec },
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("history empty: {0}")]
    HistoryEmpty(&'static str),
    /// Unreachable under correct use; callers must not catch and retry.
    #[error("engine invariant violated: {0}")]
    Invariant(String),
}

impl TimelineError {
    /// Stale-reference errors that a caller may silently drop after a
    /// concurrent edit invalidated its ids.
    pub fn is_stale_reference(&self) -> bool {
        matches!(
            self,
            Self::TrackNotFound(_) | Self::ElementNotFound(_)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ElementId(pub Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MediaId(pub Uuid);

impl MediaId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a media item fundamentally is. Mirrored by the media store; the
/// engine only ever reads it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

/// Read-only view of the media library, implemented by the media store.
/// The engine reads kind and duration for placement defaults and the
/// audio-separation check; it never owns media item lifecycle.
pub trait MediaSource {
    fn media_kind(&self, id: MediaId) -> Option<MediaKind>;
    fn media_duration(&self, id: MediaId) -> Option<Sec>;
}
