//! Media library collaborator. Owns media item lifecycle; the timeline
//! engine only reads kind and duration through [`timeline::MediaSource`]
//! and is notified of deletions through its cascade entry point.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use timeline::{MediaId, MediaKind, MediaSource, Sec, Timeline};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media item not found: {0}")]
    NotFound(MediaId),
    #[error("invalid media item: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: MediaId,
    pub name: String,
    pub kind: MediaKind,
    /// Intrinsic duration in seconds. Still images report the default
    /// placement duration.
    pub duration: Sec,
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// Placement duration for still images dropped on the timeline.
pub const DEFAULT_IMAGE_DURATION: Sec = 5.0;

impl MediaItem {
    pub fn new(
        name: impl Into<String>,
        kind: MediaKind,
        duration: Sec,
        width: u32,
        height: u32,
        url: impl Into<String>,
    ) -> Result<Self, MediaError> {
        let duration = match kind {
            MediaKind::Image => DEFAULT_IMAGE_DURATION,
            _ if duration <= 0.0 => {
                return Err(MediaError::Invalid(
                    "duration must be positive".to_string(),
                ))
            }
            _ => duration,
        };
        Ok(Self {
            id: MediaId::new(),
            name: name.into(),
            kind,
            duration,
            width,
            height,
            url: url.into(),
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f64 / self.height as f64
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MediaStore {
    items: Vec<MediaItem>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn get(&self, id: MediaId) -> Option<&MediaItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn add(&mut self, item: MediaItem) -> MediaId {
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Delete an item and cascade into the timeline: every element
    /// referencing it is removed and emptied tracks collapse.
    pub fn remove(
        &mut self,
        id: MediaId,
        timeline: &mut Timeline,
    ) -> Result<MediaItem, MediaError> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(MediaError::NotFound(id))?;
        let item = self.items.remove(index);
        let removed = timeline.purge_media(id);
        debug!(%id, removed, "media item deleted, timeline references purged");
        Ok(item)
    }
}

impl MediaSource for MediaStore {
    fn media_kind(&self, id: MediaId) -> Option<MediaKind> {
        self.get(id).map(|i| i.kind)
    }

    fn media_duration(&self, id: MediaId) -> Option<Sec> {
        self.get(id).map(|i| i.duration)
    }
}
