use serde::{Deserialize, Serialize};

use crate::{ElementId, ElementKind, Sec, TimelineElement, TrackId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Hosts video and image elements.
    Media,
    Text,
    Audio,
}

impl TrackKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Media => "Media Track",
            Self::Text => "Text Track",
            Self::Audio => "Audio Track",
        }
    }

    /// Which element kinds a track of this type accepts.
    pub fn accepts(&self, element: &ElementKind) -> bool {
        match self {
            Self::Media | Self::Audio => element.is_media(),
            Self::Text => element.is_text(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub elements: Vec<TimelineElement>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub is_main: bool,
}

fn default_volume() -> f32 {
    1.0
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: kind.display_name().to_string(),
            kind,
            elements: Vec::new(),
            muted: false,
            volume: 1.0,
            is_main: false,
        }
    }

    /// End of the last effective interval on this track.
    pub fn end_time(&self) -> Sec {
        self.elements
            .iter()
            .map(|e| e.effective_end())
            .fold(0.0, Sec::max)
    }

    pub fn element(&self, id: ElementId) -> Option<&TimelineElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut TimelineElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// First element whose effective interval intersects `[start, end)`,
    /// excluding `exclude`. Touching endpoints are not a conflict.
    pub fn conflicting_element(
        &self,
        start: Sec,
        end: Sec,
        exclude: Option<ElementId>,
    ) -> Option<ElementId> {
        self.elements
            .iter()
            .filter(|e| Some(e.id) != exclude)
            .find(|e| {
                let (other_start, other_end) = e.effective_interval();
                start < other_end && end > other_start
            })
            .map(|e| e.id)
    }

    /// At-rest invariant: effective intervals are pairwise disjoint.
    pub fn has_overlaps(&self) -> bool {
        let mut sorted: Vec<&TimelineElement> = self.elements.iter().collect();
        sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        sorted
            .windows(2)
            .any(|pair| pair[0].effective_end() > pair[1].start_time)
    }

    pub(crate) fn sort_elements(&mut self) {
        self.elements
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }
}

/// Display/paint ordering: audio tracks always at the bottom, the main
/// track just above audio, everything else in insertion order.
pub fn sorted_track_indices(tracks: &[Track]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..tracks.len()).collect();
    indices.sort_by_key(|&i| {
        let t = &tracks[i];
        let class = if t.kind == TrackKind::Audio {
            2
        } else if t.is_main {
            1
        } else {
            0
        };
        (class, i)
    });
    indices
}
