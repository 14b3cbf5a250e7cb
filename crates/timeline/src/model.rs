use serde::{Deserialize, Serialize};

use crate::{
    ElementId, MediaId, Sec, TimelineElement, Track, TrackId, TrackKind,
};

/// A selected element, identified by its owning track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SelectionRef {
    pub track_id: TrackId,
    pub element_id: ElementId,
}

/// Transient state of an in-progress element drag. Preview only: the
/// committed track state is untouched until the drop lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub element_id: ElementId,
    pub track_id: TrackId,
    pub start_mouse_x: f32,
    pub start_element_time: Sec,
    pub click_offset_time: Sec,
    pub current_time: Sec,
}

/// Canonical timeline state: tracks, selection and drag preview. Track
/// and element vectors are private; mutation goes through the edit
/// operations in `ops.rs` so the non-overlap invariant holds at rest.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub(crate) tracks: Vec<Track>,
    #[serde(skip)]
    pub(crate) selection: Vec<SelectionRef>,
    #[serde(skip)]
    pub(crate) drag: Option<DragState>,
    #[serde(skip)]
    pub(crate) history: crate::history::EditHistory,
    #[serde(default)]
    pub(crate) ripple_editing: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub(crate) fn track_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn track_index(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Locate an element anywhere on the timeline.
    pub fn find_element(&self, id: ElementId) -> Option<(TrackId, &TimelineElement)> {
        self.tracks.iter().find_map(|t| {
            t.element(id).map(|e| (t.id, e))
        })
    }

    /// Maximum track end time; a cached projection, never independently
    /// mutable truth.
    pub fn total_duration(&self) -> Sec {
        self.tracks
            .iter()
            .map(|t| t.end_time())
            .fold(0.0, Sec::max)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.elements.is_empty())
    }

    pub fn element_count(&self) -> usize {
        self.tracks.iter().map(|t| t.elements.len()).sum()
    }

    // --- selection ---

    pub fn selection(&self) -> &[SelectionRef] {
        &self.selection
    }

    pub fn is_selected(&self, track_id: TrackId, element_id: ElementId) -> bool {
        self.selection
            .iter()
            .any(|s| s.track_id == track_id && s.element_id == element_id)
    }

    /// Single select replaces the selection; multi select toggles
    /// membership.
    pub fn select_element(&mut self, track_id: TrackId, element_id: ElementId, multi: bool) {
        let entry = SelectionRef {
            track_id,
            element_id,
        };
        if multi {
            if let Some(pos) = self.selection.iter().position(|s| *s == entry) {
                self.selection.remove(pos);
            } else {
                self.selection.push(entry);
            }
        } else {
            self.selection = vec![entry];
        }
    }

    pub fn deselect_element(&mut self, track_id: TrackId, element_id: ElementId) {
        self.selection
            .retain(|s| !(s.track_id == track_id && s.element_id == element_id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn set_selection(&mut self, selection: Vec<SelectionRef>) {
        self.selection = selection;
    }

    /// Drop selection entries whose track or element no longer exists.
    pub(crate) fn prune_selection(&mut self) {
        let tracks = &self.tracks;
        self.selection.retain(|s| {
            tracks
                .iter()
                .any(|t| t.id == s.track_id && t.element(s.element_id).is_some())
        });
    }

    // --- drag preview ---

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn start_drag(
        &mut self,
        element_id: ElementId,
        track_id: TrackId,
        start_mouse_x: f32,
        start_element_time: Sec,
        click_offset_time: Sec,
    ) {
        self.drag = Some(DragState {
            element_id,
            track_id,
            start_mouse_x,
            start_element_time,
            click_offset_time,
            current_time: start_element_time,
        });
    }

    pub fn update_drag_time(&mut self, current_time: Sec) {
        if let Some(drag) = self.drag.as_mut() {
            drag.current_time = current_time;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    // --- ripple toggle ---

    pub fn ripple_editing(&self) -> bool {
        self.ripple_editing
    }

    pub fn set_ripple_editing(&mut self, enabled: bool) {
        self.ripple_editing = enabled;
    }

    // --- collaborator entry points ---

    /// Deletion-cascade entry point invoked by the media store after it
    /// removes an item: drops every referencing element and collapses
    /// non-main tracks left empty.
    pub fn purge_media(&mut self, media_id: MediaId) -> usize {
        let referencing: usize = self
            .tracks
            .iter()
            .map(|t| {
                t.elements
                    .iter()
                    .filter(|e| e.media_id() == Some(media_id))
                    .count()
            })
            .sum();
        if referencing == 0 {
            // Nothing to drop; no history snapshot either.
            return 0;
        }
        self.push_history();
        for track in &mut self.tracks {
            track
                .elements
                .retain(|e| e.media_id() != Some(media_id));
        }
        self.collapse_empty_tracks();
        self.prune_selection();
        referencing
    }

    pub(crate) fn collapse_empty_tracks(&mut self) {
        self.tracks
            .retain(|t| !t.elements.is_empty() || t.is_main);
    }

    /// Guarantee a main media track exists, as the first track.
    pub fn ensure_main_track(&mut self) -> TrackId {
        if let Some(track) = self.tracks.iter().find(|t| t.is_main) {
            return track.id;
        }
        let mut track = Track::new(TrackKind::Media);
        track.name = "Main Track".to_string();
        track.is_main = true;
        let id = track.id;
        self.tracks.insert(0, track);
        id
    }

    /// Reset to an empty timeline. The caller is responsible for first
    /// stopping playback and tearing down media sync handles.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.selection.clear();
        self.drag = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementSpec;

    #[test]
    fn empty_timeline_has_zero_duration() {
        let timeline = Timeline::new();
        assert_eq!(timeline.total_duration(), 0.0);
    }

    #[test]
    fn duration_tracks_the_longest_track() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 5.0))
            .unwrap();
        assert_eq!(timeline.total_duration(), 5.0);
    }

    #[test]
    fn selection_toggles_under_multi_select() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let el = timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 5.0))
            .unwrap();

        timeline.select_element(track, el, false);
        assert!(timeline.is_selected(track, el));
        timeline.select_element(track, el, true);
        assert!(!timeline.is_selected(track, el));
    }

    #[test]
    fn purge_media_removes_references_and_collapses_tracks() {
        let mut timeline = Timeline::new();
        let media = MediaId::new();
        let keep = MediaId::new();
        let track_a = timeline.add_track(TrackKind::Media);
        let track_b = timeline.add_track(TrackKind::Media);
        timeline
            .add_element_to_track(track_a, ElementSpec::media("a", media, 0.0, 5.0))
            .unwrap();
        timeline
            .add_element_to_track(track_b, ElementSpec::media("b", keep, 0.0, 3.0))
            .unwrap();

        let removed = timeline.purge_media(media);
        assert_eq!(removed, 1);
        assert!(timeline.track(track_a).is_none());
        assert!(timeline.track(track_b).is_some());
    }

    #[test]
    fn purge_of_an_unreferenced_media_id_leaves_history_alone() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 5.0))
            .unwrap();

        assert_eq!(timeline.purge_media(MediaId::new()), 0);

        // The only undoable step is the add itself, not the purge.
        timeline.undo().unwrap();
        assert_eq!(timeline.element_count(), 0);
    }

    #[test]
    fn ensure_main_track_is_idempotent() {
        let mut timeline = Timeline::new();
        let first = timeline.ensure_main_track();
        let second = timeline.ensure_main_track();
        assert_eq!(first, second);
        assert_eq!(timeline.tracks().len(), 1);
    }
}
