//! Atomic edit operations. Each operation validates against the current
//! state before any write, so a failed call leaves the timeline exactly
//! as it was.

use tracing::debug;

use crate::{
    name_with_suffix, ElementId, ElementSpec, MediaKind, MediaSource, Sec,
    TimelineElement, TimelineError, Track, TrackId, TrackKind, Timeline,
};

/// Gap left between an element and its duplicate.
pub const DUPLICATE_EPSILON: Sec = 0.01;

/// Floor for the effective length a trim may leave. Callers normally
/// pass one frame's worth of time; this keeps the length positive even
/// when they pass zero.
pub const MIN_TRIM_LENGTH: Sec = 1e-3;

impl Timeline {
    pub fn add_track(&mut self, kind: TrackKind) -> TrackId {
        self.push_history();
        let track = Track::new(kind);
        let id = track.id;
        self.tracks.push(track);
        id
    }

    pub fn insert_track_at(&mut self, kind: TrackKind, index: usize) -> TrackId {
        self.push_history();
        let track = Track::new(kind);
        let id = track.id;
        let index = index.min(self.tracks.len());
        self.tracks.insert(index, track);
        id
    }

    pub fn remove_track(&mut self, track_id: TrackId) -> Result<(), TimelineError> {
        let index = self
            .track_index(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?;
        self.push_history();
        self.tracks.remove(index);
        self.prune_selection();
        Ok(())
    }

    pub fn toggle_track_mute(&mut self, track_id: TrackId) -> Result<(), TimelineError> {
        self.require_track(track_id)?;
        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        track.muted = !track.muted;
        Ok(())
    }

    pub fn set_track_volume(&mut self, track_id: TrackId, volume: f32) -> Result<(), TimelineError> {
        self.require_track(track_id)?;
        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        track.volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    /// Place a new element. Fails with [`TimelineError::Overlap`] when the
    /// effective interval intersects an existing element on the track;
    /// touching endpoints are allowed.
    pub fn add_element_to_track(
        &mut self,
        track_id: TrackId,
        spec: ElementSpec,
    ) -> Result<ElementId, TimelineError> {
        let track = self.require_track(track_id)?;
        if !track.kind.accepts(&spec.kind) {
            return Err(TimelineError::Unsupported(format!(
                "{:?} track does not accept this element kind",
                track.kind
            )));
        }
        if spec.duration <= 0.0 {
            return Err(TimelineError::Unsupported(
                "element duration must be positive".to_string(),
            ));
        }
        if spec.start_time < 0.0 {
            return Err(TimelineError::Unsupported(
                "element start time must not be negative".to_string(),
            ));
        }
        if let crate::ElementKind::Text { content, .. } = &spec.kind {
            if content.is_empty() {
                return Err(TimelineError::Unsupported(
                    "text element requires content".to_string(),
                ));
            }
        }
        let start = spec.start_time;
        let end = start + spec.duration;
        if let Some(blocking) = track.conflicting_element(start, end, None) {
            debug!(%track_id, %blocking, start, end, "add rejected: overlap");
            return Err(TimelineError::Overlap {
                track: track_id,
                blocking,
                start,
                end,
            });
        }

        self.push_history();
        let id = ElementId::new();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        track.elements.push(spec.into_element(id));
        track.sort_elements();
        Ok(id)
    }

    /// Remove an element, leaving a gap. A non-main track that becomes
    /// empty is collapsed.
    pub fn remove_element_from_track(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<TimelineElement, TimelineError> {
        self.require_element(track_id, element_id)?;
        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let index = track
            .elements
            .iter()
            .position(|e| e.id == element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        let removed = track.elements.remove(index);
        self.collapse_empty_tracks();
        self.prune_selection();
        Ok(removed)
    }

    /// Remove an element and close the gap: every later element on the
    /// same track shifts earlier by the removed effective duration, so
    /// relative gaps between survivors are preserved.
    pub fn remove_element_from_track_with_ripple(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<TimelineElement, TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let removed_start = element.start_time;
        let shift = element.effective_duration();

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let index = track
            .elements
            .iter()
            .position(|e| e.id == element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        let removed = track.elements.remove(index);
        for e in &mut track.elements {
            if e.start_time >= removed_start {
                e.start_time -= shift;
            }
        }
        track.sort_elements();
        self.collapse_empty_tracks();
        self.prune_selection();
        Ok(removed)
    }

    /// Reposition an element on its own track.
    pub fn move_element(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        new_start: Sec,
    ) -> Result<(), TimelineError> {
        let (track, element) = self.require_element(track_id, element_id)?;
        if new_start < 0.0 {
            return Err(TimelineError::Unsupported(
                "element start time must not be negative".to_string(),
            ));
        }
        let end = new_start + element.effective_duration();
        if let Some(blocking) = track.conflicting_element(new_start, end, Some(element_id)) {
            debug!(%track_id, %element_id, %blocking, new_start, "move rejected: overlap");
            return Err(TimelineError::Overlap {
                track: track_id,
                blocking,
                start: new_start,
                end,
            });
        }

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.start_time = new_start;
        track.sort_elements();
        Ok(())
    }

    /// Move an element and shift everything that followed it by the same
    /// delta, keeping downstream spacing intact.
    pub fn ripple_move_element(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        new_start: Sec,
    ) -> Result<(), TimelineError> {
        let (track, element) = self.require_element(track_id, element_id)?;
        if new_start < 0.0 {
            return Err(TimelineError::Unsupported(
                "element start time must not be negative".to_string(),
            ));
        }
        let old_start = element.start_time;
        let old_end = element.effective_end();
        let delta = new_start - old_start;

        // Simulate the whole shift before touching anything.
        let mut preview = track.clone();
        for e in &mut preview.elements {
            if e.id == element_id {
                e.start_time = new_start;
            } else if e.start_time >= old_end {
                e.start_time += delta;
            }
        }
        if preview.elements.iter().any(|e| e.start_time < 0.0) {
            return Err(TimelineError::Unsupported(
                "ripple move would push an element before time zero".to_string(),
            ));
        }
        if preview.has_overlaps() {
            let end = new_start + (old_end - old_start);
            let blocking = preview
                .conflicting_element(new_start, end, Some(element_id))
                .unwrap_or(element_id);
            return Err(TimelineError::Overlap {
                track: track_id,
                blocking,
                start: new_start,
                end,
            });
        }

        self.push_history();
        preview.sort_elements();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        *track = preview;
        Ok(())
    }

    /// Move an element onto another track at a given time.
    pub fn move_element_to_track(
        &mut self,
        from_track_id: TrackId,
        to_track_id: TrackId,
        element_id: ElementId,
        new_start: Sec,
    ) -> Result<(), TimelineError> {
        if from_track_id == to_track_id {
            return self.move_element(from_track_id, element_id, new_start);
        }
        let (_, element) = self.require_element(from_track_id, element_id)?;
        let element = element.clone();
        let to_track = self.require_track(to_track_id)?;
        if new_start < 0.0 {
            return Err(TimelineError::Unsupported(
                "element start time must not be negative".to_string(),
            ));
        }
        if !to_track.kind.accepts(&element.kind) {
            return Err(TimelineError::Unsupported(format!(
                "{:?} track does not accept this element kind",
                to_track.kind
            )));
        }
        let end = new_start + element.effective_duration();
        if let Some(blocking) = to_track.conflicting_element(new_start, end, Some(element_id)) {
            return Err(TimelineError::Overlap {
                track: to_track_id,
                blocking,
                start: new_start,
                end,
            });
        }

        self.push_history();
        let from = self
            .track_mut(from_track_id)
            .ok_or_else(unreachable_track)?;
        let index = from
            .elements
            .iter()
            .position(|e| e.id == element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        let mut moved = from.elements.remove(index);
        moved.start_time = new_start;
        let to = self.track_mut(to_track_id).ok_or_else(unreachable_track)?;
        to.elements.push(moved);
        to.sort_elements();
        self.collapse_empty_tracks();
        Ok(())
    }

    /// Adjust trims, clamping so the effective length never drops below
    /// `min_length` (one frame's worth of time, from the project fps;
    /// floored at [`MIN_TRIM_LENGTH`] so it is always positive).
    /// `start_time` is never changed here.
    pub fn update_element_trim(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        trim_start: Sec,
        trim_end: Sec,
        min_length: Sec,
    ) -> Result<(), TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let min_length = min_length.max(MIN_TRIM_LENGTH).min(element.duration);
        let available = element.duration - min_length;
        let trim_start = trim_start.max(0.0).min(available);
        let trim_end = trim_end.max(0.0).min(available - trim_start);

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.trim_start = trim_start;
        element.trim_end = trim_end;
        Ok(())
    }

    /// Resize by changing the intrinsic duration (text and still-image
    /// elements). The new effective end must not collide.
    pub fn update_element_duration(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        duration: Sec,
    ) -> Result<(), TimelineError> {
        let (track, element) = self.require_element(track_id, element_id)?;
        if duration <= element.trim_start + element.trim_end {
            return Err(TimelineError::Unsupported(
                "duration must exceed the combined trims".to_string(),
            ));
        }
        let start = element.start_time;
        let end = start + (duration - element.trim_start - element.trim_end);
        if let Some(blocking) = track.conflicting_element(start, end, Some(element_id)) {
            return Err(TimelineError::Overlap {
                track: track_id,
                blocking,
                start,
                end,
            });
        }

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.duration = duration;
        Ok(())
    }

    /// Split at `at`, which must be strictly inside the effective
    /// interval. The original keeps its id and becomes the left half;
    /// the returned id is the new right half, referencing the same
    /// media item.
    pub fn split_element(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        at: Sec,
    ) -> Result<ElementId, TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let (start, end) = element.effective_interval();
        if at <= start || at >= end {
            return Err(TimelineError::InvalidSplitPoint { at, start, end });
        }
        let first_duration = at - start;
        let second_duration = element.effective_duration() - first_duration;

        self.push_history();
        let right_id = ElementId::new();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        let mut right = element.clone();
        element.trim_end += second_duration;
        element.name = name_with_suffix(&element.name, "left");
        right.id = right_id;
        right.start_time = at;
        right.trim_start += first_duration;
        right.name = name_with_suffix(&right.name, "right");
        track.elements.push(right);
        track.sort_elements();
        Ok(right_id)
    }

    /// Split and discard the right half.
    pub fn split_and_keep_left(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        at: Sec,
    ) -> Result<(), TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let (start, end) = element.effective_interval();
        if at <= start || at >= end {
            return Err(TimelineError::InvalidSplitPoint { at, start, end });
        }
        let removed = end - at;

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.trim_end += removed;
        element.name = name_with_suffix(&element.name, "left");
        Ok(())
    }

    /// Split and discard the left half.
    pub fn split_and_keep_right(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        at: Sec,
    ) -> Result<(), TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let (start, end) = element.effective_interval();
        if at <= start || at >= end {
            return Err(TimelineError::InvalidSplitPoint { at, start, end });
        }
        let removed = at - start;

        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.start_time = at;
        element.trim_start += removed;
        element.name = name_with_suffix(&element.name, "right");
        Ok(())
    }

    /// Detach the audio of a video-backed element onto an audio track
    /// with the identical effective interval, muting the original's own
    /// audio. Only valid for media elements whose item is a video.
    pub fn separate_audio(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
        media: &dyn MediaSource,
    ) -> Result<ElementId, TimelineError> {
        let (_, element) = self.require_element(track_id, element_id)?;
        let media_id = element.media_id().ok_or_else(|| {
            TimelineError::Unsupported("cannot separate audio from a text element".to_string())
        })?;
        match media.media_kind(media_id) {
            Some(MediaKind::Video) => {}
            _ => {
                return Err(TimelineError::Unsupported(
                    "audio separation requires a video source".to_string(),
                ));
            }
        }
        let (start, end) = element.effective_interval();
        let mut audio = element.clone();

        // First audio track with room; a fresh one when all conflict.
        let target = self
            .tracks
            .iter()
            .find(|t| {
                t.kind == TrackKind::Audio && t.conflicting_element(start, end, None).is_none()
            })
            .map(|t| t.id);

        self.push_history();
        let target = match target {
            Some(id) => id,
            None => {
                let track = Track::new(TrackKind::Audio);
                let id = track.id;
                self.tracks.push(track);
                id
            }
        };
        let audio_id = ElementId::new();
        audio.id = audio_id;
        audio.muted = false;
        audio.name = name_with_suffix(&audio.name, "audio");
        let track = self.track_mut(target).ok_or_else(unreachable_track)?;
        track.elements.push(audio);
        track.sort_elements();
        let source = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        if let Some(original) = source.element_mut(element_id) {
            original.muted = true;
        }
        Ok(audio_id)
    }

    /// Clone an element right after its own effective end. The caller may
    /// retry at another offset on [`TimelineError::Overlap`].
    pub fn duplicate_element(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<ElementId, TimelineError> {
        let (track, element) = self.require_element(track_id, element_id)?;
        let new_start = element.effective_end() + DUPLICATE_EPSILON;
        let end = new_start + element.effective_duration();
        if let Some(blocking) = track.conflicting_element(new_start, end, None) {
            return Err(TimelineError::Overlap {
                track: track_id,
                blocking,
                start: new_start,
                end,
            });
        }
        let mut copy = element.clone();

        self.push_history();
        let copy_id = ElementId::new();
        copy.id = copy_id;
        copy.start_time = new_start;
        copy.name = name_with_suffix(&copy.name, "copy");
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        track.elements.push(copy);
        track.sort_elements();
        Ok(copy_id)
    }

    pub fn toggle_element_hidden(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<(), TimelineError> {
        self.require_element(track_id, element_id)?;
        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.hidden = !element.hidden;
        Ok(())
    }

    pub fn toggle_element_muted(
        &mut self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<(), TimelineError> {
        self.require_element(track_id, element_id)?;
        self.push_history();
        let track = self.track_mut(track_id).ok_or_else(unreachable_track)?;
        let element = track
            .element_mut(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        element.muted = !element.muted;
        Ok(())
    }

    fn require_track(&self, track_id: TrackId) -> Result<&Track, TimelineError> {
        self.track(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))
    }

    fn require_element(
        &self,
        track_id: TrackId,
        element_id: ElementId,
    ) -> Result<(&Track, &TimelineElement), TimelineError> {
        let track = self.require_track(track_id)?;
        let element = track
            .element(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        Ok((track, element))
    }
}

fn unreachable_track() -> TimelineError {
    TimelineError::Invariant("track vanished mid-operation".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementKind, MediaId};

    struct FakeMedia {
        id: MediaId,
        kind: MediaKind,
    }

    impl MediaSource for FakeMedia {
        fn media_kind(&self, id: MediaId) -> Option<MediaKind> {
            (id == self.id).then_some(self.kind)
        }

        fn media_duration(&self, id: MediaId) -> Option<Sec> {
            (id == self.id).then_some(10.0)
        }
    }

    fn timeline_with_clip(start: Sec, duration: Sec) -> (Timeline, TrackId, ElementId) {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let element = timeline
            .add_element_to_track(
                track,
                ElementSpec::media("clip", MediaId::new(), start, duration),
            )
            .unwrap();
        (timeline, track, element)
    }

    #[test]
    fn add_rejects_overlap_and_allows_touching() {
        let (mut timeline, track, _) = timeline_with_clip(0.0, 5.0);
        let err = timeline
            .add_element_to_track(
                track,
                ElementSpec::media("b", MediaId::new(), 4.0, 5.0),
            )
            .unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { .. }));

        // end == start is not an overlap
        timeline
            .add_element_to_track(
                track,
                ElementSpec::media("b", MediaId::new(), 5.0, 5.0),
            )
            .unwrap();
    }

    #[test]
    fn split_produces_the_documented_halves() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        let right = timeline.split_element(track, element, 4.0).unwrap();

        let left = timeline.track(track).unwrap().element(element).unwrap();
        assert_eq!(left.start_time, 0.0);
        assert_eq!(left.duration, 10.0);
        assert_eq!(left.trim_end, 6.0);
        assert_eq!(left.effective_interval(), (0.0, 4.0));

        let right = timeline.track(track).unwrap().element(right).unwrap();
        assert_eq!(right.start_time, 4.0);
        assert_eq!(right.duration, 10.0);
        assert_eq!(right.trim_start, 4.0);
        assert_eq!(right.effective_interval(), (4.0, 10.0));
    }

    #[test]
    fn split_round_trip_preserves_total_effective_duration() {
        let (mut timeline, track, element) = timeline_with_clip(1.0, 8.0);
        timeline
            .update_element_trim(track, element, 0.5, 1.5, 0.1)
            .unwrap();
        let original = timeline
            .track(track)
            .unwrap()
            .element(element)
            .unwrap()
            .effective_duration();
        let right = timeline.split_element(track, element, 3.0).unwrap();
        let track_ref = timeline.track(track).unwrap();
        let sum = track_ref.element(element).unwrap().effective_duration()
            + track_ref.element(right).unwrap().effective_duration();
        assert!((sum - original).abs() < 1e-9);
    }

    #[test]
    fn split_outside_bounds_is_rejected() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        for at in [0.0, 10.0, -1.0, 12.0] {
            let err = timeline.split_element(track, element, at).unwrap_err();
            assert!(matches!(err, TimelineError::InvalidSplitPoint { .. }));
        }
    }

    #[test]
    fn split_and_keep_left_discards_the_tail() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        timeline.split_and_keep_left(track, element, 4.0).unwrap();
        let track_ref = timeline.track(track).unwrap();
        assert_eq!(track_ref.elements.len(), 1);
        assert_eq!(
            track_ref.element(element).unwrap().effective_interval(),
            (0.0, 4.0)
        );
    }

    #[test]
    fn split_and_keep_right_discards_the_head() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        timeline.split_and_keep_right(track, element, 4.0).unwrap();
        let track_ref = timeline.track(track).unwrap();
        assert_eq!(track_ref.elements.len(), 1);
        assert_eq!(
            track_ref.element(element).unwrap().effective_interval(),
            (4.0, 10.0)
        );
    }

    #[test]
    fn move_onto_occupied_range_fails_without_state_change() {
        let (mut timeline, track, first) = timeline_with_clip(0.0, 5.0);
        let second = timeline
            .add_element_to_track(
                track,
                ElementSpec::media("b", MediaId::new(), 8.0, 4.0),
            )
            .unwrap();
        let before = timeline.track(track).unwrap().clone();

        let err = timeline.move_element(track, second, 2.0).unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { blocking, .. } if blocking == first));
        assert_eq!(*timeline.track(track).unwrap(), before);
    }

    #[test]
    fn ripple_delete_preserves_gaps() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let a = timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 2.0))
            .unwrap();
        let b = timeline
            .add_element_to_track(track, ElementSpec::media("b", MediaId::new(), 3.0, 2.0))
            .unwrap();
        let c = timeline
            .add_element_to_track(track, ElementSpec::media("c", MediaId::new(), 7.0, 2.0))
            .unwrap();

        // Gap between b and c is 2.0 before the removal.
        timeline
            .remove_element_from_track_with_ripple(track, b)
            .unwrap();
        let track_ref = timeline.track(track).unwrap();
        let a_end = track_ref.element(a).unwrap().effective_end();
        let c_start = track_ref.element(c).unwrap().start_time;
        assert_eq!(a_end, 2.0);
        assert_eq!(c_start, 5.0); // 7.0 shifted by b's effective 2.0
        assert!(!track_ref.has_overlaps());
    }

    #[test]
    fn plain_remove_leaves_the_gap() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let a = timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 2.0))
            .unwrap();
        let b = timeline
            .add_element_to_track(track, ElementSpec::media("b", MediaId::new(), 3.0, 2.0))
            .unwrap();
        timeline.remove_element_from_track(track, a).unwrap();
        let track_ref = timeline.track(track).unwrap();
        assert_eq!(track_ref.element(b).unwrap().start_time, 3.0);
    }

    #[test]
    fn ripple_move_shifts_following_elements() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let a = timeline
            .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 2.0))
            .unwrap();
        let b = timeline
            .add_element_to_track(track, ElementSpec::media("b", MediaId::new(), 2.0, 2.0))
            .unwrap();
        timeline.ripple_move_element(track, a, 1.0).unwrap();

        let track_ref = timeline.track(track).unwrap();
        assert_eq!(track_ref.element(a).unwrap().start_time, 1.0);
        assert_eq!(track_ref.element(b).unwrap().start_time, 3.0);
        assert!(!track_ref.has_overlaps());
    }

    #[test]
    fn trim_clamps_to_a_positive_minimum_length() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        timeline
            .update_element_trim(track, element, 6.0, 6.0, 1.0 / 30.0)
            .unwrap();
        let e = timeline.track(track).unwrap().element(element).unwrap();
        assert!(e.effective_duration() >= 1.0 / 30.0 - 1e-9);
        assert!(e.effective_duration() > 0.0);
        assert_eq!(e.start_time, 0.0);
    }

    #[test]
    fn trim_with_a_zero_minimum_keeps_a_positive_length() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 10.0);
        timeline
            .update_element_trim(track, element, 6.0, 6.0, 0.0)
            .unwrap();
        let e = timeline.track(track).unwrap().element(element).unwrap();
        assert!(e.effective_duration() > 0.0);
        assert!(e.trim_start + e.trim_end < e.duration);
    }

    #[test]
    fn separate_audio_requires_a_video_source() {
        let mut timeline = Timeline::new();
        let video = FakeMedia {
            id: MediaId::new(),
            kind: MediaKind::Video,
        };
        let track = timeline.add_track(TrackKind::Media);
        let element = timeline
            .add_element_to_track(track, ElementSpec::media("clip", video.id, 1.0, 6.0))
            .unwrap();

        let audio_id = timeline.separate_audio(track, element, &video).unwrap();
        let audio_track = timeline
            .tracks()
            .iter()
            .find(|t| t.kind == TrackKind::Audio)
            .unwrap();
        let audio = audio_track.element(audio_id).unwrap();
        assert_eq!(audio.effective_interval(), (1.0, 7.0));
        assert!(!audio.muted);
        let original = timeline.track(track).unwrap().element(element).unwrap();
        assert!(original.muted);

        let image = FakeMedia {
            id: MediaId::new(),
            kind: MediaKind::Image,
        };
        let track2 = timeline.add_track(TrackKind::Media);
        let still = timeline
            .add_element_to_track(track2, ElementSpec::media("still", image.id, 0.0, 4.0))
            .unwrap();
        let err = timeline.separate_audio(track2, still, &image).unwrap_err();
        assert!(matches!(err, TimelineError::Unsupported(_)));
    }

    #[test]
    fn duplicate_lands_after_the_source() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 5.0);
        let copy = timeline.duplicate_element(track, element).unwrap();
        let track_ref = timeline.track(track).unwrap();
        let copy = track_ref.element(copy).unwrap();
        assert!(copy.start_time > 5.0);
        assert!(!track_ref.has_overlaps());
        assert!(matches!(copy.kind, ElementKind::Media { .. }));
    }

    #[test]
    fn duplicate_fails_when_the_slot_is_taken() {
        let (mut timeline, track, element) = timeline_with_clip(0.0, 5.0);
        timeline
            .add_element_to_track(track, ElementSpec::media("b", MediaId::new(), 5.0, 5.0))
            .unwrap();
        let err = timeline.duplicate_element(track, element).unwrap_err();
        assert!(matches!(err, TimelineError::Overlap { .. }));
    }

    #[test]
    fn unknown_ids_report_stale_reference_errors() {
        let mut timeline = Timeline::new();
        let err = timeline
            .move_element(TrackId::new(), ElementId::new(), 0.0)
            .unwrap_err();
        assert!(err.is_stale_reference());
    }
}
