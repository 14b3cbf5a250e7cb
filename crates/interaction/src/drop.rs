//! Drops onto the timeline surface: media library items, new text
//! elements, and repositioned timeline elements. The payload tag keeps
//! the two channels apart so a track's drop handler can tell a brand-new
//! insertion from a move. The vertical pointer position picks an
//! existing track, a gap between tracks, or the space below; the
//! horizontal position goes through the same snap resolution as drags.

use serde::{Deserialize, Serialize};
use tracing::debug;

use timeline::{
    ElementId, ElementSpec, MediaId, MediaKind, MediaSource, Sec, SnapResolver, Timeline,
    TimelineError, TrackId, TrackKind, DEFAULT_TEXT_DURATION,
};

use crate::View;

/// Band near a track edge (px) that counts as "between tracks".
pub const TRACK_EDGE_MARGIN_PX: f32 = 6.0;

/// Track row heights in pixels, by kind.
pub fn track_height(kind: TrackKind) -> f32 {
    match kind {
        TrackKind::Media => 65.0,
        TrackKind::Text => 25.0,
        TrackKind::Audio => 50.0,
    }
}

/// What is being carried by a drag over the timeline, serialized into
/// the drag event's data transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragPayload {
    /// A library item becoming a new element.
    Media { media_id: MediaId, name: String },
    /// A new text element.
    Text { name: String, content: String },
    /// An existing element being repositioned.
    ElementMove {
        element_id: ElementId,
        track_id: TrackId,
        click_offset_time: Sec,
    },
}

/// Where a drop at a given y coordinate lands, in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropZone {
    /// Inside an existing track's band.
    OnTrack(TrackId),
    /// In the edge margin above a track; a new track is inserted there.
    AboveTrack(TrackId),
    /// Below every track; a new track is appended.
    NewTrackBelow,
}

/// Classify `y_px` against the tracks as displayed (audio at the bottom,
/// main just above audio).
pub fn classify_drop_zone(timeline: &Timeline, y_px: f32) -> DropZone {
    let tracks = timeline.tracks();
    let order = timeline::sorted_track_indices(tracks);
    let mut top = 0.0f32;
    for (display_pos, &index) in order.iter().enumerate() {
        let track = &tracks[index];
        let bottom = top + track_height(track.kind);
        if y_px < top + TRACK_EDGE_MARGIN_PX && y_px >= top - TRACK_EDGE_MARGIN_PX {
            return DropZone::AboveTrack(track.id);
        }
        if y_px >= top && y_px < bottom - TRACK_EDGE_MARGIN_PX {
            return DropZone::OnTrack(track.id);
        }
        if y_px >= bottom - TRACK_EDGE_MARGIN_PX && y_px < bottom {
            // Bottom margin of one band is the top margin of the next.
            return match order.get(display_pos + 1) {
                Some(&next) => DropZone::AboveTrack(tracks[next].id),
                None => DropZone::NewTrackBelow,
            };
        }
        top = bottom;
    }
    DropZone::NewTrackBelow
}

/// Track kind that should host a payload.
fn payload_track_kind(
    payload: &DragPayload,
    timeline: &Timeline,
    media: &dyn MediaSource,
) -> TrackKind {
    let media_kind = |id: MediaId| match media.media_kind(id) {
        Some(MediaKind::Audio) => TrackKind::Audio,
        _ => TrackKind::Media,
    };
    match payload {
        DragPayload::Text { .. } => TrackKind::Text,
        DragPayload::Media { media_id, .. } => media_kind(*media_id),
        DragPayload::ElementMove { element_id, .. } => {
            match timeline.find_element(*element_id).map(|(_, e)| e.media_id()) {
                Some(Some(media_id)) => media_kind(media_id),
                _ => TrackKind::Text,
            }
        }
    }
}

fn accepts(track_kind: TrackKind, wanted: TrackKind) -> bool {
    track_kind == wanted || (track_kind == TrackKind::Audio && wanted == TrackKind::Media)
}

/// Land a drop. The target is the track under the pointer when it
/// accepts the payload; an edge zone inserts a new track there; anything
/// else creates a track of the right kind. The placement time is
/// snap-resolved and frame-quantized. Overlap at the resolved position is
/// returned to the caller with the committed elements unchanged.
pub fn handle_drop(
    timeline: &mut Timeline,
    media: &dyn MediaSource,
    resolver: &SnapResolver,
    view: View,
    payload: DragPayload,
    x_px: f32,
    y_px: f32,
) -> Result<(TrackId, ElementId), TimelineError> {
    let (duration, exclude, click_offset) = match &payload {
        DragPayload::Text { .. } => (DEFAULT_TEXT_DURATION, None, 0.0),
        DragPayload::Media { media_id, .. } => {
            let duration = media.media_duration(*media_id).ok_or_else(|| {
                TimelineError::Unsupported(format!("unknown media item {media_id}"))
            })?;
            (duration, None, 0.0)
        }
        DragPayload::ElementMove {
            element_id,
            click_offset_time,
            ..
        } => {
            let (_, element) = timeline
                .find_element(*element_id)
                .ok_or(TimelineError::ElementNotFound(*element_id))?;
            (
                element.effective_duration(),
                Some(*element_id),
                *click_offset_time,
            )
        }
    };

    // Reject payloads the edit operation would refuse before any track
    // gets created for them; otherwise a bad drop leaves behind an empty
    // track and a history entry.
    if let DragPayload::Text { content, .. } = &payload {
        if content.is_empty() {
            return Err(TimelineError::Unsupported(
                "text element requires content".to_string(),
            ));
        }
    }
    if duration <= 0.0 {
        return Err(TimelineError::Unsupported(
            "element duration must be positive".to_string(),
        ));
    }

    let raw = (view.time_at(x_px) - click_offset).max(0.0);
    let resolved = resolver.resolve(
        raw,
        duration,
        timeline,
        view.playhead,
        view.zoom,
        view.fps,
        exclude,
    );

    let wanted_kind = payload_track_kind(&payload, timeline, media);
    let target = match classify_drop_zone(timeline, y_px) {
        DropZone::OnTrack(track_id) => {
            let track = timeline
                .track(track_id)
                .ok_or(TimelineError::TrackNotFound(track_id))?;
            if accepts(track.kind, wanted_kind) {
                track_id
            } else {
                debug!(%track_id, "track under drop rejects payload, creating a new track");
                timeline.add_track(wanted_kind)
            }
        }
        DropZone::AboveTrack(track_id) => {
            let index = timeline
                .track_index(track_id)
                .ok_or(TimelineError::TrackNotFound(track_id))?;
            timeline.insert_track_at(wanted_kind, index)
        }
        DropZone::NewTrackBelow => timeline.add_track(wanted_kind),
    };

    match payload {
        DragPayload::Media { media_id, name } => {
            let spec = ElementSpec::media(name, media_id, resolved.time, duration);
            let element = timeline.add_element_to_track(target, spec)?;
            Ok((target, element))
        }
        DragPayload::Text { name, content } => {
            let spec = ElementSpec::text(name, content, resolved.time);
            let element = timeline.add_element_to_track(target, spec)?;
            Ok((target, element))
        }
        DragPayload::ElementMove {
            element_id,
            track_id,
            ..
        } => {
            timeline.move_element_to_track(track_id, target, element_id, resolved.time)?;
            Ok((target, element_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use timeline::PIXELS_PER_SECOND;

    struct Library(HashMap<MediaId, (MediaKind, Sec)>);

    impl MediaSource for Library {
        fn media_kind(&self, id: MediaId) -> Option<MediaKind> {
            self.0.get(&id).map(|(kind, _)| *kind)
        }
        fn media_duration(&self, id: MediaId) -> Option<Sec> {
            self.0.get(&id).map(|(_, duration)| *duration)
        }
    }

    fn view() -> View {
        View {
            zoom: 1.0,
            fps: 30.0,
            playhead: 100.0,
        }
    }

    fn px(time: Sec) -> f32 {
        time as f32 * PIXELS_PER_SECOND
    }

    #[test]
    fn drop_zones_follow_display_order_and_heights() {
        let mut timeline = Timeline::new();
        let media = timeline.add_track(TrackKind::Media);
        let audio = timeline.add_track(TrackKind::Audio);

        // Media band is 0..65, audio sits below at 65..115.
        assert_eq!(classify_drop_zone(&timeline, 2.0), DropZone::AboveTrack(media));
        assert_eq!(classify_drop_zone(&timeline, 30.0), DropZone::OnTrack(media));
        assert_eq!(classify_drop_zone(&timeline, 62.0), DropZone::AboveTrack(audio));
        assert_eq!(classify_drop_zone(&timeline, 90.0), DropZone::OnTrack(audio));
        assert_eq!(classify_drop_zone(&timeline, 112.0), DropZone::NewTrackBelow);
        assert_eq!(classify_drop_zone(&timeline, 300.0), DropZone::NewTrackBelow);
    }

    #[test]
    fn media_drop_lands_on_the_track_under_the_pointer() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let media_id = MediaId::new();
        let library = Library(HashMap::from([(media_id, (MediaKind::Video, 8.0))]));

        let (target, element) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Media {
                media_id,
                name: "clip".to_string(),
            },
            px(3.0),
            30.0,
        )
        .unwrap();

        assert_eq!(target, track);
        let placed = timeline.track(track).unwrap().element(element).unwrap();
        assert_eq!(placed.start_time, 3.0);
        assert_eq!(placed.duration, 8.0);
    }

    #[test]
    fn audio_media_gets_an_audio_track() {
        let mut timeline = Timeline::new();
        timeline.add_track(TrackKind::Media);
        let media_id = MediaId::new();
        let library = Library(HashMap::from([(media_id, (MediaKind::Audio, 30.0))]));

        let (target, _) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Media {
                media_id,
                name: "song".to_string(),
            },
            px(0.0),
            30.0, // over the media track, which cannot host it per kind
        )
        .unwrap();

        assert_eq!(timeline.track(target).unwrap().kind, TrackKind::Audio);
    }

    #[test]
    fn edge_drop_inserts_a_new_track_before_the_existing_one() {
        let mut timeline = Timeline::new();
        let existing = timeline.add_track(TrackKind::Media);
        let media_id = MediaId::new();
        let library = Library(HashMap::from([(media_id, (MediaKind::Video, 4.0))]));

        let (target, _) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Media {
                media_id,
                name: "clip".to_string(),
            },
            px(0.0),
            2.0, // inside the top edge margin
        )
        .unwrap();

        assert_ne!(target, existing);
        assert_eq!(timeline.track_index(target), Some(0));
        assert_eq!(timeline.track_index(existing), Some(1));
    }

    #[test]
    fn text_drop_below_all_tracks_creates_a_text_track() {
        let mut timeline = Timeline::new();
        timeline.add_track(TrackKind::Media);
        let library = Library(HashMap::new());

        let (target, element) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Text {
                name: "title".to_string(),
                content: "Hello".to_string(),
            },
            px(1.0),
            500.0,
        )
        .unwrap();

        let track = timeline.track(target).unwrap();
        assert_eq!(track.kind, TrackKind::Text);
        assert_eq!(
            track.element(element).unwrap().duration,
            DEFAULT_TEXT_DURATION
        );
    }

    #[test]
    fn element_move_payload_repositions_instead_of_inserting() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let media_id = MediaId::new();
        let library = Library(HashMap::from([(media_id, (MediaKind::Video, 4.0))]));
        let element = timeline
            .add_element_to_track(track, ElementSpec::media("clip", media_id, 1.0, 4.0))
            .unwrap();
        let count = timeline.element_count();

        // Grabbed one second into the element.
        let (target, moved) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::ElementMove {
                element_id: element,
                track_id: track,
                click_offset_time: 1.0,
            },
            px(9.0),
            30.0,
        )
        .unwrap();

        assert_eq!((target, moved), (track, element));
        assert_eq!(timeline.element_count(), count);
        assert_eq!(
            timeline.track(track).unwrap().element(element).unwrap().start_time,
            8.0
        );
    }

    #[test]
    fn drop_snaps_to_an_existing_element_edge() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let existing = MediaId::new();
        let dropped = MediaId::new();
        let library = Library(HashMap::from([
            (existing, (MediaKind::Video, 5.0)),
            (dropped, (MediaKind::Video, 4.0)),
        ]));
        timeline
            .add_element_to_track(track, ElementSpec::media("a", existing, 0.0, 5.0))
            .unwrap();

        let (_, element) = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Media {
                media_id: dropped,
                name: "b".to_string(),
            },
            px(5.1),
            30.0,
        )
        .unwrap();

        let placed = timeline.track(track).unwrap().element(element).unwrap();
        assert_eq!(placed.start_time, 5.0);
    }

    #[test]
    fn overlapping_drop_is_rejected_without_element_changes() {
        let mut timeline = Timeline::new();
        let track = timeline.add_track(TrackKind::Media);
        let existing = MediaId::new();
        let dropped = MediaId::new();
        let library = Library(HashMap::from([
            (existing, (MediaKind::Video, 5.0)),
            (dropped, (MediaKind::Video, 4.0)),
        ]));
        timeline
            .add_element_to_track(track, ElementSpec::media("a", existing, 0.0, 5.0))
            .unwrap();
        let before = timeline.element_count();

        let err = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Media {
                media_id: dropped,
                name: "b".to_string(),
            },
            px(2.0),
            30.0,
        )
        .unwrap_err();

        assert!(matches!(err, TimelineError::Overlap { .. }));
        assert_eq!(timeline.element_count(), before);
    }

    #[test]
    fn rejected_drop_leaves_no_stray_track_or_history() {
        let mut timeline = Timeline::new();
        timeline.add_track(TrackKind::Media);
        let library = Library(HashMap::new());
        let tracks_before = timeline.tracks().to_vec();

        let err = handle_drop(
            &mut timeline,
            &library,
            &SnapResolver::default(),
            view(),
            DragPayload::Text {
                name: "title".to_string(),
                content: String::new(),
            },
            px(1.0),
            500.0, // below every track, which would append a text track
        )
        .unwrap_err();

        assert!(matches!(err, TimelineError::Unsupported(_)));
        assert_eq!(timeline.tracks(), &tracks_before[..]);
        assert!(timeline.undo().is_err());
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = DragPayload::Media {
            media_id: MediaId::new(),
            name: "clip".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: DragPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, back);
    }
}
