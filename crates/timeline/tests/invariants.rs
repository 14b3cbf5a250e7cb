//! Cross-operation invariant checks: whatever sequence of edits runs,
//! tracks stay overlap-free at rest and derived values stay consistent.

use timeline::{
    snap_time_to_frame, ElementId, ElementSpec, MediaId, MediaKind, MediaSource, Sec, Timeline,
    TrackId, TrackKind,
};

struct Library {
    video: MediaId,
    audio: MediaId,
}

impl MediaSource for Library {
    fn media_kind(&self, id: MediaId) -> Option<MediaKind> {
        if id == self.video {
            Some(MediaKind::Video)
        } else if id == self.audio {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    fn media_duration(&self, id: MediaId) -> Option<Sec> {
        self.media_kind(id).map(|_| 12.0)
    }
}

fn assert_no_overlaps(timeline: &Timeline) {
    for track in timeline.tracks() {
        assert!(
            !track.has_overlaps(),
            "track {} violates the non-overlap invariant",
            track.id
        );
    }
}

#[test]
fn edit_sequence_keeps_tracks_disjoint() {
    let library = Library {
        video: MediaId::new(),
        audio: MediaId::new(),
    };
    let mut timeline = Timeline::new();
    let track = timeline.add_track(TrackKind::Media);

    let a = timeline
        .add_element_to_track(track, ElementSpec::media("a", library.video, 0.0, 4.0))
        .unwrap();
    let b = timeline
        .add_element_to_track(track, ElementSpec::media("b", library.video, 6.0, 4.0))
        .unwrap();
    assert_no_overlaps(&timeline);

    let right = timeline.split_element(track, a, 2.0).unwrap();
    assert_no_overlaps(&timeline);

    timeline.move_element(track, right, 4.0).unwrap();
    assert_no_overlaps(&timeline);

    timeline
        .remove_element_from_track_with_ripple(track, b)
        .unwrap();
    assert_no_overlaps(&timeline);

    timeline.separate_audio(track, a, &library).unwrap();
    assert_no_overlaps(&timeline);

    timeline.duplicate_element(track, right).unwrap();
    assert_no_overlaps(&timeline);
}

#[test]
fn rejected_operations_change_nothing() {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(TrackKind::Media);
    timeline
        .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 5.0))
        .unwrap();
    let b = timeline
        .add_element_to_track(track, ElementSpec::media("b", MediaId::new(), 5.0, 5.0))
        .unwrap();
    let snapshot = timeline.tracks().to_vec();

    assert!(timeline.move_element(track, b, 1.0).is_err());
    assert!(timeline
        .add_element_to_track(track, ElementSpec::media("c", MediaId::new(), 2.0, 2.0))
        .is_err());
    assert!(timeline.split_element(track, b, 5.0).is_err());
    assert_eq!(timeline.tracks(), &snapshot[..]);
}

#[test]
fn ripple_delete_gap_preservation_across_many_elements() {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(TrackKind::Media);
    let mut ids = Vec::new();
    // Elements at 0, 3, 7, 12 with effective duration 2 each.
    for start in [0.0, 3.0, 7.0, 12.0] {
        ids.push(
            timeline
                .add_element_to_track(
                    track,
                    ElementSpec::media("e", MediaId::new(), start, 2.0),
                )
                .unwrap(),
        );
    }
    let gaps_before: Vec<Sec> = pair_gaps(&timeline, track, &[ids[0], ids[2], ids[3]]);

    timeline
        .remove_element_from_track_with_ripple(track, ids[1])
        .unwrap();

    let gaps_after: Vec<Sec> = pair_gaps(&timeline, track, &[ids[0], ids[2], ids[3]]);
    // The gap spanning the removed element shrinks by its effective
    // duration; gaps between surviving neighbours are untouched.
    assert_eq!(gaps_after[1], gaps_before[1]);
    assert_no_overlaps(&timeline);
}

fn pair_gaps(timeline: &Timeline, track: TrackId, ids: &[ElementId]) -> Vec<Sec> {
    let track = timeline.track(track).unwrap();
    ids.windows(2)
        .map(|pair| {
            let prev = track.element(pair[0]).unwrap();
            let next = track.element(pair[1]).unwrap();
            next.start_time - prev.effective_end()
        })
        .collect()
}

#[test]
fn total_duration_is_a_projection_of_track_ends() {
    let mut timeline = Timeline::new();
    assert_eq!(timeline.total_duration(), 0.0);

    let media = timeline.add_track(TrackKind::Media);
    let text = timeline.add_track(TrackKind::Text);
    timeline
        .add_element_to_track(media, ElementSpec::media("a", MediaId::new(), 0.0, 5.0))
        .unwrap();
    assert_eq!(timeline.total_duration(), 5.0);

    let t = timeline
        .add_element_to_track(text, ElementSpec::text("t", "title", 4.0))
        .unwrap();
    assert_eq!(timeline.total_duration(), 9.0);

    timeline.remove_element_from_track(text, t).unwrap();
    assert_eq!(timeline.total_duration(), 5.0);
}

#[test]
fn undo_restores_the_exact_previous_track_state() {
    let mut timeline = Timeline::new();
    let track = timeline.add_track(TrackKind::Media);
    let a = timeline
        .add_element_to_track(track, ElementSpec::media("a", MediaId::new(), 0.0, 6.0))
        .unwrap();
    let before = timeline.tracks().to_vec();

    timeline.split_element(track, a, 3.0).unwrap();
    assert_ne!(timeline.tracks(), &before[..]);

    timeline.undo().unwrap();
    assert_eq!(timeline.tracks(), &before[..]);
}

#[test]
fn frame_quantization_composes_with_editing() {
    let fps = 30.0;
    let mut timeline = Timeline::new();
    let track = timeline.add_track(TrackKind::Media);
    let quantized = snap_time_to_frame(1.2345, fps);
    let a = timeline
        .add_element_to_track(
            track,
            ElementSpec::media("a", MediaId::new(), quantized, 5.0),
        )
        .unwrap();
    let element = timeline.track(track).unwrap().element(a).unwrap();
    assert_eq!(element.start_time, snap_time_to_frame(element.start_time, fps));
}
