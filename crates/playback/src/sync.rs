//! Keeps external media handles (decoder sessions, audio sinks) lined up
//! with the playback clock. The scheduler is driven cooperatively: the
//! owner calls [`SyncScheduler::sync`] every tick with the current
//! timeline state and clock readout.

use std::collections::HashMap;

use tracing::{debug, warn};

use timeline::{MediaId, MediaKind, MediaSource, Sec, Timeline, TrackKind};

use crate::PlaybackError;

/// Maximum position error before a handle is hard-repositioned. Small
/// drift is left alone so decoders keep their own cadence.
pub const DRIFT_TOLERANCE: Sec = 0.15;

/// A playable media session owned by the host (audio sink, video
/// decoder). The scheduler only drives transport and position.
pub trait MediaHandle {
    fn play(&mut self);
    fn pause(&mut self);
    fn position(&self) -> Sec;
    fn set_position(&mut self, position: Sec);
    fn set_volume(&mut self, volume: f32);
    fn set_rate(&mut self, rate: f64);
}

/// Opens handles on demand. Failures are logged and the media is skipped
/// for this pass; the next pass retries.
pub trait HandleFactory {
    fn open(&mut self, media: MediaId) -> Result<Box<dyn MediaHandle>, PlaybackError>;
}

/// Snapshot of the clock the scheduler needs for one pass.
#[derive(Debug, Clone, Copy)]
pub struct ClockSnapshot {
    pub playing: bool,
    pub current_time: Sec,
    pub speed: f64,
    /// Master volume after muting, in `[0, 1]`.
    pub volume: f32,
}

struct AudibleElement {
    media: MediaId,
    /// Source-local position the handle should be at right now.
    local_time: Sec,
    /// Master volume scaled by the track's own volume.
    volume: f32,
}

#[derive(Default)]
pub struct SyncScheduler {
    handles: HashMap<MediaId, Box<dyn MediaHandle>>,
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Bring every handle in line with the clock. `force` repositions all
    /// audible handles regardless of drift; pass it after a seek.
    pub fn sync(
        &mut self,
        timeline: &Timeline,
        media: &dyn MediaSource,
        clock: ClockSnapshot,
        factory: &mut dyn HandleFactory,
        force: bool,
    ) {
        let audible = audible_elements(timeline, media, clock);

        for entry in &audible {
            if !self.handles.contains_key(&entry.media) {
                match factory.open(entry.media) {
                    Ok(handle) => {
                        self.handles.insert(entry.media, handle);
                    }
                    Err(err) => {
                        warn!(media = %entry.media, error = %err, "skipping media handle");
                        continue;
                    }
                }
            }
            let Some(handle) = self.handles.get_mut(&entry.media) else {
                continue;
            };
            let drift = (handle.position() - entry.local_time).abs();
            if force || drift > DRIFT_TOLERANCE {
                debug!(media = %entry.media, drift, "repositioning media handle");
                handle.set_position(entry.local_time);
            }
            handle.set_volume(entry.volume);
            handle.set_rate(clock.speed);
            if clock.playing {
                handle.play();
            } else {
                handle.pause();
            }
        }

        // Everything outside the audible set stays open but silent, so a
        // playhead crossing back into the element resumes instantly.
        for (id, handle) in &mut self.handles {
            if !audible.iter().any(|e| e.media == *id) {
                handle.pause();
            }
        }
    }

    /// Drop every handle; used on project switch and media removal.
    pub fn teardown(&mut self) {
        self.handles.clear();
    }

    /// Drop the handle for one media item after it left the library.
    pub fn release(&mut self, media: MediaId) {
        self.handles.remove(&media);
    }
}

/// The audible set: audio or video elements active under the playhead,
/// not hidden, with neither the element nor its track muted.
fn audible_elements(
    timeline: &Timeline,
    media: &dyn MediaSource,
    clock: ClockSnapshot,
) -> Vec<AudibleElement> {
    let mut out = Vec::new();
    for track in timeline.tracks() {
        if track.muted || track.kind == TrackKind::Text {
            continue;
        }
        for element in &track.elements {
            if element.hidden || element.muted || !element.is_active_at(clock.current_time) {
                continue;
            }
            let Some(media_id) = element.media_id() else {
                continue;
            };
            match media.media_kind(media_id) {
                Some(MediaKind::Audio) | Some(MediaKind::Video) => {}
                _ => continue,
            }
            // Several elements can reference one media item; the first
            // active one in track order drives the shared handle.
            if out.iter().any(|e: &AudibleElement| e.media == media_id) {
                continue;
            }
            out.push(AudibleElement {
                media: media_id,
                local_time: element.local_time(clock.current_time),
                volume: clock.volume * track.volume,
            });
        }
    }
    out
}
