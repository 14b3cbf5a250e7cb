//! Drag state machine for elements already on the timeline.
//!
//! A press does not start a drag: the pointer must travel past a pixel
//! threshold first, so sloppy clicks still select. While a drag is live
//! only the preview time on the timeline moves; the committed state
//! changes exactly once, on release, through a single edit operation.

use tracing::debug;

use timeline::{ElementId, SnapResolver, Timeline, TimelineError, TrackId, Sec};

use crate::View;

/// Pointer travel (px) below which a press stays a click.
pub const DRAG_THRESHOLD_PX: f32 = 5.0;
/// Window after the press (ms) in which crossing the travel threshold
/// starts a drag; afterwards the press can only end as a click.
pub const DRAG_START_WINDOW_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// The press never became a drag; selection was updated.
    Click {
        track_id: TrackId,
        element_id: ElementId,
    },
    /// The element was committed to a new position.
    Moved {
        track_id: TrackId,
        element_id: ElementId,
        new_start: Sec,
    },
    /// No edit happened: press expired, target invalid, or the state
    /// went stale mid-drag.
    Canceled,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Pressed {
        track_id: TrackId,
        element_id: ElementId,
        down_x: f32,
        down_ms: u64,
        multi: bool,
    },
    Dragging {
        track_id: TrackId,
        element_id: ElementId,
    },
}

pub struct DragController {
    pub resolver: SnapResolver,
    phase: Phase,
}

impl Default for DragController {
    fn default() -> Self {
        Self {
            resolver: SnapResolver::default(),
            phase: Phase::Idle,
        }
    }
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    /// Begin tracking a press on an element. Errors only on stale ids.
    pub fn pointer_down(
        &mut self,
        timeline: &mut Timeline,
        view: View,
        track_id: TrackId,
        element_id: ElementId,
        x_px: f32,
        now_ms: u64,
        multi: bool,
    ) -> Result<(), TimelineError> {
        let track = timeline
            .track(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?;
        let element = track
            .element(element_id)
            .ok_or(TimelineError::ElementNotFound(element_id))?;
        let start_time = element.start_time;
        let click_offset = view.time_at(x_px) - start_time;

        self.phase = Phase::Pressed {
            track_id,
            element_id,
            down_x: x_px,
            down_ms: now_ms,
            multi,
        };
        timeline.start_drag(element_id, track_id, x_px, start_time, click_offset);
        Ok(())
    }

    /// Track pointer motion. Crossing the travel threshold inside the
    /// start window promotes the press to a drag; during a drag only the
    /// preview time updates.
    pub fn pointer_move(&mut self, timeline: &mut Timeline, view: View, x_px: f32, now_ms: u64) {
        if let Phase::Pressed {
            track_id,
            element_id,
            down_x,
            down_ms,
            ..
        } = self.phase
        {
            if (x_px - down_x).abs() >= DRAG_THRESHOLD_PX
                && now_ms.saturating_sub(down_ms) <= DRAG_START_WINDOW_MS
            {
                self.phase = Phase::Dragging {
                    track_id,
                    element_id,
                };
            }
        }
        let Phase::Dragging { element_id, .. } = self.phase else {
            return;
        };
        let Some(drag) = timeline.drag_state().copied() else {
            return;
        };
        let Some((_, element)) = timeline.find_element(element_id) else {
            return;
        };
        let duration = element.effective_duration();

        let raw = (view.time_at(x_px) - drag.click_offset_time).max(0.0);
        let resolved = self.resolver.resolve(
            raw,
            duration,
            timeline,
            view.playhead,
            view.zoom,
            view.fps,
            Some(element_id),
        );
        timeline.update_drag_time(resolved.time);
    }

    /// Release the pointer. `target_track` is the track under the cursor;
    /// `None` keeps the element on its own track. Exactly one committed
    /// edit happens here, or none at all.
    pub fn pointer_up(
        &mut self,
        timeline: &mut Timeline,
        target_track: Option<TrackId>,
    ) -> DragOutcome {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let outcome = match phase {
            Phase::Idle => DragOutcome::Canceled,
            Phase::Pressed {
                track_id,
                element_id,
                multi,
                ..
            } => {
                timeline.select_element(track_id, element_id, multi);
                DragOutcome::Click {
                    track_id,
                    element_id,
                }
            }
            Phase::Dragging {
                track_id,
                element_id,
            } => self.commit(timeline, track_id, element_id, target_track),
        };
        timeline.end_drag();
        outcome
    }

    /// Abort without committing; the preview simply disappears.
    pub fn cancel(&mut self, timeline: &mut Timeline) {
        self.phase = Phase::Idle;
        timeline.end_drag();
    }

    fn commit(
        &self,
        timeline: &mut Timeline,
        track_id: TrackId,
        element_id: ElementId,
        target_track: Option<TrackId>,
    ) -> DragOutcome {
        let Some(drag) = timeline.drag_state().copied() else {
            return DragOutcome::Canceled;
        };
        let new_start = drag.current_time;
        let destination = target_track.unwrap_or(track_id);

        let result = if destination != track_id {
            timeline.move_element_to_track(track_id, destination, element_id, new_start)
        } else if timeline.ripple_editing() {
            timeline.ripple_move_element(track_id, element_id, new_start)
        } else {
            timeline.move_element(track_id, element_id, new_start)
        };

        match result {
            Ok(()) => DragOutcome::Moved {
                track_id: destination,
                element_id,
                new_start,
            },
            Err(err) => {
                debug!(%element_id, %err, "drop rejected, drag canceled");
                DragOutcome::Canceled
            }
        }
    }
}
