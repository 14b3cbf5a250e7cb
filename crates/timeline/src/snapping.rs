//! Snap candidate collection and resolution for drags and drops.
//!
//! Thresholds are screen-space: a pixel distance converted to seconds
//! through the current zoom factor, so snapping feels the same at every
//! zoom level. Whatever happens, the final time is quantized to the
//! nearest frame boundary so committed times stay frame-aligned.

use serde::{Deserialize, Serialize};

use crate::{snap_time_to_frame, ElementId, Sec, Timeline, TrackId};

/// Horizontal scale of the timeline at zoom 1.0.
pub const PIXELS_PER_SECOND: f32 = 50.0;
/// Default pixel distance within which a snap point attracts an edge.
pub const SNAP_THRESHOLD_PX: f32 = 10.0;
/// Zoom factors the timeline UI offers.
pub const ZOOM_LEVELS: [f32; 7] = [0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapTarget {
    ElementStart {
        track_id: TrackId,
        element_id: ElementId,
    },
    ElementEnd {
        track_id: TrackId,
        element_id: ElementId,
    },
    Playhead,
    TimelineStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub time: Sec,
    pub target: SnapTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Frame-aligned time the dragged element's start should take.
    pub time: Sec,
    /// The point that attracted it, if any was within the threshold.
    pub point: Option<SnapPoint>,
    /// Distance to that point in seconds.
    pub distance: Sec,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapResolver {
    pub enabled: bool,
    pub threshold_px: f32,
    pub snap_to_elements: bool,
    pub snap_to_playhead: bool,
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold_px: SNAP_THRESHOLD_PX,
            snap_to_elements: true,
            snap_to_playhead: true,
        }
    }
}

impl SnapResolver {
    /// Every candidate a moving element can be attracted to: other
    /// elements' edges on any track, the playhead, and time zero.
    pub fn collect_snap_points(
        &self,
        timeline: &Timeline,
        playhead: Sec,
        exclude: Option<ElementId>,
    ) -> Vec<SnapPoint> {
        let mut points = Vec::new();
        if self.snap_to_elements {
            for track in timeline.tracks() {
                for element in &track.elements {
                    if Some(element.id) == exclude {
                        continue;
                    }
                    points.push(SnapPoint {
                        time: element.start_time,
                        target: SnapTarget::ElementStart {
                            track_id: track.id,
                            element_id: element.id,
                        },
                    });
                    points.push(SnapPoint {
                        time: element.effective_end(),
                        target: SnapTarget::ElementEnd {
                            track_id: track.id,
                            element_id: element.id,
                        },
                    });
                }
            }
        }
        if self.snap_to_playhead {
            points.push(SnapPoint {
                time: playhead,
                target: SnapTarget::Playhead,
            });
        }
        points.push(SnapPoint {
            time: 0.0,
            target: SnapTarget::TimelineStart,
        });
        points
    }

    fn nearest(&self, target_time: Sec, points: &[SnapPoint], zoom: f32) -> (Option<SnapPoint>, Sec) {
        let threshold = self.threshold_seconds(zoom);
        let mut best: Option<SnapPoint> = None;
        let mut best_distance = Sec::INFINITY;
        for point in points {
            let distance = (target_time - point.time).abs();
            if distance < threshold && distance < best_distance {
                best_distance = distance;
                best = Some(*point);
            }
        }
        (best, best_distance)
    }

    pub fn threshold_seconds(&self, zoom: f32) -> Sec {
        (self.threshold_px / (PIXELS_PER_SECOND * zoom)) as Sec
    }

    /// Resolve the start time of an element being dragged or dropped.
    ///
    /// Both the leading edge (`candidate_start`) and the trailing edge
    /// (`candidate_start + duration`) are tried against every snap
    /// point; the closer of the two wins. The result is always quantized
    /// to the project frame rate, snap hit or not.
    pub fn resolve(
        &self,
        candidate_start: Sec,
        element_duration: Sec,
        timeline: &Timeline,
        playhead: Sec,
        zoom: f32,
        fps: f64,
        exclude: Option<ElementId>,
    ) -> SnapResult {
        if !self.enabled {
            return SnapResult {
                time: snap_time_to_frame(candidate_start, fps).max(0.0),
                point: None,
                distance: Sec::INFINITY,
            };
        }

        let points = self.collect_snap_points(timeline, playhead, exclude);
        let (leading, leading_distance) = self.nearest(candidate_start, &points, zoom);
        let (trailing, trailing_distance) =
            self.nearest(candidate_start + element_duration, &points, zoom);

        let (snapped, point, distance) = match (leading, trailing) {
            (Some(lead), Some(trail)) => {
                if trailing_distance < leading_distance {
                    (trail.time - element_duration, Some(trail), trailing_distance)
                } else {
                    (lead.time, Some(lead), leading_distance)
                }
            }
            (Some(lead), None) => (lead.time, Some(lead), leading_distance),
            (None, Some(trail)) => (
                trail.time - element_duration,
                Some(trail),
                trailing_distance,
            ),
            (None, None) => (candidate_start, None, Sec::INFINITY),
        };

        SnapResult {
            time: snap_time_to_frame(snapped, fps).max(0.0),
            point,
            distance,
        }
    }
}
