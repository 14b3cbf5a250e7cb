use serde::{Deserialize, Serialize};

use crate::Sec;

pub fn time_to_frame(time: Sec, fps: f64) -> i64 {
    (time * fps).round() as i64
}

pub fn frame_to_time(frame: i64, fps: f64) -> Sec {
    frame as Sec / fps
}

/// Quantize a time to the nearest exact frame boundary. Applied as the
/// unconditional last step of snapping so persisted times are always
/// frame-aligned. Idempotent.
pub fn snap_time_to_frame(time: Sec, fps: f64) -> Sec {
    if fps <= 0.0 {
        return time;
    }
    frame_to_time(time_to_frame(time, fps), fps)
}

pub fn frame_duration(fps: f64) -> Sec {
    1.0 / fps
}

/// Display formats for the time ruler and toolbar readouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimecodeFormat {
    /// MM:SS
    MinutesSeconds,
    /// HH:MM:SS
    HoursMinutesSeconds,
    /// HH:MM:SS:CS (centiseconds)
    Centiseconds,
    /// HH:MM:SS:FF (frames)
    Frames,
}

impl Default for TimecodeFormat {
    fn default() -> Self {
        Self::Centiseconds
    }
}

pub fn format_timecode(time: Sec, format: TimecodeFormat, fps: f64) -> String {
    let time = time.max(0.0);
    let hours = (time / 3600.0).floor() as u64;
    let minutes = ((time % 3600.0) / 60.0).floor() as u64;
    let seconds = (time % 60.0).floor() as u64;
    let fraction = time % 1.0;

    match format {
        TimecodeFormat::MinutesSeconds => format!("{minutes:02}:{seconds:02}"),
        TimecodeFormat::HoursMinutesSeconds => {
            format!("{hours:02}:{minutes:02}:{seconds:02}")
        }
        TimecodeFormat::Centiseconds => {
            let cs = (fraction * 100.0).floor() as u64;
            format!("{hours:02}:{minutes:02}:{seconds:02}:{cs:02}")
        }
        TimecodeFormat::Frames => {
            let frames = (fraction * fps).floor() as u64;
            format!("{hours:02}:{minutes:02}:{seconds:02}:{frames:02}")
        }
    }
}
