//! The playback clock. It owns the derived playback state and advances
//! `current_time` in `tick(elapsed)` steps so any timer source — a
//! display-refresh callback in production, explicit calls in tests —
//! can drive it.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::debug;

use timeline::Sec;

/// Speeds the transport offers; `set_speed` clamps into this range.
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Played,
    Paused,
    /// Emitted on an explicit seek; sync handles must hard-reposition.
    Seeked { time: Sec },
    /// Emitted every tick while playing.
    TimeChanged { time: Sec },
    SpeedChanged { speed: f64 },
    VolumeChanged { volume: f32, muted: bool },
}

#[derive(Debug)]
pub struct PlaybackClock {
    playing: bool,
    current_time: Sec,
    duration: Sec,
    volume: f32,
    muted: bool,
    previous_volume: f32,
    speed: f64,
    subscribers: Vec<Sender<PlaybackEvent>>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            previous_volume: 1.0,
            speed: 1.0,
            subscribers: Vec::new(),
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn current_time(&self) -> Sec {
        self.current_time
    }

    pub fn duration(&self) -> Sec {
        self.duration
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Volume after muting is applied; what media handles should use.
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Register a listener. Events are dropped for receivers that have
    /// gone away.
    pub fn subscribe(&mut self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn play(&mut self) {
        if self.playing || self.duration <= 0.0 {
            return;
        }
        // Replay from the start when the playhead is parked at the end.
        if self.current_time >= self.duration {
            self.current_time = 0.0;
        }
        self.playing = true;
        self.emit(PlaybackEvent::Played);
    }

    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.emit(PlaybackEvent::Paused);
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Advance by wall-clock `elapsed` seconds scaled by speed. Reaching
    /// the end force-pauses exactly at `duration`.
    pub fn tick(&mut self, elapsed: Sec) {
        if !self.playing || elapsed <= 0.0 {
            return;
        }
        let next = self.current_time + elapsed * self.speed;
        if next >= self.duration {
            self.current_time = self.duration;
            self.playing = false;
            self.emit(PlaybackEvent::TimeChanged {
                time: self.duration,
            });
            self.emit(PlaybackEvent::Paused);
            debug!(duration = self.duration, "playback reached the end");
        } else {
            self.current_time = next;
            self.emit(PlaybackEvent::TimeChanged { time: next });
        }
    }

    /// Jump to `time`, clamped into `[0, duration]`.
    pub fn seek(&mut self, time: Sec) {
        let clamped = time.clamp(0.0, self.duration);
        self.current_time = clamped;
        self.emit(PlaybackEvent::Seeked { time: clamped });
    }

    /// Re-sync the cached duration projection after the timeline model
    /// changed; the playhead is pulled back when it fell outside.
    pub fn set_duration(&mut self, duration: Sec) {
        self.duration = duration.max(0.0);
        if self.current_time > self.duration {
            self.current_time = self.duration;
            self.emit(PlaybackEvent::Seeked {
                time: self.duration,
            });
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.volume > 0.0 {
            self.muted = false;
        }
        let (volume, muted) = (self.volume, self.muted);
        self.emit(PlaybackEvent::VolumeChanged { volume, muted });
    }

    pub fn mute(&mut self) {
        if self.muted {
            return;
        }
        self.previous_volume = self.volume;
        self.muted = true;
        let (volume, muted) = (self.volume, self.muted);
        self.emit(PlaybackEvent::VolumeChanged { volume, muted });
    }

    pub fn unmute(&mut self) {
        if !self.muted {
            return;
        }
        self.muted = false;
        self.volume = self.previous_volume;
        let (volume, muted) = (self.volume, self.muted);
        self.emit(PlaybackEvent::VolumeChanged { volume, muted });
    }

    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        let clamped = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.speed = clamped;
        self.emit(PlaybackEvent::SpeedChanged { speed: clamped });
    }

    /// Synchronous stop for project switches: pauses and rewinds without
    /// leaving a running schedule behind.
    pub fn reset(&mut self) {
        self.playing = false;
        self.current_time = 0.0;
        self.duration = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(duration: Sec) -> PlaybackClock {
        let mut clock = PlaybackClock::new();
        clock.set_duration(duration);
        clock
    }

    #[test]
    fn tick_advances_scaled_by_speed() {
        let mut clock = clock(10.0);
        clock.set_speed(2.0);
        clock.play();
        clock.tick(0.5);
        assert_eq!(clock.current_time(), 1.0);
        assert!(clock.is_playing());
    }

    #[test]
    fn reaching_the_end_pauses_exactly_at_duration() {
        let mut clock = clock(1.0);
        clock.play();
        clock.tick(5.0);
        assert_eq!(clock.current_time(), 1.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn seek_clamps_into_bounds() {
        let mut clock = clock(10.0);
        clock.seek(-3.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(99.0);
        assert_eq!(clock.current_time(), 10.0);
    }

    #[test]
    fn duration_shrink_pulls_the_playhead_back() {
        let mut clock = clock(10.0);
        clock.seek(8.0);
        clock.set_duration(5.0);
        assert_eq!(clock.current_time(), 5.0);
    }

    #[test]
    fn play_at_the_end_restarts_from_zero() {
        let mut clock = clock(2.0);
        clock.play();
        clock.tick(3.0);
        assert_eq!(clock.current_time(), 2.0);
        clock.play();
        assert_eq!(clock.current_time(), 0.0);
        assert!(clock.is_playing());
    }

    #[test]
    fn subscribers_receive_seek_and_tick_events() {
        let mut clock = clock(10.0);
        let rx = clock.subscribe();
        clock.play();
        clock.tick(0.1);
        clock.seek(5.0);

        let events: Vec<PlaybackEvent> = rx.try_iter().collect();
        assert!(events.contains(&PlaybackEvent::Played));
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::TimeChanged { .. })));
        assert!(events.contains(&PlaybackEvent::Seeked { time: 5.0 }));
    }

    #[test]
    fn mute_restores_the_previous_volume() {
        let mut clock = clock(10.0);
        clock.set_volume(0.6);
        clock.mute();
        assert_eq!(clock.effective_volume(), 0.0);
        clock.unmute();
        assert_eq!(clock.volume(), 0.6);
    }

    #[test]
    fn speed_is_clamped_to_the_preset_range() {
        let mut clock = clock(10.0);
        clock.set_speed(100.0);
        assert_eq!(clock.speed(), MAX_SPEED);
        clock.set_speed(0.0);
        assert_eq!(clock.speed(), MIN_SPEED);
    }
}
