use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}

/// Result of one advancement step while playing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockUpdate {
    pub cursor: f64,
    /// The step crossed the end of the timeline and the clock stopped.
    pub reached_end: bool,
}

/// Playhead cursor driven by an external frame scheduler.
///
/// The clock never reads a wall clock itself: hosts hand it either elapsed seconds
/// ([`PlaybackClock::advance`]) or raw frame timestamps ([`PlaybackClock::tick`]). The first
/// step after [`PlaybackClock::play`] always moves the cursor by zero so a resume never jumps
/// by the time spent paused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackClock {
    cursor: f64,
    total_length: f64,
    state: PlayState,
    resume_pending: bool,
    last_frame: Option<f64>,
}

impl PlaybackClock {
    #[must_use]
    pub fn new(total_length: f64) -> Self {
        Self {
            total_length,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn set_total_length(&mut self, total_length: f64) {
        self.total_length = total_length;
    }

    #[must_use]
    pub fn state(&self) -> PlayState {
        self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// Starts playing from the current cursor. Returns `false` if already playing.
    pub fn play(&mut self) -> bool {
        if self.is_playing() {
            return false;
        }
        self.state = PlayState::Playing;
        self.resume_pending = true;
        self.last_frame = None;
        true
    }

    /// Returns `false` if already stopped.
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.stop();
        true
    }

    pub fn toggle(&mut self) -> PlayState {
        if self.is_playing() {
            self.stop();
        } else {
            self.play();
        }
        self.state
    }

    /// Moves the cursor by `delta_seconds` while playing.
    ///
    /// Negative or non-finite deltas count as zero. Returns `None` when stopped.
    pub fn advance(&mut self, delta_seconds: f64) -> Option<ClockUpdate> {
        if !self.is_playing() {
            return None;
        }

        let delta = if std::mem::take(&mut self.resume_pending) {
            0.0
        } else if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };

        self.cursor += delta;
        let reached_end = self.cursor >= self.total_length;
        if reached_end {
            self.stop();
        }

        Some(ClockUpdate {
            cursor: self.cursor,
            reached_end,
        })
    }

    /// Advances by the distance between this frame timestamp and the previous one (seconds).
    pub fn tick(&mut self, timestamp_seconds: f64) -> Option<ClockUpdate> {
        if !self.is_playing() {
            return None;
        }

        let delta = self
            .last_frame
            .map_or(0.0, |previous| timestamp_seconds - previous);
        self.last_frame = Some(timestamp_seconds);
        self.advance(delta)
    }

    /// Places the cursor at `time` in either state. NaN is ignored and returns `false`.
    pub fn seek(&mut self, time: f64) -> bool {
        if time.is_nan() {
            return false;
        }
        self.cursor = time;
        true
    }

    fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.resume_pending = false;
        self.last_frame = None;
    }
}
