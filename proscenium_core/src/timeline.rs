// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timelines: the clocks that drive alpha sources.
//!
//! A [`Timeline`] does not read any system clock. The host advances it by
//! explicit deltas, typically once per frame, through
//! [`Stage::advance_timeline`](crate::stage::Stage::advance_timeline), which
//! also pushes the new progress into every alpha source bound to it.

use core::fmt;
use core::time::Duration;

use crate::arena::Key;

/// A handle to a timeline in a [`Stage`](crate::stage::Stage).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineId(pub(crate) Key);

impl fmt::Debug for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimelineId({}@gen{})", self.0.idx, self.0.generation)
    }
}

/// Direction in which progress moves as time elapses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Progress goes from 0.0 to 1.0.
    #[default]
    Forward,
    /// Progress goes from 1.0 to 0.0.
    Backward,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

/// Configuration for a [`Timeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Length of one pass.
    pub duration: Duration,
    /// Whether the timeline starts over after each pass instead of stopping.
    pub loop_mode: bool,
    /// Direction of the first pass.
    pub direction: Direction,
    /// Whether a looping timeline flips its direction at the end of every
    /// pass. Ignored when `loop_mode` is off.
    pub auto_reverse: bool,
}

impl TimelineConfig {
    /// A single forward pass of `duration`.
    #[must_use]
    pub const fn once(duration: Duration) -> Self {
        Self {
            duration,
            loop_mode: false,
            direction: Direction::Forward,
            auto_reverse: false,
        }
    }

    /// Forward passes of `duration`, repeated forever.
    #[must_use]
    pub const fn looping(duration: Duration) -> Self {
        Self {
            duration,
            loop_mode: true,
            direction: Direction::Forward,
            auto_reverse: false,
        }
    }

    /// Alternating forward and backward passes of `duration`, forever.
    #[must_use]
    pub const fn ping_pong(duration: Duration) -> Self {
        Self {
            duration,
            loop_mode: true,
            direction: Direction::Forward,
            auto_reverse: true,
        }
    }
}

/// A clock measuring progress through a fixed duration.
///
/// A new timeline is stopped at the start of its first pass. It only moves
/// while playing, see [`start`](Self::start).
#[derive(Clone, Debug)]
pub struct Timeline {
    config: TimelineConfig,
    /// Time into the current pass, always `<= config.duration`.
    elapsed: Duration,
    /// Direction of the current pass.
    direction: Direction,
    playing: bool,
    complete: bool,
}

impl Timeline {
    /// Creates a stopped timeline.
    #[must_use]
    pub const fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            elapsed: Duration::ZERO,
            direction: config.direction,
            playing: false,
            complete: false,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Returns the time elapsed in the current pass.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the direction of the current pass.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the timeline advances on [`advance`](Self::advance).
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a non-looping timeline has reached the end of its pass.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Starts or resumes playback. A completed timeline is rewound first.
    pub fn start(&mut self) {
        if self.complete {
            self.rewind();
        }
        self.playing = true;
    }

    /// Pauses playback, keeping the current position.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Pauses playback and rewinds.
    pub fn stop(&mut self) {
        self.playing = false;
        self.rewind();
    }

    /// Returns to the start of the first pass.
    pub fn rewind(&mut self) {
        self.elapsed = Duration::ZERO;
        self.direction = self.config.direction;
        self.complete = false;
    }

    /// Progress through the current pass, 0.0 to 1.0, taking direction into
    /// account.
    ///
    /// A zero-length timeline is always at 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        let forward = if self.config.duration.is_zero() {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.config.duration.as_secs_f64()
        };
        match self.direction {
            Direction::Forward => forward,
            Direction::Backward => 1.0 - forward,
        }
    }

    /// Advances by `dt` and returns the new progress.
    ///
    /// Does nothing while paused. A non-looping timeline stops at the end of
    /// its pass and reports [`is_complete`](Self::is_complete). A looping one
    /// wraps, possibly across several passes for a large `dt`, flipping
    /// direction on each wrap when auto-reverse is on.
    pub fn advance(&mut self, dt: Duration) -> f64 {
        if !self.playing {
            return self.progress();
        }

        let duration = self.config.duration;
        let total = self.elapsed.saturating_add(dt);
        if total < duration {
            self.elapsed = total;
            return self.progress();
        }

        if !self.config.loop_mode || duration.is_zero() {
            self.elapsed = duration;
            if !self.config.loop_mode {
                self.complete = true;
                self.playing = false;
                log::debug!("timeline completed after {duration:?}");
            }
            return self.progress();
        }

        let passes = total.as_nanos() / duration.as_nanos();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "remainder is smaller than the duration, which fits in u64 nanoseconds"
        )]
        let rem = (total.as_nanos() % duration.as_nanos()) as u64;
        self.elapsed = Duration::from_nanos(rem);
        if self.config.auto_reverse && passes % 2 == 1 {
            self.direction = self.direction.reversed();
        }
        self.progress()
    }
}
