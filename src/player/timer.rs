//! Presentation timing for still images.
use std::time::{Duration, Instant};

/// Monotonic time source; never wall-clock.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Loop count for a play request: an explicit value wins over the
/// descriptor's repeats, and zero is bumped to one. Anything `<= -1` means
/// "until stopped".
pub fn resolve_loop_count(explicit: Option<i64>, repeats: i64) -> i64 {
    match explicit.unwrap_or(repeats) {
        0 => 1,
        n => n,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Playing { start: Instant },
}

/// Result of [`PlaybackTimer::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Idle,
    Playing,
    /// The display time ran out since the previous poll.
    Expired,
}

#[derive(Debug)]
pub struct PlaybackTimer<C: Clock = MonotonicClock> {
    clock: C,
    duration_per_loop: Duration,
    loop_count: i64,
    state: State,
}

impl<C: Clock> PlaybackTimer<C> {
    pub fn new(clock: C, duration_per_loop: Duration) -> Self {
        Self {
            clock,
            duration_per_loop,
            loop_count: 0,
            state: State::Idle,
        }
    }

    pub fn start(&mut self, loop_count: i64) {
        self.loop_count = if loop_count == 0 { 1 } else { loop_count };
        self.state = State::Playing {
            start: self.clock.now(),
        };
    }

    /// Advance the state machine, reporting expiry exactly once.
    pub fn poll(&mut self) -> TimerStatus {
        match self.state {
            State::Idle => TimerStatus::Idle,
            State::Playing { start } => {
                if self.still_showing(start) {
                    TimerStatus::Playing
                } else {
                    self.state = State::Idle;
                    TimerStatus::Expired
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        match self.state {
            State::Idle => false,
            State::Playing { start } => self.still_showing(start),
        }
    }

    pub fn stop(&mut self) {
        self.state = State::Idle;
    }

    /// Time left on the current image; `None` when idle or looping forever.
    pub fn remaining(&self) -> Option<Duration> {
        let State::Playing { start } = self.state else {
            return None;
        };
        let total = self.total()?;
        Some(total.saturating_sub(self.clock.now().saturating_duration_since(start)))
    }

    pub fn loop_count(&self) -> i64 {
        self.loop_count
    }

    pub fn is_infinite(&self) -> bool {
        self.loop_count <= -1
    }

    pub fn duration_per_loop(&self) -> Duration {
        self.duration_per_loop
    }

    fn total(&self) -> Option<Duration> {
        if self.is_infinite() {
            return None;
        }
        let loops = u32::try_from(self.loop_count).unwrap_or(u32::MAX);
        Some(self.duration_per_loop.saturating_mul(loops))
    }

    fn still_showing(&self, start: Instant) -> bool {
        match self.total() {
            None => true,
            Some(total) => self.clock.now().saturating_duration_since(start) < total,
        }
    }
}
