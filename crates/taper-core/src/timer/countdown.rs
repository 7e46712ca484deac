//! Countdown to the next permitted event.
//!
//! The countdown is a wall-clock state machine. It stores only the absolute
//! instant the wait ends; the remaining time is recomputed from that instant
//! on every call, so suspending the process for any length of time and
//! calling `tick()` again yields the right answer.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Counting -> TimeUp
//!           ^           |
//!           +-- reset --+
//! ```
//!
//! `Paused` overlays `Counting`/`TimeUp` while the local time of day is
//! outside the plan's active window, if pausing is enabled.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::plan::{ActiveWindow, DerivedMetrics};

const MS_PER_SEC: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownState {
    /// No plan loaded.
    Idle,
    Counting,
    /// The wait is over. Ticking has no effect until the next reset.
    TimeUp,
    /// Outside the active window.
    Paused,
}

/// Read-only projection of the countdown for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    pub state: CountdownState,
    pub next_allowed_at_ms: Option<i64>,
    pub remaining_secs: u64,
    pub interval_secs: u32,
    pub target_daily_count: u32,
    pub is_time_up: bool,
    pub is_paused: bool,
}

impl CountdownSnapshot {
    /// Snapshot reported before a plan exists.
    pub const IDLE: CountdownSnapshot = CountdownSnapshot {
        state: CountdownState::Idle,
        next_allowed_at_ms: None,
        remaining_secs: 0,
        interval_secs: 0,
        target_daily_count: 0,
        is_time_up: false,
        is_paused: false,
    };

    /// 0.0 .. 1.0 progress through the current wait.
    pub fn progress(&self) -> f64 {
        if self.interval_secs == 0 {
            return 0.0;
        }
        let spent = (self.interval_secs as f64 - self.remaining_secs as f64).max(0.0);
        (spent / self.interval_secs as f64).min(1.0)
    }
}

/// Something the countdown noticed while ticking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTransition {
    TimeUp,
    WindowClosed { reopens_in_secs: u32 },
    WindowOpened,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    state: CountdownState,
    next_allowed_at_ms: Option<i64>,
    metrics: DerivedMetrics,
    /// Report at least 1s until the first tick after a reset.
    #[serde(default)]
    smoothing: bool,
    /// Set when pausing outside the active window is enabled.
    #[serde(default)]
    pause_window: Option<ActiveWindow>,
    #[serde(default)]
    was_paused: bool,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownEngine {
    pub fn new() -> Self {
        Self {
            state: CountdownState::Idle,
            next_allowed_at_ms: None,
            metrics: DerivedMetrics::DONE,
            smoothing: false,
            pause_window: None,
            was_paused: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Stored phase, without the `Paused` overlay.
    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn next_allowed_at_ms(&self) -> Option<i64> {
        self.next_allowed_at_ms
    }

    pub fn metrics(&self) -> DerivedMetrics {
        self.metrics
    }

    /// Seconds until `next_allowed_at`, rounded up, never negative.
    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        let Some(next) = self.next_allowed_at_ms else {
            return 0;
        };
        let diff = next.saturating_sub(now_ms);
        let secs = if diff <= 0 {
            0
        } else {
            (diff / MS_PER_SEC + i64::from(diff % MS_PER_SEC != 0)) as u64
        };
        if secs == 0 && self.smoothing {
            1
        } else {
            secs
        }
    }

    pub fn is_paused_at(&self, time_of_day: NaiveTime) -> bool {
        self.state != CountdownState::Idle
            && self
                .pause_window
                .is_some_and(|w| !w.contains(time_of_day))
    }

    pub fn snapshot(&self, now_ms: i64, time_of_day: NaiveTime) -> CountdownSnapshot {
        if self.state == CountdownState::Idle {
            return CountdownSnapshot::IDLE;
        }

        let base = CountdownSnapshot {
            state: self.state,
            next_allowed_at_ms: self.next_allowed_at_ms,
            remaining_secs: 0,
            interval_secs: self.metrics.interval_secs,
            target_daily_count: self.metrics.target_daily_count,
            is_time_up: false,
            is_paused: false,
        };

        if let Some(window) = self.pause_window.filter(|w| !w.contains(time_of_day)) {
            return CountdownSnapshot {
                state: CountdownState::Paused,
                remaining_secs: u64::from(window.secs_until_open(time_of_day)),
                is_paused: true,
                ..base
            };
        }

        let remaining = self.remaining_secs(now_ms);
        let time_up = remaining == 0;
        CountdownSnapshot {
            state: if time_up {
                CountdownState::TimeUp
            } else {
                CountdownState::Counting
            },
            remaining_secs: remaining,
            is_time_up: time_up,
            ..base
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Enable or disable pausing outside `window`.
    pub fn set_pause_window(&mut self, window: Option<ActiveWindow>) {
        self.pause_window = window;
    }

    /// Leave `Idle` with freshly computed metrics.
    ///
    /// With no previous event the user may act immediately.
    pub fn start(&mut self, metrics: DerivedMetrics, last_event_ms: Option<i64>, now_ms: i64) {
        self.metrics = metrics;
        self.smoothing = false;
        self.next_allowed_at_ms = Some(match last_event_ms {
            Some(at) => at.saturating_add(i64::from(metrics.interval_secs) * MS_PER_SEC),
            None => now_ms,
        });
        self.state = if self.remaining_secs(now_ms) == 0 {
            CountdownState::TimeUp
        } else {
            CountdownState::Counting
        };
    }

    /// Restart the wait from a newly recorded event.
    pub fn reset(&mut self, metrics: DerivedMetrics, occurred_at_ms: i64, now_ms: i64) {
        self.metrics = metrics;
        self.smoothing = false;
        self.next_allowed_at_ms =
            Some(occurred_at_ms.saturating_add(i64::from(metrics.interval_secs) * MS_PER_SEC));
        self.state = CountdownState::Counting;
        if metrics.interval_secs > 0 && self.remaining_secs(now_ms) == 0 {
            self.smoothing = true;
        }
    }

    /// Back to `Idle`, for when the plan disappears.
    pub fn clear(&mut self) {
        self.state = CountdownState::Idle;
        self.next_allowed_at_ms = None;
        self.metrics = DerivedMetrics::DONE;
        self.smoothing = false;
        self.was_paused = false;
    }

    /// Call periodically. Returns a transition when one happens.
    pub fn tick(&mut self, now_ms: i64, time_of_day: NaiveTime) -> Option<CountdownTransition> {
        if self.state == CountdownState::Idle {
            return None;
        }

        let paused = self.is_paused_at(time_of_day);
        if paused != self.was_paused {
            self.was_paused = paused;
            if paused {
                let reopens_in_secs = self
                    .pause_window
                    .map(|w| w.secs_until_open(time_of_day))
                    .unwrap_or(0);
                return Some(CountdownTransition::WindowClosed { reopens_in_secs });
            }
            return Some(CountdownTransition::WindowOpened);
        }

        match self.state {
            CountdownState::Counting => {
                self.smoothing = false;
                if self.remaining_secs(now_ms) == 0 {
                    self.state = CountdownState::TimeUp;
                    return Some(CountdownTransition::TimeUp);
                }
                None
            }
            _ => None,
        }
    }

    /// Whether the ticker has anything left to do.
    pub fn needs_ticks(&self) -> bool {
        match self.state {
            CountdownState::Counting => true,
            // Window transitions still matter after time is up.
            CountdownState::TimeUp | CountdownState::Paused => self.pause_window.is_some(),
            CountdownState::Idle => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn metrics(interval_secs: u32) -> DerivedMetrics {
        DerivedMetrics {
            target_daily_count: 10,
            interval_secs,
        }
    }

    #[test]
    fn starts_idle_with_zeroed_snapshot() {
        let engine = CountdownEngine::new();
        assert_eq!(engine.snapshot(0, noon()), CountdownSnapshot::IDLE);
    }

    #[test]
    fn empty_log_allows_immediately() {
        let mut engine = CountdownEngine::new();
        engine.start(metrics(100), None, 5_000);
        let snap = engine.snapshot(5_000, noon());
        assert_eq!(snap.remaining_secs, 0);
        assert!(snap.is_time_up);
        assert_eq!(engine.state(), CountdownState::TimeUp);
    }

    #[test]
    fn counts_down_from_absolute_instant() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(100), 0, 0);

        assert_eq!(engine.snapshot(50_000, noon()).remaining_secs, 50);
        assert_eq!(engine.tick(50_000, noon()), None);

        let done = engine.snapshot(100_000, noon());
        assert_eq!(done.remaining_secs, 0);
        assert!(done.is_time_up);
        assert_eq!(engine.tick(100_000, noon()), Some(CountdownTransition::TimeUp));
        assert_eq!(engine.state(), CountdownState::TimeUp);
        assert_eq!(engine.tick(101_000, noon()), None);
    }

    #[test]
    fn partial_seconds_round_up() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(10), 0, 0);
        assert_eq!(engine.remaining_secs(9_001), 1);
        assert_eq!(engine.remaining_secs(8_999), 2);
    }

    #[test]
    fn resumes_correctly_after_long_suspension() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(3600), 0, 0);
        engine.tick(1_000, noon());
        // Nothing ticks for 59 minutes.
        assert_eq!(engine.snapshot(3_540_000, noon()).remaining_secs, 60);
    }

    #[test]
    fn clock_anomaly_clamps_at_zero() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(100), 1_000_000, 1_000_000);
        let snap = engine.snapshot(i64::MAX, noon());
        assert_eq!(snap.remaining_secs, 0);
        assert!(snap.is_time_up);
        let behind = engine.snapshot(0, noon());
        assert_eq!(behind.remaining_secs, 1_100);
    }

    #[test]
    fn reset_that_lands_on_zero_reports_one() {
        let mut engine = CountdownEngine::new();
        // Event stamped at 0 with a 1s interval, but the reset runs 2s later.
        engine.reset(metrics(1), 0, 2_000);
        let snap = engine.snapshot(2_000, noon());
        assert_eq!(snap.remaining_secs, 1);
        assert!(!snap.is_time_up);

        assert_eq!(engine.tick(3_000, noon()), Some(CountdownTransition::TimeUp));
        assert_eq!(engine.snapshot(3_000, noon()).remaining_secs, 0);
    }

    #[test]
    fn reset_from_time_up_counts_again() {
        let mut engine = CountdownEngine::new();
        engine.start(metrics(100), None, 0);
        assert_eq!(engine.state(), CountdownState::TimeUp);
        engine.reset(metrics(100), 10_000, 10_000);
        assert_eq!(engine.state(), CountdownState::Counting);
        assert_eq!(engine.snapshot(10_000, noon()).remaining_secs, 100);
    }

    #[test]
    fn paused_outside_window_reports_time_until_open() {
        let mut engine = CountdownEngine::new();
        engine.set_pause_window(Some(ActiveWindow::parse("07:00", "23:00").unwrap()));
        engine.reset(metrics(100), 0, 0);

        let night = NaiveTime::from_hms_opt(5, 0, 0).unwrap();
        let snap = engine.snapshot(10_000, night);
        assert!(snap.is_paused);
        assert!(!snap.is_time_up);
        assert_eq!(snap.state, CountdownState::Paused);
        assert_eq!(snap.remaining_secs, 2 * 3600);

        assert_eq!(
            engine.tick(10_000, night),
            Some(CountdownTransition::WindowClosed {
                reopens_in_secs: 7200
            })
        );
        assert_eq!(engine.tick(11_000, noon()), Some(CountdownTransition::WindowOpened));
        assert_eq!(engine.snapshot(11_000, noon()).remaining_secs, 89);
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(100), 0, 0);
        engine.clear();
        assert_eq!(engine.snapshot(0, noon()), CountdownSnapshot::IDLE);
        assert!(!engine.needs_ticks());
    }

    #[test]
    fn progress_tracks_elapsed_fraction() {
        let mut engine = CountdownEngine::new();
        engine.reset(metrics(100), 0, 0);
        let snap = engine.snapshot(25_000, noon());
        assert!((snap.progress() - 0.25).abs() < 1e-9);
    }
}
