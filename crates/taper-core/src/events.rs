use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::CountdownSnapshot;

/// Every state change in the engine produces an Event.
/// Hosts print or forward them; the engine itself never reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Plan loaded and the countdown left `Idle`.
    CountdownStarted {
        next_allowed_at_ms: i64,
        interval_secs: u32,
        target_daily_count: u32,
        at: DateTime<Utc>,
    },
    /// A smoking event was appended and the wait restarted.
    EventRecorded {
        occurred_at_ms: i64,
        next_allowed_at_ms: i64,
        interval_secs: u32,
        target_daily_count: u32,
        at: DateTime<Utc>,
    },
    TimeUp {
        at: DateTime<Utc>,
    },
    /// Left the active window; the countdown reports time until it reopens.
    WindowClosed {
        reopens_in_secs: u32,
        at: DateTime<Utc>,
    },
    WindowOpened {
        at: DateTime<Utc>,
    },
    ReminderArmed {
        firing_at_ms: i64,
        at: DateTime<Utc>,
    },
    /// The rearm protocol decided not to arm.
    ReminderSkipped {
        reason: SkipReason,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        snapshot: CountdownSnapshot,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fire time is in the past or within a second of now.
    TooSoon,
    /// Outside the active window.
    Paused,
    /// Reminders turned off in configuration.
    Disabled,
    /// The platform rejected the request.
    PlatformError,
}
