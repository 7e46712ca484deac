//! # Taper Core Library
//!
//! Core logic for Taper, a gradual-reduction ("tapering") planner. A user
//! declares a daily baseline and a plan; the library derives today's target
//! count and the minimum wait between events, and counts down to the next
//! permitted event. The CLI and any GUI host are thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Plan**: user configuration and the pure metrics calculator
//! - **Timer**: a wall-clock countdown that the host drives with `tick()`
//! - **Notify**: one-shot "almost time" reminders behind a platform trait
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`QuitEngine`]: plan, log, countdown and reminders together
//! - [`PlanMetricsCalculator`]: target count and wait interval for a day
//! - [`CountdownEngine`]: countdown state machine
//! - [`NotificationScheduler`]: keeps at most one reminder outstanding
//! - [`PersistenceGateway`]: storage seam for the plan and event log

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod log;
pub mod notify;
pub mod plan;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::QuitEngine;
pub use error::{ConfigError, CoreError, SchedulingError, StorageError, ValidationError};
pub use events::{Event, SkipReason};
pub use log::{EventLog, EventLogEntry};
pub use notify::{
    KvReminderPlatform, NotificationPlatform, NotificationScheduler, RecordingPlatform,
    ReminderHandle, ReminderPayload, ScheduledReminder,
};
pub use plan::metrics::PlanMetricsCalculator;
pub use plan::{ActiveWindow, DerivedMetrics, PlanConfig, PlanKind, ReductionCurve};
pub use stats::PlanStats;
pub use storage::{Config, MemoryGateway, PersistenceGateway, SqliteGateway};
pub use timer::{CountdownEngine, CountdownSnapshot, CountdownState, SharedEngine, Ticker};
