//! Local reminder scheduling.
//!
//! The engine keeps at most one reminder outstanding. [`NotificationPlatform`]
//! is the seam to whatever actually delivers notifications; the
//! [`NotificationScheduler`] owns the single-reminder protocol on top of it.

pub mod kv;
pub mod recording;
pub mod scheduler;
pub mod slot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

pub use kv::KvReminderPlatform;
pub use recording::RecordingPlatform;
pub use scheduler::{NotificationScheduler, RearmOutcome};
pub use slot::{ReminderSlot, VacantSlot};

/// Opaque identifier the platform hands back for a scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderHandle(pub String);

impl ReminderHandle {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Content of the reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub title: String,
    pub body: String,
    /// When the countdown itself reaches zero.
    pub timer_end_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub firing_at_ms: i64,
    pub handle: ReminderHandle,
}

/// Platform notification service.
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Schedule a one-shot reminder at an absolute instant.
    async fn schedule(
        &self,
        fire_at_ms: i64,
        payload: &ReminderPayload,
    ) -> Result<ReminderHandle, SchedulingError>;

    /// Cancel the reminder if pending, or dismiss it if already delivered.
    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), SchedulingError>;

    /// A reminder the platform still holds from an earlier session.
    async fn pending(&self) -> Result<Option<ScheduledReminder>, SchedulingError> {
        Ok(None)
    }
}
