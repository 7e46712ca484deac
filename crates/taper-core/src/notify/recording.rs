//! In-memory notification platform.
//!
//! Keeps scheduled reminders in a list instead of delivering them. Hosts that
//! render their own alerts can poll [`RecordingPlatform::due`]; tests use the
//! counters and failure injection.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{NotificationPlatform, ReminderHandle, ReminderPayload, ScheduledReminder};
use crate::error::SchedulingError;

#[derive(Debug, Clone)]
struct Pending {
    reminder: ScheduledReminder,
    payload: ReminderPayload,
}

#[derive(Debug, Default)]
struct State {
    pending: Vec<Pending>,
    scheduled_total: usize,
    cancelled_total: usize,
    fail_schedule: Option<SchedulingError>,
    fail_cancel: Option<SchedulingError>,
}

/// Cloning shares the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlatform {
    state: Arc<Mutex<State>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned recorder only ever means a panicking test.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_schedule(&self, error: Option<SchedulingError>) {
        self.state().fail_schedule = error;
    }

    pub fn fail_cancel(&self, error: Option<SchedulingError>) {
        self.state().fail_cancel = error;
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn pending_reminders(&self) -> Vec<ScheduledReminder> {
        self.state().pending.iter().map(|p| p.reminder.clone()).collect()
    }

    pub fn pending_payloads(&self) -> Vec<ReminderPayload> {
        self.state().pending.iter().map(|p| p.payload.clone()).collect()
    }

    pub fn scheduled_total(&self) -> usize {
        self.state().scheduled_total
    }

    pub fn cancelled_total(&self) -> usize {
        self.state().cancelled_total
    }

    /// Remove and return reminders whose fire time has passed.
    pub fn due(&self, now_ms: i64) -> Vec<ReminderPayload> {
        let mut state = self.state();
        let (due, keep): (Vec<Pending>, Vec<Pending>) = state
            .pending
            .drain(..)
            .partition(|p| p.reminder.firing_at_ms <= now_ms);
        state.pending = keep;
        due.into_iter().map(|p| p.payload).collect()
    }
}

#[async_trait]
impl NotificationPlatform for RecordingPlatform {
    async fn schedule(
        &self,
        fire_at_ms: i64,
        payload: &ReminderPayload,
    ) -> Result<ReminderHandle, SchedulingError> {
        let mut state = self.state();
        if let Some(err) = state.fail_schedule.clone() {
            return Err(err);
        }
        let handle = ReminderHandle::generate();
        state.pending.push(Pending {
            reminder: ScheduledReminder {
                firing_at_ms: fire_at_ms,
                handle: handle.clone(),
            },
            payload: payload.clone(),
        });
        state.scheduled_total += 1;
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), SchedulingError> {
        let mut state = self.state();
        if let Some(err) = state.fail_cancel.clone() {
            return Err(err);
        }
        let before = state.pending.len();
        state.pending.retain(|p| &p.reminder.handle != handle);
        if state.pending.len() < before {
            state.cancelled_total += 1;
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Option<ScheduledReminder>, SchedulingError> {
        Ok(self.state().pending.last().map(|p| p.reminder.clone()))
    }
}
