//! Reminder platform for hosts without a notification service.
//!
//! The pending reminder is written to the SQLite key-value table so a
//! short-lived process (the CLI) can show or cancel it on a later run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotificationPlatform, ReminderHandle, ReminderPayload, ScheduledReminder};
use crate::error::{SchedulingError, StorageError};
use crate::storage::SqliteGateway;

const PENDING_KEY: &str = "pending_reminder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReminder {
    pub reminder: ScheduledReminder,
    pub payload: ReminderPayload,
}

#[derive(Clone)]
pub struct KvReminderPlatform {
    db: SqliteGateway,
}

impl KvReminderPlatform {
    pub fn new(db: SqliteGateway) -> Self {
        Self { db }
    }

    /// The stored reminder with its payload.
    pub fn stored(&self) -> Result<Option<StoredReminder>, SchedulingError> {
        let Some(json) = self.db.kv_get(PENDING_KEY).map_err(unavailable)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| SchedulingError::Unavailable(format!("corrupt reminder record: {e}")))
    }
}

fn unavailable(err: StorageError) -> SchedulingError {
    SchedulingError::Unavailable(err.to_string())
}

#[async_trait]
impl NotificationPlatform for KvReminderPlatform {
    async fn schedule(
        &self,
        fire_at_ms: i64,
        payload: &ReminderPayload,
    ) -> Result<ReminderHandle, SchedulingError> {
        let handle = ReminderHandle::generate();
        let stored = StoredReminder {
            reminder: ScheduledReminder {
                firing_at_ms: fire_at_ms,
                handle: handle.clone(),
            },
            payload: payload.clone(),
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| SchedulingError::Unavailable(e.to_string()))?;
        self.db.kv_set(PENDING_KEY, &json).map_err(unavailable)?;
        Ok(handle)
    }

    async fn cancel(&self, handle: &ReminderHandle) -> Result<(), SchedulingError> {
        match self.stored() {
            Ok(Some(stored)) if &stored.reminder.handle != handle => Ok(()),
            // Unreadable records are cleared along with matching ones.
            Ok(Some(_)) | Err(_) => self
                .db
                .kv_delete(PENDING_KEY)
                .map(|_| ())
                .map_err(unavailable),
            Ok(None) => Ok(()),
        }
    }

    async fn pending(&self) -> Result<Option<ScheduledReminder>, SchedulingError> {
        Ok(self.stored()?.map(|s| s.reminder))
    }
}
