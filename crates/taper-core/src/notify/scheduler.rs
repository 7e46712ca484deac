//! Single-reminder rearm protocol.
//!
//! On every recorded event:
//!
//! 1. Disarm whatever is outstanding.
//! 2. Aim `early_buffer_secs` before the countdown reaches zero, to absorb the
//!    platform's delivery lag.
//! 3. Skip arming if that instant is already within a second of now.
//! 4. Otherwise arm one reminder.
//!
//! Platform failures are logged and swallowed. The countdown stays the source
//! of truth whether or not a reminder is ever delivered.

use tracing::{debug, warn};

use super::{
    NotificationPlatform, ReminderPayload, ReminderSlot, ScheduledReminder,
};
use crate::events::SkipReason;
use crate::storage::NotificationsConfig;

/// Arm candidates closer than this to "now" are not worth scheduling.
const MIN_LEAD_MS: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RearmOutcome {
    Armed(ScheduledReminder),
    Skipped(SkipReason),
}

pub struct NotificationScheduler<P> {
    platform: P,
    slot: ReminderSlot,
    settings: NotificationsConfig,
}

impl<P: NotificationPlatform> NotificationScheduler<P> {
    pub fn new(platform: P, settings: NotificationsConfig) -> Self {
        Self {
            platform,
            slot: ReminderSlot::new(),
            settings,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn outstanding(&self) -> Option<&ScheduledReminder> {
        self.slot.current()
    }

    /// Take ownership of a reminder the platform kept from an earlier
    /// session, so the next rearm cancels it.
    pub async fn restore(&mut self) {
        match self.platform.pending().await {
            Ok(Some(reminder)) => {
                // Anything we already hold is newer than what the platform reports.
                if let Some(vacant) = self.slot.vacancy() {
                    debug!(firing_at_ms = reminder.firing_at_ms, "restored pending reminder");
                    vacant.fill(reminder);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not query pending reminder"),
        }
    }

    /// Cancel and dismiss the outstanding reminder, if any.
    ///
    /// Safe to call repeatedly. Returns whether a reminder was released.
    pub async fn disarm(&mut self) -> bool {
        let Some(reminder) = self.slot.release() else {
            return false;
        };
        if let Err(e) = self.platform.cancel(&reminder.handle).await {
            // The slot stays released: a stale platform reminder is harmless,
            // a stuck slot would block every later arm.
            warn!(error = %e, handle = %reminder.handle.0, "failed to cancel reminder");
        } else {
            debug!(handle = %reminder.handle.0, "reminder disarmed");
        }
        true
    }

    /// Where the reminder would be aimed for a countdown ending at `timer_end_ms`.
    pub fn fire_time_for(&self, timer_end_ms: i64) -> i64 {
        timer_end_ms.saturating_sub(i64::from(self.settings.early_buffer_secs) * 1000)
    }

    /// Run the full disarm-then-arm protocol.
    pub async fn rearm(&mut self, timer_end_ms: i64, now_ms: i64, paused: bool) -> RearmOutcome {
        self.disarm().await;

        if !self.settings.enabled {
            return RearmOutcome::Skipped(SkipReason::Disabled);
        }
        if paused {
            return RearmOutcome::Skipped(SkipReason::Paused);
        }

        let candidate = self.fire_time_for(timer_end_ms);
        if candidate <= now_ms.saturating_add(MIN_LEAD_MS) {
            debug!(candidate, now_ms, "reminder too close to now, not arming");
            return RearmOutcome::Skipped(SkipReason::TooSoon);
        }

        let payload = ReminderPayload {
            title: self.settings.title.clone(),
            body: self.settings.body.clone(),
            timer_end_ms,
        };

        let Some(vacant) = self.slot.vacancy() else {
            // Unreachable after disarm, but never arm over a held reminder.
            warn!("reminder slot still occupied after disarm");
            return RearmOutcome::Skipped(SkipReason::PlatformError);
        };

        match self.platform.schedule(candidate, &payload).await {
            Ok(handle) => {
                let reminder = vacant.fill(ScheduledReminder {
                    firing_at_ms: candidate,
                    handle,
                });
                debug!(firing_at_ms = candidate, "reminder armed");
                RearmOutcome::Armed(reminder.clone())
            }
            Err(e) => {
                warn!(error = %e, "failed to schedule reminder");
                RearmOutcome::Skipped(SkipReason::PlatformError)
            }
        }
    }
}
