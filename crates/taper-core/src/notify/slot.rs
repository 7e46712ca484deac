//! The single reminder slot.
//!
//! A reminder can only be stored through a [`VacantSlot`], and a
//! `VacantSlot` can only be obtained while the slot is empty, so there is no
//! way to hold two reminders at once.

use super::ScheduledReminder;

#[derive(Debug, Default)]
pub struct ReminderSlot {
    current: Option<ScheduledReminder>,
}

/// Proof that the slot is empty, borrowed for the duration of one arm.
#[derive(Debug)]
pub struct VacantSlot<'a> {
    slot: &'a mut Option<ScheduledReminder>,
}

impl ReminderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ScheduledReminder> {
        self.current.as_ref()
    }

    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }

    /// Borrow the slot for filling, or `None` if a reminder is still held.
    pub fn vacancy(&mut self) -> Option<VacantSlot<'_>> {
        if self.current.is_some() {
            return None;
        }
        Some(VacantSlot {
            slot: &mut self.current,
        })
    }

    /// Take the held reminder out, leaving the slot empty.
    pub fn release(&mut self) -> Option<ScheduledReminder> {
        self.current.take()
    }
}

impl<'a> VacantSlot<'a> {
    pub fn fill(self, reminder: ScheduledReminder) -> &'a ScheduledReminder {
        let slot = self.slot;
        slot.insert(reminder)
    }
}
