//! Append-only log of recorded smoking events.

use serde::{Deserialize, Serialize};

/// A single recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Unix epoch milliseconds.
    pub occurred_at_ms: i64,
}

impl EventLogEntry {
    pub fn at(occurred_at_ms: i64) -> Self {
        Self { occurred_at_ms }
    }
}

/// In-memory view of the persisted event log, in insertion order.
///
/// The engine only ever appends. Clearing the log is owned by whoever owns
/// the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<EventLogEntry>) -> Self {
        Self { entries }
    }

    pub fn append(&mut self, entry: EventLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent event.
    ///
    /// With `sorted` false this is the last appended entry; otherwise the
    /// entry with the latest timestamp, for logs that may have been written
    /// out of order.
    pub fn last_event(&self, sorted: bool) -> Option<EventLogEntry> {
        if sorted {
            self.entries.iter().copied().max()
        } else {
            self.entries.last().copied()
        }
    }

    /// Entries in chronological order, regardless of insertion order.
    pub fn sorted(&self) -> Vec<EventLogEntry> {
        let mut out = self.entries.clone();
        out.sort();
        out
    }
}
