use async_trait::async_trait;

use crate::error::StorageError;
use crate::log::EventLogEntry;
use crate::plan::PlanConfig;

/// Durable store for the plan and the event log.
///
/// Calls may suspend the caller. A failed `append` must reach the caller;
/// implementations never drop an entry silently.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// The saved plan, or `None` before onboarding completed.
    async fn load_plan(&self) -> Result<Option<PlanConfig>, StorageError>;

    /// Store the plan, replacing any previous one.
    async fn save_plan(&self, plan: &PlanConfig) -> Result<(), StorageError>;

    async fn append(&self, entry: EventLogEntry) -> Result<(), StorageError>;

    /// All entries in insertion order.
    async fn list(&self) -> Result<Vec<EventLogEntry>, StorageError>;

    /// Wipe the plan and the log. Never called by the engine itself.
    async fn clear_all(&self) -> Result<(), StorageError>;
}
