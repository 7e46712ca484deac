//! In-process persistence gateway.
//!
//! Used by tests and by hosts that keep their own durable copy. Failures can
//! be injected to exercise the engine's storage-error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::gateway::PersistenceGateway;
use crate::error::StorageError;
use crate::log::EventLogEntry;
use crate::plan::PlanConfig;

#[derive(Debug, Default)]
struct Inner {
    plan: Option<PlanConfig>,
    entries: Vec<EventLogEntry>,
}

/// Cloning shares the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<Inner>>,
    fail_appends: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plan(plan: PlanConfig) -> Self {
        let gateway = Self::default();
        if let Ok(mut inner) = gateway.inner.lock() {
            inner.plan = Some(plan);
        }
        gateway
    }

    /// Make every subsequent `append` fail until reset.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `load_plan`/`list` fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Insert an entry directly, bypassing failure injection.
    pub fn seed(&self, entry: EventLogEntry) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.push(entry);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".into()))
    }

    fn check_reads(&self) -> Result<(), StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected read failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn load_plan(&self) -> Result<Option<PlanConfig>, StorageError> {
        self.check_reads()?;
        Ok(self.lock()?.plan.clone())
    }

    async fn save_plan(&self, plan: &PlanConfig) -> Result<(), StorageError> {
        self.lock()?.plan = Some(plan.clone());
        Ok(())
    }

    async fn append(&self, entry: EventLogEntry) -> Result<(), StorageError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected append failure".into()));
        }
        self.lock()?.entries.push(entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<EventLogEntry>, StorageError> {
        self.check_reads()?;
        Ok(self.lock()?.entries.clone())
    }

    async fn clear_all(&self) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        inner.plan = None;
        inner.entries.clear();
        Ok(())
    }
}
