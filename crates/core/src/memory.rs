//! In-process store used by service tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::{DeveloperStore, DeveloperTransaction, RetirementLedger, StoreResult};
use crate::types::{Developer, RetiredDeveloper, StatusCode};

#[derive(Debug, Clone, Default)]
struct Tables {
    developers: Vec<Developer>,
    retired: Vec<RetiredDeveloper>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    hide_existing: Arc<AtomicBool>,
    fail_ledger: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Makes transactional lookups miss committed rows, mimicking a concurrent insert.
    pub(crate) fn hide_existing_rows(&self, enabled: bool) {
        self.hide_existing.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn fail_ledger_writes(&self, enabled: bool) {
        self.fail_ledger.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn developers(&self) -> Vec<Developer> {
        self.snapshot().developers
    }

    fn snapshot(&self) -> Tables {
        self.tables.lock().expect("memory store poisoned").clone()
    }
}

#[async_trait]
impl DeveloperStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Developer>> {
        Ok(self
            .snapshot()
            .developers
            .into_iter()
            .find(|developer| developer.id == Some(id)))
    }

    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Option<Developer>> {
        Ok(self
            .snapshot()
            .developers
            .into_iter()
            .find(|developer| developer.member_id == member_id))
    }

    async fn find_all_by_status(&self, status: StatusCode) -> StoreResult<Vec<Developer>> {
        Ok(self
            .snapshot()
            .developers
            .into_iter()
            .filter(|developer| developer.status == status)
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn DeveloperTransaction>> {
        Ok(Box::new(MemoryTransaction {
            shared: self.tables.clone(),
            staged: self.snapshot(),
            hide_existing: self.hide_existing.load(Ordering::SeqCst),
            fail_ledger: self.fail_ledger.load(Ordering::SeqCst),
        }))
    }
}

#[async_trait]
impl RetirementLedger for MemoryStore {
    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Vec<RetiredDeveloper>> {
        Ok(self
            .snapshot()
            .retired
            .into_iter()
            .filter(|record| record.member_id == member_id)
            .collect())
    }

    async fn find_all(&self) -> StoreResult<Vec<RetiredDeveloper>> {
        Ok(self.snapshot().retired)
    }
}

struct MemoryTransaction {
    shared: Arc<Mutex<Tables>>,
    staged: Tables,
    hide_existing: bool,
    fail_ledger: bool,
}

#[async_trait]
impl DeveloperTransaction for MemoryTransaction {
    async fn find_by_member_id(&mut self, member_id: &str) -> StoreResult<Option<Developer>> {
        if self.hide_existing {
            return Ok(None);
        }
        Ok(self
            .staged
            .developers
            .iter()
            .find(|developer| developer.member_id == member_id)
            .cloned())
    }

    async fn save(&mut self, developer: &Developer) -> StoreResult<Developer> {
        match developer.id {
            None => {
                if self
                    .staged
                    .developers
                    .iter()
                    .any(|existing| existing.member_id == developer.member_id)
                {
                    return Err(StoreError::DuplicateMemberId(developer.member_id.clone()));
                }
                let mut stored = developer.clone();
                stored.id = Some(self.staged.next_id());
                self.staged.developers.push(stored.clone());
                Ok(stored)
            }
            Some(id) => {
                let slot = self
                    .staged
                    .developers
                    .iter_mut()
                    .find(|existing| existing.id == Some(id))
                    .ok_or_else(|| StoreError::Corrupt(format!("no developer row with id {id}")))?;
                *slot = developer.clone();
                Ok(developer.clone())
            }
        }
    }

    async fn save_retired(&mut self, record: &RetiredDeveloper) -> StoreResult<RetiredDeveloper> {
        if self.fail_ledger {
            let io = std::io::Error::new(std::io::ErrorKind::Other, "ledger unavailable");
            return Err(StoreError::Backend(Box::new(io)));
        }
        let mut stored = record.clone();
        stored.id = Some(self.staged.next_id());
        self.staged.retired.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { shared, staged, .. } = *self;
        *shared.lock().expect("memory store poisoned") = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
