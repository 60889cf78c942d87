//! Persistence ports consumed by the developer service.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Developer, RetiredDeveloper, StatusCode};

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store for developers.
#[async_trait]
pub trait DeveloperStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Developer>>;

    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Option<Developer>>;

    /// Returns every developer with `status`, in insertion order.
    async fn find_all_by_status(&self, status: StatusCode) -> StoreResult<Vec<Developer>>;

    /// Opens a unit of work spanning the developer and ledger tables.
    async fn begin(&self) -> StoreResult<Box<dyn DeveloperTransaction>>;
}

/// Writes applied atomically on `commit`. Dropping without commit discards them.
#[async_trait]
pub trait DeveloperTransaction: Send {
    async fn find_by_member_id(&mut self, member_id: &str) -> StoreResult<Option<Developer>>;

    /// Inserts when `developer.id` is `None`, updates otherwise. Returns the stored record.
    ///
    /// Must fail with [`StoreError::DuplicateMemberId`] when an insert collides
    /// with an existing `member_id`.
    async fn save(&mut self, developer: &Developer) -> StoreResult<Developer>;

    async fn save_retired(&mut self, record: &RetiredDeveloper) -> StoreResult<RetiredDeveloper>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Read side of the append-only retirement ledger.
#[async_trait]
pub trait RetirementLedger: Send + Sync {
    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Vec<RetiredDeveloper>>;

    async fn find_all(&self) -> StoreResult<Vec<RetiredDeveloper>>;
}
