use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{migrate::MigrateError, sqlite::SqlitePoolOptions, Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use dmaker_core::store::{DeveloperStore, DeveloperTransaction, RetirementLedger, StoreResult};
use dmaker_core::types::{
    Developer, DeveloperLevel, DeveloperSkillType, RetiredDeveloper, StatusCode,
};
use dmaker_core::StoreError;

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StorageError::Connect)?;

        apply_pragmas(&pool).await?;

        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns the developer record store.
    pub fn developers(&self) -> DeveloperRepository {
        DeveloperRepository {
            pool: self.pool.clone(),
            writer: Arc::clone(&self.writer),
        }
    }

    /// Returns the read side of the retirement ledger.
    pub fn retired_developers(&self) -> RetiredDeveloperRepository {
        RetiredDeveloperRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .fetch_one(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA synchronous = NORMAL;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(pool)
        .await
        .map_err(StorageError::Pragma)?;

    Ok(())
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to apply pragma: {0}")]
    Pragma(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
}

const SELECT_DEVELOPER: &str = "SELECT id, member_id, developer_level, developer_skill_type, \
     experience_years, name, age, status_code, created_at, updated_at FROM developers";

const RETURNING_DEVELOPER: &str = "RETURNING id, member_id, developer_level, developer_skill_type, \
     experience_years, name, age, status_code, created_at, updated_at";

/// Repository backing the developer record store.
///
/// Repositories cloned from one `Database` share a writer gate. At most one
/// write transaction is open at a time, so a read-then-write transaction waits
/// for the previous writer instead of failing its lock upgrade with `SQLITE_BUSY`.
#[derive(Clone)]
pub struct DeveloperRepository {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

#[async_trait]
impl DeveloperStore for DeveloperRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Developer>> {
        let row = sqlx::query_as::<_, DeveloperRow>(&format!("{SELECT_DEVELOPER} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.map(DeveloperRow::into_domain).transpose()
    }

    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Option<Developer>> {
        let row =
            sqlx::query_as::<_, DeveloperRow>(&format!("{SELECT_DEVELOPER} WHERE member_id = ?"))
                .bind(member_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        row.map(DeveloperRow::into_domain).transpose()
    }

    async fn find_all_by_status(&self, status: StatusCode) -> StoreResult<Vec<Developer>> {
        let rows = sqlx::query_as::<_, DeveloperRow>(&format!(
            "{SELECT_DEVELOPER} WHERE status_code = ? ORDER BY id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(DeveloperRow::into_domain).collect()
    }

    async fn begin(&self) -> StoreResult<Box<dyn DeveloperTransaction>> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let tx = self.pool.begin().await.map_err(backend)?;
        Ok(Box::new(SqliteDeveloperTransaction {
            tx,
            _writer: writer,
        }))
    }
}

/// Unit of work over `developers` and `retired_developers`.
///
/// Dropping it without calling `commit` rolls the transaction back. The writer
/// gate is released only after the transaction has ended.
pub struct SqliteDeveloperTransaction {
    tx: Transaction<'static, Sqlite>,
    _writer: OwnedMutexGuard<()>,
}

impl SqliteDeveloperTransaction {
    async fn insert(&mut self, developer: &Developer) -> StoreResult<Developer> {
        let row = sqlx::query_as::<_, DeveloperRow>(&format!(
            "INSERT INTO developers \
             (member_id, developer_level, developer_skill_type, experience_years, name, age, status_code, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) {RETURNING_DEVELOPER}"
        ))
        .bind(&developer.member_id)
        .bind(developer.level.as_str())
        .bind(developer.skill_type.as_str())
        .bind(i64::from(developer.experience_years))
        .bind(&developer.name)
        .bind(i64::from(developer.age))
        .bind(developer.status.as_str())
        .bind(to_rfc3339(developer.created_at))
        .bind(to_rfc3339(developer.updated_at))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if is_unique_violation(db_err.code()) => {
                StoreError::DuplicateMemberId(developer.member_id.clone())
            }
            other => backend(other),
        })?;

        row.into_domain()
    }

    async fn update(&mut self, id: i64, developer: &Developer) -> StoreResult<Developer> {
        let row = sqlx::query_as::<_, DeveloperRow>(&format!(
            "UPDATE developers \
             SET developer_level = ?, developer_skill_type = ?, experience_years = ?, \
                 name = ?, age = ?, status_code = ?, updated_at = ? \
             WHERE id = ? {RETURNING_DEVELOPER}"
        ))
        .bind(developer.level.as_str())
        .bind(developer.skill_type.as_str())
        .bind(i64::from(developer.experience_years))
        .bind(&developer.name)
        .bind(i64::from(developer.age))
        .bind(developer.status.as_str())
        .bind(to_rfc3339(developer.updated_at))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(backend)?
        .ok_or_else(|| StoreError::Corrupt(format!("no developer row with id {id}")))?;

        row.into_domain()
    }
}

#[async_trait]
impl DeveloperTransaction for SqliteDeveloperTransaction {
    async fn find_by_member_id(&mut self, member_id: &str) -> StoreResult<Option<Developer>> {
        let row =
            sqlx::query_as::<_, DeveloperRow>(&format!("{SELECT_DEVELOPER} WHERE member_id = ?"))
                .bind(member_id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(backend)?;
        row.map(DeveloperRow::into_domain).transpose()
    }

    async fn save(&mut self, developer: &Developer) -> StoreResult<Developer> {
        match developer.id {
            None => self.insert(developer).await,
            Some(id) => self.update(id, developer).await,
        }
    }

    async fn save_retired(&mut self, record: &RetiredDeveloper) -> StoreResult<RetiredDeveloper> {
        let row = sqlx::query_as::<_, RetiredDeveloperRow>(
            "INSERT INTO retired_developers (member_id, name, retired_at) \
             VALUES (?, ?, ?) \
             RETURNING id, member_id, name, retired_at",
        )
        .bind(&record.member_id)
        .bind(&record.name)
        .bind(to_rfc3339(record.retired_at))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(backend)?;

        Ok(row.into_domain())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let Self { tx, _writer } = *self;
        tx.commit().await.map_err(backend)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        debug!(stage = "storage", "rolling back developer transaction");
        let Self { tx, _writer } = *self;
        tx.rollback().await.map_err(backend)
    }
}

/// Repository for the append-only `retired_developers` table.
#[derive(Clone)]
pub struct RetiredDeveloperRepository {
    pool: SqlitePool,
}

#[async_trait]
impl RetirementLedger for RetiredDeveloperRepository {
    async fn find_by_member_id(&self, member_id: &str) -> StoreResult<Vec<RetiredDeveloper>> {
        let rows = sqlx::query_as::<_, RetiredDeveloperRow>(
            "SELECT id, member_id, name, retired_at FROM retired_developers \
             WHERE member_id = ? ORDER BY id ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(RetiredDeveloperRow::into_domain).collect())
    }

    async fn find_all(&self) -> StoreResult<Vec<RetiredDeveloper>> {
        let rows = sqlx::query_as::<_, RetiredDeveloperRow>(
            "SELECT id, member_id, name, retired_at FROM retired_developers ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(RetiredDeveloperRow::into_domain).collect())
    }
}

/// Raw `developers` row.
#[derive(Debug, sqlx::FromRow)]
pub struct DeveloperRow {
    pub id: i64,
    pub member_id: String,
    pub developer_level: String,
    pub developer_skill_type: String,
    pub experience_years: i64,
    pub name: String,
    pub age: i64,
    pub status_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeveloperRow {
    /// Converts the database row into a domain developer.
    pub fn into_domain(self) -> StoreResult<Developer> {
        let corrupt = |err: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("developer {}: {err}", self.member_id))
        };
        let level = self
            .developer_level
            .parse::<DeveloperLevel>()
            .map_err(|err| corrupt(&err))?;
        let skill_type = self
            .developer_skill_type
            .parse::<DeveloperSkillType>()
            .map_err(|err| corrupt(&err))?;
        let status = self
            .status_code
            .parse::<StatusCode>()
            .map_err(|err| corrupt(&err))?;
        let experience_years = u32::try_from(self.experience_years).map_err(|err| corrupt(&err))?;
        let age = u32::try_from(self.age).map_err(|err| corrupt(&err))?;

        Ok(Developer {
            id: Some(self.id),
            member_id: self.member_id,
            level,
            skill_type,
            experience_years,
            name: self.name,
            age,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Raw `retired_developers` row.
#[derive(Debug, sqlx::FromRow)]
pub struct RetiredDeveloperRow {
    pub id: i64,
    pub member_id: String,
    pub name: String,
    pub retired_at: DateTime<Utc>,
}

impl RetiredDeveloperRow {
    pub fn into_domain(self) -> RetiredDeveloper {
        RetiredDeveloper {
            id: Some(self.id),
            member_id: self.member_id,
            name: self.name,
            retired_at: self.retired_at,
        }
    }
}

// SQLITE_CONSTRAINT_UNIQUE (2067) and SQLITE_CONSTRAINT_PRIMARYKEY (1555).
fn is_unique_violation(code: Option<Cow<'_, str>>) -> bool {
    matches!(code.as_deref(), Some("2067") | Some("1555"))
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(Box::new(err))
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
