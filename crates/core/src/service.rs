//! Developer use cases: validation, record construction and retirement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::error::DeveloperError;
use crate::rules::{check_unique, validate_level};
use crate::store::{DeveloperStore, RetirementLedger};
use crate::types::{
    CreateDeveloperRequest, Developer, DeveloperDetail, DeveloperSummary, EditDeveloperRequest,
    RetiredDeveloper, RetiredDeveloperView, StatusCode,
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Orchestrates developer lifecycle operations over the store ports.
#[derive(Clone)]
pub struct DeveloperService {
    store: Arc<dyn DeveloperStore>,
    ledger: Arc<dyn RetirementLedger>,
    clock: Clock,
}

impl DeveloperService {
    pub fn new(
        store: Arc<dyn DeveloperStore>,
        ledger: Arc<dyn RetirementLedger>,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Registers a new employed developer.
    ///
    /// The uniqueness lookup and the insert share one transaction; an insert
    /// rejected by the store constraint still reports `DUPLICATE_MEMBER_ID`.
    pub async fn create(
        &self,
        request: &CreateDeveloperRequest,
    ) -> Result<DeveloperDetail, DeveloperError> {
        let result = self.create_inner(request).await;
        trace_outcome("create", &request.member_id, &result);
        result
    }

    async fn create_inner(
        &self,
        request: &CreateDeveloperRequest,
    ) -> Result<DeveloperDetail, DeveloperError> {
        validate_level(request.level, request.experience_years)?;

        let mut tx = self.store.begin().await?;
        let existing = tx.find_by_member_id(&request.member_id).await?;
        check_unique(existing.as_ref(), &request.member_id)?;

        let now = self.now();
        let developer = Developer {
            id: None,
            member_id: request.member_id.clone(),
            level: request.level,
            skill_type: request.skill_type,
            experience_years: request.experience_years,
            name: request.name.clone(),
            age: request.age,
            status: StatusCode::Employed,
            created_at: now,
            updated_at: now,
        };
        let saved = tx.save(&developer).await?;
        tx.commit().await?;

        Ok(DeveloperDetail::from(&saved))
    }

    /// Lists employed developers in insertion order.
    pub async fn list_employed(&self) -> Result<Vec<DeveloperSummary>, DeveloperError> {
        let developers = self.store.find_all_by_status(StatusCode::Employed).await?;
        Ok(developers.iter().map(DeveloperSummary::from).collect())
    }

    /// Returns the full record, including retired developers.
    pub async fn detail(&self, member_id: &str) -> Result<DeveloperDetail, DeveloperError> {
        self.store
            .find_by_member_id(member_id)
            .await?
            .map(|developer| DeveloperDetail::from(&developer))
            .ok_or_else(|| DeveloperError::NotFound(member_id.to_string()))
    }

    /// Changes level, skill type and experience of an employed developer.
    pub async fn edit(
        &self,
        member_id: &str,
        request: &EditDeveloperRequest,
    ) -> Result<DeveloperDetail, DeveloperError> {
        let result = self.edit_inner(member_id, request).await;
        trace_outcome("edit", member_id, &result);
        result
    }

    async fn edit_inner(
        &self,
        member_id: &str,
        request: &EditDeveloperRequest,
    ) -> Result<DeveloperDetail, DeveloperError> {
        validate_level(request.level, request.experience_years)?;

        let mut tx = self.store.begin().await?;
        let mut developer = tx
            .find_by_member_id(member_id)
            .await?
            .filter(Developer::is_employed)
            .ok_or_else(|| DeveloperError::NotFound(member_id.to_string()))?;

        developer.level = request.level;
        developer.skill_type = request.skill_type;
        developer.experience_years = request.experience_years;
        developer.updated_at = self.now();

        let saved = tx.save(&developer).await?;
        tx.commit().await?;

        Ok(DeveloperDetail::from(&saved))
    }

    /// Moves an employed developer to RETIRED and appends exactly one ledger entry.
    ///
    /// Both writes commit together or not at all. Retiring twice yields `NOT_FOUND`.
    pub async fn retire(&self, member_id: &str) -> Result<DeveloperDetail, DeveloperError> {
        let result = self.retire_inner(member_id).await;
        trace_outcome("retire", member_id, &result);
        result
    }

    async fn retire_inner(&self, member_id: &str) -> Result<DeveloperDetail, DeveloperError> {
        let mut tx = self.store.begin().await?;
        let mut developer = tx
            .find_by_member_id(member_id)
            .await?
            .filter(Developer::is_employed)
            .ok_or_else(|| DeveloperError::NotFound(member_id.to_string()))?;

        let now = self.now();
        developer.status = StatusCode::Retired;
        developer.updated_at = now;
        let saved = tx.save(&developer).await?;

        tx.save_retired(&RetiredDeveloper {
            id: None,
            member_id: saved.member_id.clone(),
            name: saved.name.clone(),
            retired_at: now,
        })
        .await?;
        tx.commit().await?;

        Ok(DeveloperDetail::from(&saved))
    }

    /// Ledger entries, optionally narrowed to a single member.
    pub async fn retired(
        &self,
        member_id: Option<&str>,
    ) -> Result<Vec<RetiredDeveloperView>, DeveloperError> {
        let records = match member_id {
            Some(member_id) => self.ledger.find_by_member_id(member_id).await?,
            None => self.ledger.find_all().await?,
        };
        Ok(records.iter().map(RetiredDeveloperView::from).collect())
    }
}

fn trace_outcome<T>(operation: &'static str, member_id: &str, result: &Result<T, DeveloperError>) {
    match result {
        Ok(_) => info!(stage = "service", operation, member_id, "operation completed"),
        Err(DeveloperError::Store(err)) => {
            error!(stage = "service", operation, member_id, error = %err, "store failure")
        }
        Err(err) => warn!(
            stage = "service",
            operation,
            member_id,
            code = err.code().as_str(),
            reason = %err,
            "request rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, RuleViolation};
    use crate::memory::MemoryStore;
    use crate::types::{DeveloperLevel, DeveloperSkillType};
    use chrono::TimeZone;

    fn fixed_clock() -> Clock {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Arc::new(move || now)
    }

    fn service(store: &MemoryStore) -> DeveloperService {
        DeveloperService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            fixed_clock(),
        )
    }

    fn create_request(member_id: &str, level: DeveloperLevel, years: u32) -> CreateDeveloperRequest {
        CreateDeveloperRequest {
            member_id: member_id.to_string(),
            level,
            skill_type: DeveloperSkillType::BackEnd,
            experience_years: years,
            name: "Linus".to_string(),
            age: 30,
        }
    }

    #[tokio::test]
    async fn scenario_mismatch_then_success_then_duplicate() {
        let store = MemoryStore::default();
        let service = service(&store);

        let err = service
            .create(&create_request("abc", DeveloperLevel::Senior, 3))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::LevelExperienceMismatch);
        assert!(store.developers().is_empty(), "no partial write");

        service
            .create(&create_request("abc", DeveloperLevel::Senior, 12))
            .await
            .expect("consistent senior is created");

        let mut other = create_request("abc", DeveloperLevel::Junior, 1);
        other.name = "Someone Else".to_string();
        other.skill_type = DeveloperSkillType::FrontEnd;
        let err = service.create(&other).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateMemberId);
        assert_eq!(store.developers().len(), 1);
    }

    #[tokio::test]
    async fn detail_after_create_returns_supplied_fields() {
        let store = MemoryStore::default();
        let service = service(&store);
        let request = create_request("dev-1", DeveloperLevel::Jungnior, 6);

        let created = service.create(&request).await.expect("create");
        let detail = service.detail("dev-1").await.expect("detail");

        assert_eq!(created, detail);
        assert_eq!(detail.member_id, request.member_id);
        assert_eq!(detail.level, request.level);
        assert_eq!(detail.skill_type, request.skill_type);
        assert_eq!(detail.experience_years, request.experience_years);
        assert_eq!(detail.name, request.name);
        assert_eq!(detail.age, request.age);
        assert_eq!(detail.status, StatusCode::Employed);
        assert_eq!(detail.created_at, detail.updated_at);
    }

    #[tokio::test]
    async fn detail_of_unknown_member_is_not_found() {
        let store = MemoryStore::default();
        let err = service(&store).detail("ghost").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn constraint_violation_surfaces_as_duplicate() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("race", DeveloperLevel::Junior, 2))
            .await
            .expect("first insert");

        // The pre-check misses the row, as it would for a concurrent insert.
        store.hide_existing_rows(true);
        let err = service
            .create(&create_request("race", DeveloperLevel::Junior, 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeveloperError::Rule(RuleViolation::DuplicateMemberId(ref id)) if id == "race"
        ));
        assert_eq!(store.developers().len(), 1);
    }

    #[tokio::test]
    async fn edit_then_detail_returns_edited_values() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("dev-2", DeveloperLevel::Junior, 3))
            .await
            .expect("create");

        let edit = EditDeveloperRequest {
            level: DeveloperLevel::Senior,
            skill_type: DeveloperSkillType::FullStack,
            experience_years: 11,
        };
        service.edit("dev-2", &edit).await.expect("edit");

        let detail = service.detail("dev-2").await.expect("detail");
        assert_eq!(detail.level, DeveloperLevel::Senior);
        assert_eq!(detail.skill_type, DeveloperSkillType::FullStack);
        assert_eq!(detail.experience_years, 11);
        assert_eq!(detail.name, "Linus");
    }

    #[tokio::test]
    async fn edit_validates_level_before_lookup() {
        let store = MemoryStore::default();
        let edit = EditDeveloperRequest {
            level: DeveloperLevel::Junior,
            skill_type: DeveloperSkillType::FrontEnd,
            experience_years: 8,
        };

        let err = service(&store).edit("missing", &edit).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::LevelExperienceMismatch);

        let valid = EditDeveloperRequest {
            experience_years: 2,
            ..edit
        };
        let err = service(&store).edit("missing", &valid).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn rejected_edit_leaves_record_untouched() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("dev-3", DeveloperLevel::Jungnior, 5))
            .await
            .expect("create");

        let edit = EditDeveloperRequest {
            level: DeveloperLevel::Senior,
            skill_type: DeveloperSkillType::FrontEnd,
            experience_years: 5,
        };
        assert!(service.edit("dev-3", &edit).await.is_err());

        let detail = service.detail("dev-3").await.expect("detail");
        assert_eq!(detail.level, DeveloperLevel::Jungnior);
        assert_eq!(detail.skill_type, DeveloperSkillType::BackEnd);
    }

    #[tokio::test]
    async fn retire_hides_from_list_and_writes_one_ledger_entry() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("keep", DeveloperLevel::Junior, 1))
            .await
            .expect("create keep");
        service
            .create(&create_request("leave", DeveloperLevel::Senior, 15))
            .await
            .expect("create leave");

        let retired = service.retire("leave").await.expect("retire");
        assert_eq!(retired.status, StatusCode::Retired);

        let listed: Vec<_> = service
            .list_employed()
            .await
            .expect("list")
            .into_iter()
            .map(|summary| summary.member_id)
            .collect();
        assert_eq!(listed, vec!["keep".to_string()]);

        let ledger = service.retired(Some("leave")).await.expect("ledger");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].name, "Linus");
        assert_eq!(ledger[0].retired_at, retired.updated_at);
    }

    #[tokio::test]
    async fn retired_developer_stays_visible_but_cannot_be_retired_again() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("once", DeveloperLevel::Junior, 0))
            .await
            .expect("create");
        service.retire("once").await.expect("first retire");

        let detail = service.detail("once").await.expect("retired detail");
        assert_eq!(detail.status, StatusCode::Retired);

        let err = service.retire("once").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(service.retired(None).await.expect("ledger").len(), 1);

        let edit = EditDeveloperRequest {
            level: DeveloperLevel::Junior,
            skill_type: DeveloperSkillType::BackEnd,
            experience_years: 1,
        };
        let err = service.edit("once", &edit).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn failed_ledger_write_rolls_back_status_change() {
        let store = MemoryStore::default();
        let service = service(&store);
        service
            .create(&create_request("atomic", DeveloperLevel::Junior, 2))
            .await
            .expect("create");

        store.fail_ledger_writes(true);
        let err = service.retire("atomic").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);

        let detail = service.detail("atomic").await.expect("detail");
        assert_eq!(detail.status, StatusCode::Employed);
        assert!(service.retired(None).await.expect("ledger").is_empty());
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = MemoryStore::default();
        let service = service(&store);
        for member_id in ["c", "a", "b"] {
            service
                .create(&create_request(member_id, DeveloperLevel::Junior, 1))
                .await
                .expect("create");
        }

        let listed: Vec<_> = service
            .list_employed()
            .await
            .expect("list")
            .into_iter()
            .map(|summary| summary.member_id)
            .collect();
        assert_eq!(listed, vec!["c", "a", "b"]);
    }
}
