use serde::Serialize;
use thiserror::Error;

use crate::types::DeveloperLevel;

/// Error taxonomy surfaced to callers as `{errorCode, errorMessage}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    DuplicateMemberId,
    LevelExperienceMismatch,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateMemberId => "DUPLICATE_MEMBER_ID",
            Self::LevelExperienceMismatch => "LEVEL_EXPERIENCE_MISMATCH",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Default human-readable message for the code.
    pub fn message(self) -> &'static str {
        match self {
            Self::NotFound => "no matching developer exists",
            Self::DuplicateMemberId => "a developer with the same memberId already exists",
            Self::LevelExperienceMismatch => "developer level does not match years of experience",
            Self::InvalidRequest => "the request is invalid",
            Self::InternalError => "an internal server error occurred",
        }
    }
}

/// Business-rule failure, distinct from infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("{level} requires a different range of experience (got {experience_years} years)")]
    LevelExperienceMismatch {
        level: DeveloperLevel,
        experience_years: u32,
    },
    #[error("memberId '{0}' is already registered")]
    DuplicateMemberId(String),
}

impl RuleViolation {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::LevelExperienceMismatch { .. } => ErrorCode::LevelExperienceMismatch,
            Self::DuplicateMemberId(_) => ErrorCode::DuplicateMemberId,
        }
    }
}

/// Failures reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memberId '{0}' violates the uniqueness constraint")]
    DuplicateMemberId(String),
    #[error("stored row could not be mapped: {0}")]
    Corrupt(String),
    #[error("store backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Error returned by [`crate::service::DeveloperService`] operations.
#[derive(Debug, Error)]
pub enum DeveloperError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("developer '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Store(StoreError),
}

impl DeveloperError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rule(violation) => violation.code(),
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Store(_) => ErrorCode::InternalError,
        }
    }
}

impl From<StoreError> for DeveloperError {
    fn from(err: StoreError) -> Self {
        match err {
            // Lost the race between the uniqueness pre-check and the insert.
            StoreError::DuplicateMemberId(member_id) => {
                Self::Rule(RuleViolation::DuplicateMemberId(member_id))
            }
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violation_maps_back_to_duplicate_code() {
        let err = DeveloperError::from(StoreError::DuplicateMemberId("dev-1".into()));
        assert_eq!(err.code(), ErrorCode::DuplicateMemberId);
        assert!(matches!(
            err,
            DeveloperError::Rule(RuleViolation::DuplicateMemberId(ref id)) if id == "dev-1"
        ));
    }

    #[test]
    fn backend_failures_are_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = DeveloperError::from(StoreError::Backend(Box::new(io)));
        assert_eq!(err.code(), ErrorCode::InternalError);

        let err = DeveloperError::from(StoreError::Corrupt("bad level".into()));
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn codes_serialize_as_screaming_snake_case() {
        let value = serde_json::to_value(ErrorCode::LevelExperienceMismatch).unwrap();
        assert_eq!(value, serde_json::json!("LEVEL_EXPERIENCE_MISMATCH"));
        assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
    }
}
