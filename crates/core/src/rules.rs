//! Pure validation rules applied before any write.

use crate::error::RuleViolation;
use crate::types::{Developer, DeveloperLevel};

/// Checks that `experience_years` falls inside the inclusive range of `level`.
pub fn validate_level(level: DeveloperLevel, experience_years: u32) -> Result<(), RuleViolation> {
    let (min, max) = level.experience_range();
    let within_max = max.map_or(true, |max| experience_years <= max);
    if experience_years >= min && within_max {
        Ok(())
    } else {
        Err(RuleViolation::LevelExperienceMismatch {
            level,
            experience_years,
        })
    }
}

/// Fails when `existing` holds a record for `member_id`.
///
/// Read-then-decide only; the store's uniqueness constraint is what actually
/// rejects a concurrent duplicate insert.
pub fn check_unique(existing: Option<&Developer>, member_id: &str) -> Result<(), RuleViolation> {
    match existing {
        Some(_) => Err(RuleViolation::DuplicateMemberId(member_id.to_string())),
        None => Ok(()),
    }
}
