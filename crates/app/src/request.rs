//! Field checks applied at the HTTP boundary before the service runs.

use std::ops::RangeInclusive;

use dmaker_core::types::{CreateDeveloperRequest, EditDeveloperRequest};

use crate::error::ApiError;

const MEMBER_ID_LENGTH: RangeInclusive<usize> = 3..=50;
const NAME_LENGTH: RangeInclusive<usize> = 3..=50;
const MIN_AGE: u32 = 18;
const MAX_EXPERIENCE_YEARS: u32 = 100;

/// Trims `memberId` and `name`, then checks every field. The trimmed values are
/// the ones handed to the service and persisted.
pub fn prepare_create(
    mut request: CreateDeveloperRequest,
) -> Result<CreateDeveloperRequest, ApiError> {
    request.member_id = request.member_id.trim().to_string();
    request.name = request.name.trim().to_string();

    check_length("memberId", &request.member_id, MEMBER_ID_LENGTH)?;
    check_length("name", &request.name, NAME_LENGTH)?;
    if request.age < MIN_AGE {
        return Err(ApiError::invalid_request(format!(
            "age must be at least {MIN_AGE}"
        )));
    }
    check_experience(request.experience_years)?;
    Ok(request)
}

pub fn validate_edit(request: &EditDeveloperRequest) -> Result<(), ApiError> {
    check_experience(request.experience_years)
}

fn check_length(field: &str, value: &str, range: RangeInclusive<usize>) -> Result<(), ApiError> {
    let length = value.chars().count();
    if range.contains(&length) {
        Ok(())
    } else {
        Err(ApiError::invalid_request(format!(
            "{field} must be between {} and {} characters",
            range.start(),
            range.end()
        )))
    }
}

fn check_experience(years: u32) -> Result<(), ApiError> {
    if years > MAX_EXPERIENCE_YEARS {
        return Err(ApiError::invalid_request(format!(
            "experienceYears must be at most {MAX_EXPERIENCE_YEARS}"
        )));
    }
    Ok(())
}
