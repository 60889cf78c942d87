use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seniority level claimed for a developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeveloperLevel {
    Junior,
    /// Mid level. Persisted and serialized as `JUNGNIOR`; `MID` is accepted on input.
    #[serde(alias = "MID")]
    Jungnior,
    Senior,
}

impl DeveloperLevel {
    pub const ALL: [Self; 3] = [Self::Junior, Self::Jungnior, Self::Senior];

    /// Returns the canonical database representation for the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "JUNIOR",
            Self::Jungnior => "JUNGNIOR",
            Self::Senior => "SENIOR",
        }
    }

    /// Inclusive bounds on years of experience; `None` means unbounded.
    pub fn experience_range(self) -> (u32, Option<u32>) {
        match self {
            Self::Junior => (0, Some(4)),
            Self::Jungnior => (4, Some(10)),
            Self::Senior => (10, None),
        }
    }
}

impl FromStr for DeveloperLevel {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "JUNIOR" => Ok(Self::Junior),
            "JUNGNIOR" | "MID" => Ok(Self::Jungnior),
            "SENIOR" => Ok(Self::Senior),
            other => Err(ParseEnumError::new("developer level", other)),
        }
    }
}

impl fmt::Display for DeveloperLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary skill area of a developer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeveloperSkillType {
    #[serde(alias = "BACKEND")]
    BackEnd,
    FrontEnd,
    FullStack,
}

impl DeveloperSkillType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BackEnd => "BACK_END",
            Self::FrontEnd => "FRONT_END",
            Self::FullStack => "FULL_STACK",
        }
    }
}

impl FromStr for DeveloperSkillType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "BACK_END" | "BACKEND" => Ok(Self::BackEnd),
            "FRONT_END" => Ok(Self::FrontEnd),
            "FULL_STACK" => Ok(Self::FullStack),
            other => Err(ParseEnumError::new("skill type", other)),
        }
    }
}

/// Employment status. `Employed` is initial, `Retired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Employed,
    Retired,
}

impl StatusCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employed => "EMPLOYED",
            Self::Retired => "RETIRED",
        }
    }
}

impl FromStr for StatusCode {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EMPLOYED" => Ok(Self::Employed),
            "RETIRED" => Ok(Self::Retired),
            other => Err(ParseEnumError::new("status code", other)),
        }
    }
}

/// Raised when a stored enum column holds an unknown value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Developer record as owned by the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Developer {
    /// Store-generated identity; `None` until first saved.
    pub id: Option<i64>,
    pub member_id: String,
    pub level: DeveloperLevel,
    pub skill_type: DeveloperSkillType,
    pub experience_years: u32,
    pub name: String,
    pub age: u32,
    pub status: StatusCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Developer {
    pub fn is_employed(&self) -> bool {
        self.status == StatusCode::Employed
    }
}

/// Append-only ledger entry written when a developer retires.
#[derive(Debug, Clone, PartialEq)]
pub struct RetiredDeveloper {
    pub id: Option<i64>,
    pub member_id: String,
    pub name: String,
    pub retired_at: DateTime<Utc>,
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeveloperRequest {
    pub member_id: String,
    pub level: DeveloperLevel,
    pub skill_type: DeveloperSkillType,
    pub experience_years: u32,
    pub name: String,
    pub age: u32,
}

/// Body of an edit request. `memberId` comes from the path and is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDeveloperRequest {
    pub level: DeveloperLevel,
    pub skill_type: DeveloperSkillType,
    pub experience_years: u32,
}

/// List projection; never exposes the internal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperSummary {
    pub member_id: String,
    pub level: DeveloperLevel,
    pub skill_type: DeveloperSkillType,
}

impl From<&Developer> for DeveloperSummary {
    fn from(developer: &Developer) -> Self {
        Self {
            member_id: developer.member_id.clone(),
            level: developer.level,
            skill_type: developer.skill_type,
        }
    }
}

/// Full detail projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperDetail {
    pub member_id: String,
    pub level: DeveloperLevel,
    pub skill_type: DeveloperSkillType,
    pub experience_years: u32,
    pub name: String,
    pub age: u32,
    pub status: StatusCode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Developer> for DeveloperDetail {
    fn from(developer: &Developer) -> Self {
        Self {
            member_id: developer.member_id.clone(),
            level: developer.level,
            skill_type: developer.skill_type,
            experience_years: developer.experience_years,
            name: developer.name.clone(),
            age: developer.age,
            status: developer.status,
            created_at: developer.created_at,
            updated_at: developer.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetiredDeveloperView {
    pub member_id: String,
    pub name: String,
    pub retired_at: DateTime<Utc>,
}

impl From<&RetiredDeveloper> for RetiredDeveloperView {
    fn from(record: &RetiredDeveloper) -> Self {
        Self {
            member_id: record.member_id.clone(),
            name: record.name.clone(),
            retired_at: record.retired_at,
        }
    }
}
