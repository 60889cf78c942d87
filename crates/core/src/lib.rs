//! Domain layer: developer records, validation rules, store ports and the
//! service that ties them together. Storage and HTTP live in other crates.

pub mod error;
pub mod rules;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod memory;

pub use error::{DeveloperError, ErrorCode, RuleViolation, StoreError};
pub use service::{Clock, DeveloperService};
pub use store::{DeveloperStore, DeveloperTransaction, RetirementLedger, StoreResult};
