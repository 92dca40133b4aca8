//! Core business logic for cohort.

pub mod services;

pub use services::*;

/// Generate a unique ID using ULID.
#[must_use]
pub fn generate_id() -> String {
    cohort_common::IdGenerator::new().generate()
}
