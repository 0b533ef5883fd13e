//! Core business logic for ecowatch.
//!
//! Report submission with near-duplicate counting, the location-gated
//! verification flow, community severity consensus, and the store contracts
//! they run against.

pub mod services;
pub mod store;

pub use services::*;
pub use store::{
    ActionStatus, AssessmentStore, CommentStore, MemoryStore, NewVerification, ReportAggregate,
    ReportQuery, ReportStore, SqlStore,
};

/// Generate a unique ID using ULID.
pub fn generate_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}
