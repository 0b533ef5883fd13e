//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod report;
pub mod report_verification;
pub mod severity_assessment;

pub use comment::Entity as Comment;
pub use report::Entity as Report;
pub use report_verification::Entity as ReportVerification;
pub use severity_assessment::Entity as SeverityAssessment;
