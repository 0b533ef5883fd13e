//! Database repositories.

mod assessment;
mod comment;
mod report;

pub use assessment::AssessmentRepository;
pub use comment::CommentRepository;
pub use report::{ReportFilter, ReportRepository};
