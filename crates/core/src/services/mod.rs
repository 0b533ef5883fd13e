//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod consensus;
pub mod feed;
pub mod report;
pub mod similarity;
pub mod storage;
pub mod verification;

pub use comment::{CommentService, CreateCommentInput};
pub use consensus::{CommunityAssessment, ConsensusService, ConsensusSummary};
pub use feed::{FeedFilter, ReportStatus};
pub use report::{CreateReportInput, CreatedReport, ReportService};
pub use similarity::{ReportGroup, SIMILARITY_TOLERANCE_DEG, count_similar, group_for_feed};
pub use storage::{LocalStorage, NoOpStorage, StorageBackend, StorageService};
pub use verification::{
    Camera, CapturedPhoto, InvalidTransition, LocationRejection, Locator, PROXIMITY_RADIUS_KM,
    ReportedPosition, UploadedPhoto, VerificationEvent, VerificationFlow, VerificationService,
    VerificationState, transition,
};
