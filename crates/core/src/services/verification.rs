//! In-person verification of a report.
//!
//! A verification attempt walks through
//! `Location -> Photo -> Description -> Submitting -> Done | Failed`.
//! The only backward step is `Description -> Photo` (retake), and a failed
//! attempt can restart from `Location`. [`transition`] is the pure state
//! function; [`VerificationFlow`] drives it with injected [`Locator`] and
//! [`Camera`] capabilities and performs the commit.
//!
//! Nothing is persisted before `Submitting`, so dropping a flow at any earlier
//! state leaves no trace.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use ecowatch_common::{AcquisitionKind, AppError, AppResult, Coordinates, get_metrics};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::storage::{StorageService, verification_photo_key};
use crate::generate_id;
use crate::store::{NewVerification, ReportAggregate, ReportStoreService};

/// Maximum distance between verifier and report, inclusive.
pub const PROXIMITY_RADIUS_KM: f64 = 0.5;

/// Description stored when the verifier leaves it blank.
pub const DEFAULT_DESCRIPTION: &str = "Verified in person";

/// A photo handed over by the camera capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPhoto {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Why the last location check did not advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationRejection {
    TooFar { distance_km: f64 },
    Acquisition(AcquisitionKind),
}

impl From<LocationRejection> for AppError {
    fn from(rejection: LocationRejection) -> Self {
        match rejection {
            LocationRejection::TooFar { distance_km } => Self::Proximity { distance_km },
            LocationRejection::Acquisition(kind) => Self::Acquisition(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationState {
    Location {
        last_rejection: Option<LocationRejection>,
    },
    Photo {
        distance_km: f64,
    },
    Description {
        distance_km: f64,
        photo: CapturedPhoto,
    },
    Submitting {
        distance_km: f64,
        photo: CapturedPhoto,
        description: String,
    },
    Done {
        report: Box<ReportAggregate>,
    },
    Failed {
        reason: String,
    },
}

impl VerificationState {
    /// Initial state of every attempt.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Location {
            last_rejection: None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Location { .. } => "location",
            Self::Photo { .. } => "photo",
            Self::Description { .. } => "description",
            Self::Submitting { .. } => "submitting",
            Self::Done { .. } => "done",
            Self::Failed { .. } => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub enum VerificationEvent {
    PositionAcquired(Coordinates),
    PositionFailed(AcquisitionKind),
    PhotoCaptured(CapturedPhoto),
    Retake,
    Submit { description: Option<String> },
    CommitSucceeded(Box<ReportAggregate>),
    CommitFailed(String),
    Restart,
}

impl VerificationEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::PositionAcquired(_) => "position-acquired",
            Self::PositionFailed(_) => "position-failed",
            Self::PhotoCaptured(_) => "photo-captured",
            Self::Retake => "retake",
            Self::Submit { .. } => "submit",
            Self::CommitSucceeded(_) => "commit-succeeded",
            Self::CommitFailed(_) => "commit-failed",
            Self::Restart => "restart",
        }
    }
}

/// An event arrived in a state that does not accept it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot handle {event} while in {state} state")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl From<InvalidTransition> for AppError {
    fn from(err: InvalidTransition) -> Self {
        Self::BadRequest(err.to_string())
    }
}

fn normalize_description(description: Option<String>) -> String {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

/// Pure transition function. `target` is the report's location.
pub fn transition(
    state: &VerificationState,
    target: Coordinates,
    event: VerificationEvent,
) -> Result<VerificationState, InvalidTransition> {
    use VerificationEvent as E;
    use VerificationState as S;

    let next = match (state, event) {
        (S::Location { .. }, E::PositionAcquired(position)) => {
            let distance_km = position.distance_to(&target);
            if distance_km <= PROXIMITY_RADIUS_KM {
                S::Photo { distance_km }
            } else {
                S::Location {
                    last_rejection: Some(LocationRejection::TooFar { distance_km }),
                }
            }
        }
        (S::Location { .. }, E::PositionFailed(kind)) => S::Location {
            last_rejection: Some(LocationRejection::Acquisition(kind)),
        },
        (S::Photo { distance_km }, E::PhotoCaptured(photo)) => S::Description {
            distance_km: *distance_km,
            photo,
        },
        (S::Description { distance_km, .. }, E::Retake) => S::Photo {
            distance_km: *distance_km,
        },
        (S::Description { distance_km, photo }, E::Submit { description }) => S::Submitting {
            distance_km: *distance_km,
            photo: photo.clone(),
            description: normalize_description(description),
        },
        (S::Submitting { .. }, E::CommitSucceeded(report)) => S::Done { report },
        (S::Submitting { .. }, E::CommitFailed(reason)) => S::Failed { reason },
        (S::Failed { .. }, E::Restart) => S::initial(),
        (state, event) => {
            return Err(InvalidTransition {
                state: state.name(),
                event: event.name(),
            });
        }
    };

    Ok(next)
}

/// Source of the verifier's current position.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, AcquisitionKind>;
}

/// Source of the verification photo.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture(&self) -> Result<CapturedPhoto, AcquisitionKind>;
}

/// Locator answering with a position the caller already reported.
#[derive(Debug, Clone, Copy)]
pub struct ReportedPosition(pub Coordinates);

#[async_trait]
impl Locator for ReportedPosition {
    async fn current_position(&self) -> Result<Coordinates, AcquisitionKind> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(AcquisitionKind::Unavailable)
        }
    }
}

/// Camera answering with a photo the caller already uploaded.
#[derive(Debug, Clone)]
pub struct UploadedPhoto(pub CapturedPhoto);

#[async_trait]
impl Camera for UploadedPhoto {
    async fn capture(&self) -> Result<CapturedPhoto, AcquisitionKind> {
        if self.0.bytes.is_empty() {
            Err(AcquisitionKind::Unavailable)
        } else {
            Ok(self.0.clone())
        }
    }
}

/// Verification service for business logic.
#[derive(Clone)]
pub struct VerificationService {
    reports: ReportStoreService,
    storage: StorageService,
}

impl VerificationService {
    /// Create a new verification service.
    #[must_use]
    pub fn new(reports: ReportStoreService, storage: StorageService) -> Self {
        Self { reports, storage }
    }

    /// Start an attempt by `identity` against an existing report.
    pub async fn begin(&self, report_id: &str, identity: &str) -> AppResult<VerificationFlow> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(AppError::Validation("identity is required".to_string()));
        }

        let report = self
            .reports
            .find(report_id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(report_id.to_string()))?;

        Ok(VerificationFlow {
            service: self.clone(),
            report_id: report.report.id.clone(),
            target: report.location(),
            identity: identity.to_string(),
            state: VerificationState::initial(),
        })
    }

    /// Run a whole attempt in one go.
    pub async fn verify(
        &self,
        report_id: &str,
        identity: &str,
        locator: &dyn Locator,
        camera: &dyn Camera,
        description: Option<String>,
    ) -> AppResult<ReportAggregate> {
        let mut flow = self.begin(report_id, identity).await?;
        flow.check_location(locator).await?;
        flow.capture_photo(camera).await?;
        flow.submit(description).await
    }

    /// Upload the photo and append the verification as one unit. The photo is
    /// removed again when the append fails.
    async fn commit(
        &self,
        report_id: &str,
        identity: &str,
        photo: &CapturedPhoto,
        description: String,
    ) -> AppResult<ReportAggregate> {
        let id = generate_id();
        let key = verification_photo_key(report_id, &id, &photo.content_type);

        self.storage.save(&key, &photo.bytes).await?;

        let verification = NewVerification {
            id,
            description,
            photo_url: self.storage.url(&key),
            verified_by: identity.to_string(),
            created_at: Utc::now(),
        };

        let outcome = match self.reports.append_verification(report_id, verification).await {
            Ok(Some(report)) => Ok(report),
            Ok(None) => Err(AppError::ReportNotFound(report_id.to_string())),
            Err(e) => {
                get_metrics().record_store_error();
                Err(e)
            }
        };

        if outcome.is_err() {
            if let Err(e) = self.storage.delete(&key).await {
                warn!(error = %e, key = %key, "Failed to remove orphaned verification photo");
            }
        }

        outcome
    }
}

/// One caller's verification attempt.
pub struct VerificationFlow {
    service: VerificationService,
    report_id: String,
    target: Coordinates,
    identity: String,
    state: VerificationState,
}

impl VerificationFlow {
    #[must_use]
    pub const fn state(&self) -> &VerificationState {
        &self.state
    }

    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    fn apply(&mut self, event: VerificationEvent) -> AppResult<()> {
        self.state = transition(&self.state, self.target, event)?;
        Ok(())
    }

    /// Acquire a position and run the proximity gate. May be repeated any
    /// number of times while in the location state.
    ///
    /// Returns the distance to the report when the gate passes.
    pub async fn check_location(&mut self, locator: &dyn Locator) -> AppResult<f64> {
        if !matches!(self.state, VerificationState::Location { .. }) {
            return Err(InvalidTransition {
                state: self.state.name(),
                event: "position-acquired",
            }
            .into());
        }

        let event = match locator.current_position().await {
            Ok(position) => VerificationEvent::PositionAcquired(position),
            Err(kind) => VerificationEvent::PositionFailed(kind),
        };
        self.apply(event)?;

        match &self.state {
            VerificationState::Photo { distance_km } => Ok(*distance_km),
            VerificationState::Location {
                last_rejection: Some(rejection),
            } => {
                if let LocationRejection::TooFar { distance_km } = rejection {
                    get_metrics().record_proximity_rejection();
                    debug!(
                        report_id = %self.report_id,
                        distance_km = *distance_km,
                        "Verification rejected by proximity gate"
                    );
                }
                Err((*rejection).into())
            }
            other => Err(AppError::Internal(format!(
                "unexpected state after location check: {}",
                other.name()
            ))),
        }
    }

    /// Take the photo. Camera failures keep the flow in the photo state.
    pub async fn capture_photo(&mut self, camera: &dyn Camera) -> AppResult<()> {
        if !matches!(self.state, VerificationState::Photo { .. }) {
            return Err(InvalidTransition {
                state: self.state.name(),
                event: "photo-captured",
            }
            .into());
        }

        let photo = camera.capture().await.map_err(AppError::Acquisition)?;
        self.apply(VerificationEvent::PhotoCaptured(photo))
    }

    /// Discard the captured photo and go back to the photo state.
    pub fn retake(&mut self) -> AppResult<()> {
        self.apply(VerificationEvent::Retake)
    }

    /// Commit the verification. On failure the flow ends in the failed state
    /// and the report is left untouched.
    pub async fn submit(&mut self, description: Option<String>) -> AppResult<ReportAggregate> {
        self.apply(VerificationEvent::Submit { description })?;

        let VerificationState::Submitting {
            photo, description, ..
        } = &self.state
        else {
            return Err(AppError::Internal("submit did not reach submitting state".to_string()));
        };

        let result = self
            .service
            .commit(&self.report_id, &self.identity, photo, description.clone())
            .await;

        match result {
            Ok(report) => {
                get_metrics().record_verification(true);
                info!(
                    report_id = %self.report_id,
                    verified_by = %self.identity,
                    upvotes = report.report.upvotes,
                    verifications = report.verifications.len(),
                    "Verification committed"
                );
                self.apply(VerificationEvent::CommitSucceeded(Box::new(report.clone())))?;
                Ok(report)
            }
            Err(e) => {
                get_metrics().record_verification(false);
                warn!(report_id = %self.report_id, error = %e, "Verification commit failed");
                self.apply(VerificationEvent::CommitFailed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Start over from the location check after a failed commit.
    pub fn restart(&mut self) -> AppResult<()> {
        self.apply(VerificationEvent::Restart)
    }

    /// Abandon the attempt. Nothing has been written unless a commit was made.
    pub fn cancel(self) {
        debug!(report_id = %self.report_id, state = self.state.name(), "Verification abandoned");
    }
}
