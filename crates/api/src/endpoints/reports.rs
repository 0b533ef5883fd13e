//! Report endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use bytes::Bytes;
use ecowatch_common::{AppError, AppResult, Coordinates, SeverityLabel};
use ecowatch_core::{
    ActionStatus, CapturedPhoto, ConsensusSummary, CreateReportInput, CreatedReport, FeedFilter,
    ReportAggregate, ReportGroup, ReportQuery, ReportedPosition, UploadedPhoto,
};
use ecowatch_db::entities::{report::ReportType, report_verification};
use serde::{Deserialize, Serialize};

use crate::{extractors::Identity, middleware::AppState, response::ApiResponse};

/// Largest accepted verification upload.
const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

// ==================== Request/Response Types ====================

/// One verification entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub id: String,
    pub timestamp: String,
    pub description: String,
    pub photo_url: String,
    pub verified_by: String,
}

impl From<report_verification::Model> for VerificationResponse {
    fn from(v: report_verification::Model) -> Self {
        Self {
            id: v.id,
            timestamp: v.created_at.to_rfc3339(),
            description: v.description,
            photo_url: v.photo_url,
            verified_by: v.verified_by,
        }
    }
}

/// Report response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub image_url: String,
    pub label: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub icon: &'static str,
    pub impact_areas: Vec<&'static str>,
    pub severity: i32,
    pub severity_label: SeverityLabel,
    pub impact_level: &'static str,
    pub recovery_time: &'static str,
    pub location: Coordinates,
    pub location_name: String,
    pub notify_authority: bool,
    pub upvotes: i64,
    pub engagement_count: i32,
    pub verified_by: Option<String>,
    pub verifications: Vec<VerificationResponse>,
    pub action_status: Option<ActionStatus>,
    pub timestamp: String,
    pub updated_at: Option<String>,
}

impl From<ReportAggregate> for ReportResponse {
    fn from(aggregate: ReportAggregate) -> Self {
        let severity = aggregate.severity();
        let location = aggregate.location();
        let action_status = aggregate.action_status();
        let r = aggregate.report;

        Self {
            id: r.id,
            image_url: r.image_url,
            label: r.label,
            description: r.description,
            report_type: r.report_type,
            icon: r.report_type.icon(),
            impact_areas: r.report_type.impact_areas(),
            severity: r.severity,
            severity_label: severity.label(),
            impact_level: severity.impact_level(),
            recovery_time: severity.recovery_time(),
            location,
            location_name: r.location_name,
            notify_authority: r.notify_authority,
            upvotes: i64::from(r.upvotes),
            engagement_count: r.engagement_count,
            verified_by: r.verified_by,
            verifications: aggregate
                .verifications
                .into_iter()
                .map(Into::into)
                .collect(),
            action_status,
            timestamp: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Create report response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReportResponse {
    pub report: ReportResponse,
    pub similar_reports_count: u64,
}

impl From<CreatedReport> for CreatedReportResponse {
    fn from(created: CreatedReport) -> Self {
        Self {
            report: created.report.into(),
            similar_reports_count: created.similar_reports_count,
        }
    }
}

/// A feed entry: the seed report with group totals.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntryResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    pub group_size: usize,
    pub member_ids: Vec<String>,
}

impl From<ReportGroup> for FeedEntryResponse {
    fn from(group: ReportGroup) -> Self {
        let description = group.display_description();
        let upvotes = group.total_upvotes();
        let member_ids = group.member_ids();
        let group_size = group.len();

        let mut report = ReportResponse::from(group.seed().clone());
        report.upvotes = upvotes;
        report.description = Some(description).filter(|d| !d.is_empty());

        Self {
            report,
            group_size,
            member_ids,
        }
    }
}

/// Request naming one report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportIdRequest {
    pub report_id: String,
}

/// Submit assessment request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessRequest {
    pub report_id: String,
    pub severity: i32,
    pub submitter_identity: String,
}

// ==================== Handlers ====================

/// Submit a new report.
async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<CreatedReportResponse>> {
    let created = state.report_service.create(input).await?;
    Ok(ApiResponse::created(created.into()))
}

/// Show a report.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<ReportIdRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.get(&req.report_id).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// List reports newest first.
async fn list(
    State(state): State<AppState>,
    Json(query): Json<ReportQuery>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let reports = state.report_service.list(&query).await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Grouped feed.
async fn feed(
    State(state): State<AppState>,
    Json(filter): Json<FeedFilter>,
) -> AppResult<ApiResponse<Vec<FeedEntryResponse>>> {
    let groups = state.report_service.feed(&filter).await?;
    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

/// Confirm a report without a photo.
async fn upvote(
    State(state): State<AppState>,
    Json(req): Json<ReportIdRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.upvote(&req.report_id).await?;
    Ok(ApiResponse::ok(report.into()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.to_string())
}

fn parse_coordinate(value: Option<String>, field: &str) -> AppResult<f64> {
    let value = value.ok_or_else(|| AppError::Validation(format!("{field} is required")))?;
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}

/// Verify a report in person.
///
/// Multipart fields: `reportId`, `latitude`, `longitude`, `photo` and an
/// optional `description`.
async fn verify(
    State(state): State<AppState>,
    Identity(identity): Identity,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ReportResponse>> {
    let mut report_id: Option<String> = None;
    let mut description: Option<String> = None;
    let mut latitude: Option<String> = None;
    let mut longitude: Option<String> = None;
    let mut photo: Option<CapturedPhoto> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "photo" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes: Bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    photo = Some(CapturedPhoto {
                        bytes,
                        content_type,
                    });
                }
            }
            "reportId" => report_id = Some(field.text().await.map_err(multipart_error)?),
            "description" => description = Some(field.text().await.map_err(multipart_error)?),
            "latitude" => latitude = Some(field.text().await.map_err(multipart_error)?),
            "longitude" => longitude = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let report_id = report_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("reportId is required".to_string()))?;
    let photo = photo.ok_or_else(|| AppError::Validation("photo is required".to_string()))?;
    let position = Coordinates::new(
        parse_coordinate(latitude, "latitude")?,
        parse_coordinate(longitude, "longitude")?,
    );
    if !position.is_valid() {
        return Err(AppError::Validation(
            "latitude/longitude out of range".to_string(),
        ));
    }

    let report = state
        .verification_service
        .verify(
            &report_id,
            &identity,
            &ReportedPosition(position),
            &UploadedPhoto(photo),
            description,
        )
        .await?;

    Ok(ApiResponse::ok(report.into()))
}

/// Submit a community severity assessment.
async fn assess(
    State(state): State<AppState>,
    Json(req): Json<AssessRequest>,
) -> AppResult<ApiResponse<ConsensusSummary>> {
    let summary = state
        .consensus_service
        .submit(&req.report_id, &req.submitter_identity, req.severity)
        .await?;
    Ok(ApiResponse::ok(summary))
}

/// Current consensus for a report.
async fn consensus(
    State(state): State<AppState>,
    Json(req): Json<ReportIdRequest>,
) -> AppResult<ApiResponse<ConsensusSummary>> {
    let summary = state.consensus_service.get(&req.report_id).await?;
    Ok(ApiResponse::ok(summary))
}

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/feed", post(feed))
        .route("/upvote", post(upvote))
        .route(
            "/verify",
            post(verify).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
        .route("/assess", post(assess))
        .route("/consensus", post(consensus))
}
