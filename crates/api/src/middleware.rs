//! API middleware.

use std::sync::Arc;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use ecowatch_common::metrics::{Timer, get_metrics};
use ecowatch_core::{
    AssessmentStore, CommentService, CommentStore, ConsensusService, ReportService, ReportStore,
    StorageService, VerificationService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub report_service: ReportService,
    pub verification_service: VerificationService,
    pub consensus_service: ConsensusService,
    pub comment_service: CommentService,
    /// Bearer token for administrative routes; `None` disables them.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wire every service over one store.
    pub fn new<S>(store: S, storage: StorageService, admin_token: Option<String>) -> Self
    where
        S: ReportStore + CommentStore + AssessmentStore + Clone + 'static,
    {
        let reports = Arc::new(store.clone());
        let assessments = Arc::new(store.clone());
        Self {
            report_service: ReportService::new(reports.clone(), assessments.clone()),
            verification_service: VerificationService::new(reports.clone(), storage),
            consensus_service: ConsensusService::new(assessments),
            comment_service: CommentService::new(reports, Arc::new(store)),
            admin_token: admin_token
                .filter(|t| !t.trim().is_empty())
                .map(Arc::from),
        }
    }
}

/// Count requests and their latency by status class.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let metrics = get_metrics();
    let timer = Timer::start();
    metrics.start_request();

    let response = next.run(req).await;

    metrics.end_request();
    metrics.record_http_request(response.status().as_u16(), timer.elapsed());
    response
}
