use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, Request, StatusCode, header},
    middleware::{Next, from_fn},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use claims_view::{
    AdjudicationAction, Attachment, ClaimDetail, ClaimFilter, ClaimStatus, ClaimSubmission,
    DashboardView, table::DEFAULT_PAGE_SIZE,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::api::Credentials;
use crate::error::{ApiError, PortalError};
use crate::portal::{DownloadedReport, Portal, Screen, WorkQueueScreen};
use crate::session::Role;

type HandlerError = (StatusCode, Json<Value>);
type HandlerResult<T> = Result<Json<T>, HandlerError>;

fn error_body(status: StatusCode, message: &str) -> HandlerError {
    (status, Json(json!({ "error": message })))
}

fn bad_request_error(message: &str) -> HandlerError {
    error_body(StatusCode::BAD_REQUEST, message)
}

/// Unreadable bodies and query strings get the same JSON error shape as
/// every other failure.
fn json_rejection(rejection: JsonRejection) -> HandlerError {
    let message = rejection.body_text();
    warn!(error = %message, "Malformed request body");
    bad_request_error(&message)
}

fn query_rejection(rejection: QueryRejection) -> HandlerError {
    let message = rejection.body_text();
    warn!(error = %message, "Malformed query string");
    bad_request_error(&message)
}

/// Map a portal failure onto the status the browser should see.
fn portal_error(e: PortalError) -> HandlerError {
    let status = match &e {
        PortalError::Api(ApiError::NotAuthenticated | ApiError::LoginRejected) => {
            StatusCode::UNAUTHORIZED
        }
        PortalError::Api(ApiError::EmptyCredentials)
        | PortalError::InvalidRequest(_)
        | PortalError::View(_) => StatusCode::BAD_REQUEST,
        PortalError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PortalError::ClaimNotFound(_) => StatusCode::NOT_FOUND,
        PortalError::MissingIdentity(_) => StatusCode::FORBIDDEN,
        PortalError::Api(_) => StatusCode::BAD_GATEWAY,
        PortalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(status = status.as_u16(), error = %e, "Request failed");
    } else {
        warn!(status = status.as_u16(), error = %e, "Request rejected");
    }
    error_body(status, &e.to_string())
}

#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<Portal>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .route("/dashboard/hospital", get(hospital_dashboard))
        .route("/dashboard/hospital/claims/{id}", delete(delete_hospital_claim))
        .route("/dashboard/patient", get(patient_dashboard))
        .route("/dashboard/insurance", get(insurance_dashboard))
        .route("/dashboard/insurance/export", get(export_insurance_claims))
        .route("/rfi/{role}", post(submit_rfi))
        .route("/claims", get(track_claims).post(submit_claim))
        .route("/claims/{id}/progress", get(claim_progress))
        .route("/claims/{id}/report", get(claim_row_report))
        .route("/analytics", get(analytics))
        .route("/reports/{id}", get(fraud_report))
        .route("/work-queue", get(work_queue))
        .route("/work-queue/{id}/decision", post(decide))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Tag every request with a fresh correlation id, both on the request
/// headers and on the `http_request` span wrapping the handler.
async fn correlation_id_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header_value = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header_value {
        request
            .headers_mut()
            .insert("x-correlation-id", value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header_value {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> HandlerResult<Value> {
    let Json(credentials) = payload.map_err(json_rejection)?;
    let success = state
        .portal
        .login(&credentials)
        .await
        .map_err(portal_error)?;
    Ok(Json(json!({
        "role": success.role,
        "user": success.user,
    })))
}

async fn logout(State(state): State<AppState>) -> HandlerResult<Value> {
    state.portal.logout().await.map_err(portal_error)?;
    Ok(Json(json!({ "status": "logged_out" })))
}

async fn session_info(State(state): State<AppState>) -> Response {
    match state.portal.session_info().await {
        Ok(info) => Json(info).into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct TableQuery {
    #[serde(default)]
    q: String,
    status: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

impl TableQuery {
    fn filter(&self) -> ClaimFilter {
        ClaimFilter {
            query: self.q.clone(),
            status: self
                .status
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ClaimStatus::parse),
        }
    }

    fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

async fn hospital_dashboard(
    State(state): State<AppState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> HandlerResult<Screen<DashboardView>> {
    let Query(query) = query.map_err(query_rejection)?;
    let screen = state
        .portal
        .hospital_dashboard(&query.filter(), query.page(), query.page_size())
        .await
        .map_err(portal_error)?;
    Ok(Json(screen))
}

async fn delete_hospital_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> HandlerResult<Value> {
    let summary = state
        .portal
        .delete_hospital_claim(&claim_id)
        .await
        .map_err(portal_error)?;
    Ok(Json(json!({
        "deleted": claim_id,
        "summary": summary,
    })))
}

async fn patient_dashboard(State(state): State<AppState>) -> Response {
    match state.portal.patient_dashboard().await {
        Ok(screen) => Json(screen).into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

async fn insurance_dashboard(
    State(state): State<AppState>,
    query: Result<Query<TableQuery>, QueryRejection>,
) -> HandlerResult<Screen<DashboardView>> {
    let Query(query) = query.map_err(query_rejection)?;
    let screen = state
        .portal
        .insurance_dashboard(&query.filter(), query.page(), query.page_size())
        .await
        .map_err(portal_error)?;
    Ok(Json(screen))
}

async fn export_insurance_claims(State(state): State<AppState>) -> Response {
    match state.portal.insurance_csv().await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"claims.csv\"".to_string(),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

/// Base64-encoded file as posted by the browser.
#[derive(Debug, Deserialize)]
struct UploadedFile {
    name: String,
    #[serde(default = "default_mime")]
    mime: String,
    data: String,
}

fn default_mime() -> String {
    "application/octet-stream".to_string()
}

fn decode_attachments(files: Vec<UploadedFile>) -> Result<Vec<Attachment>, HandlerError> {
    files
        .into_iter()
        .map(|file| {
            let data = STANDARD.decode(file.data.as_bytes()).map_err(|e| {
                warn!(file = %file.name, error = %e, "Attachment is not valid base64");
                bad_request_error(&format!("Attachment {} is not valid base64", file.name))
            })?;
            Ok(Attachment::new(file.name, file.mime, data))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RfiRequest {
    claim_id: String,
    response: String,
    #[serde(default)]
    attachments: Vec<UploadedFile>,
}

async fn submit_rfi(
    State(state): State<AppState>,
    Path(role): Path<String>,
    payload: Result<Json<RfiRequest>, JsonRejection>,
) -> HandlerResult<Value> {
    let Json(request) = payload.map_err(json_rejection)?;
    let role: Role = role.parse().map_err(portal_error)?;
    let attachments = decode_attachments(request.attachments)?;

    state
        .portal
        .submit_rfi(role, &request.claim_id, &request.response, &attachments)
        .await
        .map_err(portal_error)?;
    info!(claim_id = %request.claim_id, role = %role, "RFI response forwarded");
    Ok(Json(json!({
        "status": "submitted",
        "claim_id": request.claim_id,
    })))
}

#[derive(Debug, Deserialize)]
struct SubmitClaimRequest {
    claim: ClaimSubmission,
    #[serde(default)]
    attachments: Vec<UploadedFile>,
}

async fn submit_claim(
    State(state): State<AppState>,
    payload: Result<Json<SubmitClaimRequest>, JsonRejection>,
) -> HandlerResult<Value> {
    let Json(request) = payload.map_err(json_rejection)?;
    let attachments = decode_attachments(request.attachments)?;
    let response = state
        .portal
        .submit_claim(&request.claim, &attachments)
        .await
        .map_err(portal_error)?;
    Ok(Json(json!({
        "success": response.success,
        "message": response.message,
        "claim_id": response.claim_id,
    })))
}

#[derive(Debug, Default, Deserialize)]
struct TrackQuery {
    #[serde(default)]
    q: String,
}

async fn track_claims(
    State(state): State<AppState>,
    query: Result<Query<TrackQuery>, QueryRejection>,
) -> HandlerResult<Vec<ClaimDetail>> {
    let Query(query) = query.map_err(query_rejection)?;
    let claims = state
        .portal
        .track_claims(&query.q)
        .await
        .map_err(portal_error)?;
    Ok(Json(claims))
}

async fn claim_progress(State(state): State<AppState>, Path(claim_id): Path<String>) -> Response {
    match state.portal.claim_progress(&claim_id).await {
        Ok(detail) => Json(detail).into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

fn text_download(report: DownloadedReport) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.file_name),
            ),
        ],
        report.body,
    )
        .into_response()
}

async fn claim_row_report(State(state): State<AppState>, Path(claim_id): Path<String>) -> Response {
    match state.portal.claim_row_report(&claim_id).await {
        Ok(report) => text_download(report),
        Err(e) => portal_error(e).into_response(),
    }
}

async fn analytics(State(state): State<AppState>) -> Response {
    match state.portal.analytics().await {
        Ok(screen) => Json(screen).into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

async fn fraud_report(State(state): State<AppState>, Path(claim_id): Path<String>) -> Response {
    match state.portal.fraud_report(&claim_id).await {
        Ok(report) => text_download(report),
        Err(e) => portal_error(e).into_response(),
    }
}

async fn work_queue(State(state): State<AppState>) -> Response {
    match state.portal.work_queue().await {
        Ok(screen) => Json(screen).into_response(),
        Err(e) => portal_error(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct DecisionRequest {
    action: AdjudicationAction,
    notes: Option<String>,
}

async fn decide(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> HandlerResult<WorkQueueScreen> {
    let Json(request) = payload.map_err(json_rejection)?;
    let queue = state
        .portal
        .decide(&claim_id, request.action, request.notes)
        .await
        .map_err(portal_error)?;
    Ok(Json(queue))
}
