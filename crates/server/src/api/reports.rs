//! Report procedures: filing (member) and moderation (admin).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use summit_core::{CommentId, ReportId, ReportStatus, UserId};

use super::{FieldChecks, current_member};
use crate::api::error::ApiError;
use crate::db::{CommentRepository, Page, ReportRepository, clamp_limit};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::Report;
use crate::state::AppState;

/// Maximum length of a report reason, in characters.
const REASON_MAX: usize = 500;

/// Report as returned by the procedure layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDto {
    pub id: ReportId,
    pub comment_id: CommentId,
    pub reporter_id: UserId,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<UserId>,
}

impl From<Report> for ReportDto {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            comment_id: report.comment_id,
            reporter_id: report.reporter_id,
            reason: report.reason,
            status: report.status,
            created_at: report.created_at,
            resolved_at: report.resolved_at,
            resolved_by: report.resolved_by,
        }
    }
}

/// Input for filing a report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    /// The comment being reported.
    pub comment_id: CommentId,
    /// Why it is being reported.
    pub reason: String,
}

/// Response for a freshly filed report.
#[derive(Debug, Serialize)]
pub struct CreatedReport {
    pub id: ReportId,
}

/// File a report against a comment. Authenticated.
///
/// # Errors
///
/// Returns `BAD_REQUEST` for an out-of-bounds reason, `NOT_FOUND` if the
/// comment does not exist.
#[instrument(skip(state, view, input))]
pub async fn create(
    RequireAuth(view): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> Result<(StatusCode, Json<CreatedReport>), ApiError> {
    let mut checks = FieldChecks::new();
    checks.length("reason", &input.reason, 1, REASON_MAX);
    checks.finish()?;

    let reporter = current_member(&view)?;

    // Reporting a vanished comment is NOT_FOUND, not a silent success.
    CommentRepository::new(state.pool())
        .find_by_id(input.comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    let id = ReportRepository::new(state.pool())
        .create(input.comment_id, &reporter.id, &input.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedReport { id })))
}

/// Query for the admin report listing.
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    /// Restrict to one status.
    pub status: Option<ReportStatus>,
    /// Requested page size, clamped server-side.
    pub limit: Option<i64>,
    /// Id of the first report of the requested page.
    pub cursor: Option<ReportId>,
}

/// List reports, newest first. Admin.
///
/// # Errors
///
/// Returns `INTERNAL` if the listing query fails.
#[instrument(skip(state, _view))]
pub async fn list(
    RequireAdmin(_view): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<Page<ReportDto>>, ApiError> {
    let limit = clamp_limit(query.limit);
    let page = ReportRepository::new(state.pool())
        .list(query.status, limit, query.cursor)
        .await?;

    Ok(Json(page.map(ReportDto::from)))
}

/// Outcome an admin assigns to an open report.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    /// Moderation action taken.
    Resolved,
    /// No action warranted.
    Dismissed,
}

impl From<ReviewAction> for ReportStatus {
    fn from(action: ReviewAction) -> Self {
        match action {
            ReviewAction::Resolved => Self::Resolved,
            ReviewAction::Dismissed => Self::Dismissed,
        }
    }
}

/// Input for reviewing a report.
#[derive(Debug, Deserialize)]
pub struct ReviewReportInput {
    /// The review outcome.
    pub action: ReviewAction,
}

/// Review an open report. Admin.
///
/// # Errors
///
/// Returns `NOT_FOUND` for an unknown report, `CONFLICT` if it was already
/// reviewed (e.g. by a racing admin).
#[instrument(skip(state, view, input))]
pub async fn review(
    RequireAdmin(view): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ReportId>,
    Json(input): Json<ReviewReportInput>,
) -> Result<Json<ReportDto>, ApiError> {
    let reviewer = current_member(&view)?;
    let report = ReportRepository::new(state.pool())
        .review(id, input.action.into(), &reviewer.id)
        .await?;

    Ok(Json(report.into()))
}
