//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::{ReportRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin.html")]
pub struct AdminTemplate {
    pub name: String,
    pub open_reports: i64,
    pub member_count: i64,
}

/// Display the admin dashboard. Requires an admin; non-admins are
/// redirected to the neutral home page by the gate.
#[instrument(skip(state, view))]
pub async fn index(
    RequireAdmin(view): RequireAdmin,
    State(state): State<AppState>,
) -> Result<AdminTemplate> {
    let user = view
        .user()
        .ok_or_else(|| AppError::Internal("member record not yet provisioned".to_owned()))?;

    let open_reports = ReportRepository::new(state.pool()).count_open().await?;
    let member_count = UserRepository::new(state.pool()).count().await?;

    Ok(AdminTemplate {
        name: user.name.clone(),
        open_reports,
        member_count,
    })
}
