//! Member dashboard.

use askama::Template;
use askama_web::WebTemplate;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireOnboarded;

/// Member dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
    pub role: String,
    pub admin: bool,
    pub member_since: String,
}

/// Display the member dashboard. Requires an onboarded member; the gate
/// redirects everyone else.
#[instrument(skip(view))]
pub async fn index(RequireOnboarded(view): RequireOnboarded) -> Result<DashboardTemplate> {
    let user = view
        .user()
        .ok_or_else(|| AppError::Internal("member record not yet provisioned".to_owned()))?;

    Ok(DashboardTemplate {
        name: user.name.clone(),
        role: user.role.to_string(),
        admin: view.is_admin(),
        member_since: user.created_at.format("%B %e, %Y").to_string(),
    })
}
