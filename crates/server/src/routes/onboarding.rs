//! Onboarding page handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{Credential, RequireAuth};
use crate::state::AppState;

/// Onboarding page template.
#[derive(Template, WebTemplate)]
#[template(path = "onboarding.html")]
pub struct OnboardingTemplate {
    pub name: String,
}

/// Display the onboarding page; members who already completed it go
/// straight to the dashboard.
#[instrument(skip(view))]
pub async fn page(RequireAuth(view): RequireAuth) -> Response {
    if view.is_onboarded() {
        return Redirect::to("/dashboard").into_response();
    }

    let name = view
        .identity()
        .map(|identity| identity.name.clone())
        .unwrap_or_default();

    OnboardingTemplate { name }.into_response()
}

/// Complete onboarding and continue to the dashboard.
///
/// Invalidates the caller's cached resolution so the new onboarding state
/// is visible to procedure calls at once.
///
/// # Errors
///
/// Returns `AppError` if the member record cannot be updated.
#[instrument(skip(state, view, credential))]
pub async fn submit(
    RequireAuth(view): RequireAuth,
    Credential(credential): Credential,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let member = view
        .user()
        .ok_or_else(|| AppError::Internal("member record not yet provisioned".to_owned()))?;

    UserRepository::new(state.pool())
        .set_onboarded(&member.id)
        .await?;

    if let Some(credential) = credential {
        state.resolver().invalidate(&credential).await;
    }

    Ok(Redirect::to("/dashboard"))
}
