//! Account procedures: session introspection, onboarding, sign-out.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use summit_core::{Role, UserId};

use super::current_member;
use crate::api::error::ApiError;
use crate::auth::SessionView;
use crate::db::UserRepository;
use crate::middleware::{Credential, OptionalAuth, RequireAuth};
use crate::models::User;
use crate::state::AppState;

/// The caller's own member record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSelfDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarded_at: Option<DateTime<Utc>>,
}

impl From<&User> for MemberSelfDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.to_string(),
            image: user.image.clone(),
            role: user.role,
            onboarded_at: user.onboarded_at,
        }
    }
}

/// The resolved session, as exposed to interactive clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub authenticated: bool,
    pub onboarded: bool,
    pub admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<MemberSelfDto>,
}

impl From<&SessionView> for SessionDto {
    fn from(view: &SessionView) -> Self {
        Self {
            authenticated: view.is_authenticated(),
            onboarded: view.is_onboarded(),
            admin: view.is_admin(),
            member: view.user().map(MemberSelfDto::from),
        }
    }
}

/// Return the caller's resolved session view. Public.
///
/// Anonymous callers get all-false flags rather than a rejection; no
/// session is a state, not an error.
#[instrument(skip(view))]
pub async fn me(OptionalAuth(view): OptionalAuth) -> Json<SessionDto> {
    Json(SessionDto::from(&view))
}

/// Mark the caller as onboarded. Authenticated.
///
/// Idempotent; the first completion timestamp wins. The caller's cached
/// resolution is invalidated so the new state is visible immediately.
///
/// # Errors
///
/// Returns `INTERNAL` if the member record cannot be updated.
#[instrument(skip(state, view, credential))]
pub async fn complete_onboarding(
    RequireAuth(view): RequireAuth,
    Credential(credential): Credential,
    State(state): State<AppState>,
) -> Result<Json<MemberSelfDto>, ApiError> {
    let member = current_member(&view)?;
    let updated = UserRepository::new(state.pool())
        .set_onboarded(&member.id)
        .await?;

    if let Some(credential) = credential {
        state.resolver().invalidate(&credential).await;
    }

    Ok(Json(MemberSelfDto::from(&updated)))
}

/// Drop the caller's cached resolution. Public, idempotent.
///
/// The provider owns the credential itself; this procedure only guarantees
/// that Summit stops honoring the cached view at once instead of waiting
/// out the staleness window.
#[instrument(skip(state, credential))]
pub async fn sign_out(
    Credential(credential): Credential,
    State(state): State<AppState>,
) -> StatusCode {
    if let Some(credential) = credential {
        state.resolver().invalidate(&credential).await;
    }
    StatusCode::NO_CONTENT
}
