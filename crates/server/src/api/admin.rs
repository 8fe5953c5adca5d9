//! Admin member-management procedures.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use summit_core::{Role, UserId};

use crate::api::error::ApiError;
use crate::db::{Page, UserRepository, clamp_limit};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::state::AppState;

/// Member as returned by the admin listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for MemberDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            image: user.image,
            role: user.role,
            onboarded_at: user.onboarded_at,
            created_at: user.created_at,
        }
    }
}

/// Query for the member listing.
#[derive(Debug, Deserialize)]
pub struct ListMembersQuery {
    /// Requested page size, clamped server-side.
    pub limit: Option<i64>,
    /// Id of the first member of the requested page.
    pub cursor: Option<UserId>,
}

/// List members, newest first. Admin.
///
/// # Errors
///
/// Returns `INTERNAL` if the listing query fails.
#[instrument(skip(state, _view))]
pub async fn list_members(
    RequireAdmin(_view): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListMembersQuery>,
) -> Result<Json<Page<MemberDto>>, ApiError> {
    let limit = clamp_limit(query.limit);
    let page = UserRepository::new(state.pool())
        .list(limit, query.cursor.as_ref())
        .await?;

    Ok(Json(page.map(MemberDto::from)))
}

/// Input for changing a member's role.
#[derive(Debug, Deserialize)]
pub struct SetRoleInput {
    /// The role to assign.
    pub role: Role,
}

/// Change a member's role. Admin.
///
/// Every cached resolution is dropped afterwards: the affected member's
/// credential is not known here, and a demoted admin must not keep admin
/// privileges for the remainder of a staleness window.
///
/// # Errors
///
/// Returns `NOT_FOUND` for an unknown member.
#[instrument(skip(state, view, input))]
pub async fn set_role(
    RequireAdmin(view): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(input): Json<SetRoleInput>,
) -> Result<Json<MemberDto>, ApiError> {
    let updated = UserRepository::new(state.pool())
        .set_role(&id, input.role)
        .await?;

    state.resolver().invalidate_all();
    info!(
        member = %updated.id,
        role = %updated.role,
        changed_by = view.user().map(|u| u.id.to_string()).unwrap_or_default(),
        "member role changed"
    );

    Ok(Json(updated.into()))
}
