//! Comment procedures.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use summit_core::{CommentId, Role, UserId};

use super::{FieldChecks, current_member};
use crate::api::error::ApiError;
use crate::db::{CommentRepository, Page, clamp_limit};
use crate::middleware::RequireAuth;
use crate::models::{Comment, User};
use crate::state::AppState;

/// Maximum length of a post slug, in characters.
const POST_SLUG_MAX: usize = 200;

/// Maximum length of a comment body, in characters.
const CONTENT_MAX: usize = 2000;

/// Comment as returned by the procedure layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: CommentId,
    pub post: String,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post: comment.post_slug,
            author_id: comment.author_id,
            author_name: comment.author_name,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Query for listing comments on a post.
#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    /// Slug of the post.
    pub post: String,
    /// Requested page size, clamped server-side.
    pub limit: Option<i64>,
    /// Id of the first comment of the requested page.
    pub cursor: Option<CommentId>,
}

/// List comments on a post, newest first. Public.
///
/// # Errors
///
/// Returns `BAD_REQUEST` if the post slug is out of bounds.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<Json<Page<CommentDto>>, ApiError> {
    let mut checks = FieldChecks::new();
    checks.length("post", &query.post, 1, POST_SLUG_MAX);
    checks.finish()?;

    let limit = clamp_limit(query.limit);
    let page = CommentRepository::new(state.pool())
        .list_for_post(&query.post, limit, query.cursor)
        .await?;

    Ok(Json(page.map(CommentDto::from)))
}

/// Input for creating a comment.
#[derive(Debug, Deserialize)]
pub struct CreateCommentInput {
    /// Slug of the post being commented on.
    pub post: String,
    /// Comment body.
    pub content: String,
}

/// Create a comment. Authenticated.
///
/// # Errors
///
/// Returns `BAD_REQUEST` with field errors if the input is out of bounds.
#[instrument(skip(state, view, input))]
pub async fn create(
    RequireAuth(view): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> Result<(StatusCode, Json<CommentDto>), ApiError> {
    let mut checks = FieldChecks::new();
    checks.length("post", &input.post, 1, POST_SLUG_MAX);
    checks.length("content", &input.content, 1, CONTENT_MAX);
    checks.finish()?;

    let author = current_member(&view)?;
    let comments = CommentRepository::new(state.pool());
    let id = comments.create(&input.post, &author.id, &input.content).await?;

    let comment = comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Input for editing a comment.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentInput {
    /// Replacement body.
    pub content: String,
}

/// Edit a comment. Authenticated; only the author or an admin may edit.
///
/// Validation runs before the comment is even fetched, so a rejected edit
/// leaves the stored comment untouched.
///
/// # Errors
///
/// Returns `BAD_REQUEST` for out-of-bounds content, `NOT_FOUND` for an
/// unknown id, `UNAUTHORIZED` when the caller may not edit this comment.
#[instrument(skip(state, view, input))]
pub async fn update(
    RequireAuth(view): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
    Json(input): Json<UpdateCommentInput>,
) -> Result<Json<CommentDto>, ApiError> {
    let mut checks = FieldChecks::new();
    checks.length("content", &input.content, 1, CONTENT_MAX);
    checks.finish()?;

    let member = current_member(&view)?;
    let comments = CommentRepository::new(state.pool());

    let comment = comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;
    ensure_can_modify(member, &comment)?;

    comments.update_content(id, &input.content).await?;

    let updated = comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;
    Ok(Json(updated.into()))
}

/// Delete a comment. Authenticated; only the author or an admin may delete.
///
/// # Errors
///
/// Returns `NOT_FOUND` for an unknown id, `UNAUTHORIZED` when the caller
/// may not delete this comment.
#[instrument(skip(state, view))]
pub async fn remove(
    RequireAuth(view): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<CommentId>,
) -> Result<StatusCode, ApiError> {
    let member = current_member(&view)?;
    let comments = CommentRepository::new(state.pool());

    let comment = comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment"))?;
    ensure_can_modify(member, &comment)?;

    if !comments.delete(id).await? {
        return Err(ApiError::not_found("comment"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Authors may modify their own comments; admins may modify any.
///
/// The rejection is the same `UNAUTHORIZED` an unauthenticated caller
/// would get; whose comment it is stays undisclosed.
fn ensure_can_modify(member: &User, comment: &Comment) -> Result<(), ApiError> {
    if member.role == Role::Admin || member.id == comment.author_id {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use summit_core::Email;

    fn member(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(id),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            image: None,
            role,
            onboarded_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment_by(author: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::generate(),
            post_slug: "opening-keynote".to_owned(),
            author_id: UserId::new(author),
            author_name: "Ada".to_owned(),
            content: "Great talk!".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_author_can_modify_own_comment() {
        let author = member("u1", Role::Member);
        assert!(ensure_can_modify(&author, &comment_by("u1")).is_ok());
    }

    #[test]
    fn test_other_member_cannot_modify() {
        let other = member("u2", Role::Member);
        let err = ensure_can_modify(&other, &comment_by("u1")).unwrap_err();
        assert_eq!(err.code, crate::api::error::ErrorCode::Unauthorized);
    }

    #[test]
    fn test_admin_can_modify_any_comment() {
        let admin = member("u2", Role::Admin);
        assert!(ensure_can_modify(&admin, &comment_by("u1")).is_ok());
    }

    #[test]
    fn test_oversized_content_is_a_field_error() {
        let mut checks = FieldChecks::new();
        checks.length("content", &"x".repeat(CONTENT_MAX + 1), 1, CONTENT_MAX);
        let err = checks.finish().unwrap_err();
        assert_eq!(err.fields.len(), 1);
        assert_eq!(err.fields.first().unwrap().field, "content");
    }
}
