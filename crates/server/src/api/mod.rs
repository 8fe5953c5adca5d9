//! JSON procedure layer.
//!
//! Every procedure declares three things: an access class (the extractor it
//! takes - none for public, [`RequireAuth`] for authenticated,
//! [`RequireAdmin`] for admin), an input shape with validation that runs
//! before any side effect, and a typed output. Failures are structured
//! `{ code, message, fields? }` bodies; see [`error`].
//!
//! # Procedures
//!
//! ```text
//! # Comments
//! GET    /api/comments                    - List comments on a post (public)
//! POST   /api/comments                    - Create a comment (authenticated)
//! PATCH  /api/comments/{id}               - Edit own comment (authenticated; admins may edit any)
//! DELETE /api/comments/{id}               - Delete own comment (authenticated; admins may delete any)
//!
//! # Reports
//! POST   /api/reports                     - Report a comment (authenticated)
//!
//! # Account
//! GET    /api/me                          - Resolved session view (public)
//! POST   /api/onboarding/complete         - Mark onboarding done (authenticated)
//! POST   /api/auth/sign-out               - Drop cached resolution (public, idempotent)
//!
//! # Admin
//! GET    /api/admin/members               - List members (admin)
//! POST   /api/admin/members/{id}/role     - Change a member's role (admin)
//! GET    /api/admin/reports               - List reports (admin)
//! POST   /api/admin/reports/{id}/review   - Resolve or dismiss a report (admin)
//! ```

pub mod account;
pub mod admin;
pub mod comments;
pub mod error;
pub mod reports;

use axum::{
    Router,
    routing::{get, post},
};

use crate::api::error::{ApiError, ErrorCode, FieldError};
use crate::auth::SessionView;
use crate::models::User;
use crate::state::AppState;

/// Create the procedure router, nested under `/api` by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments", get(comments::list).post(comments::create))
        .route(
            "/comments/{id}",
            axum::routing::patch(comments::update).delete(comments::remove),
        )
        .route("/reports", post(reports::create))
        .route("/me", get(account::me))
        .route("/onboarding/complete", post(account::complete_onboarding))
        .route("/auth/sign-out", post(account::sign_out))
        .route("/admin/members", get(admin::list_members))
        .route("/admin/members/{id}/role", post(admin::set_role))
        .route("/admin/reports", get(reports::list))
        .route("/admin/reports/{id}/review", post(reports::review))
}

/// The member record of an authenticated view.
///
/// An authenticated view without a mirror row means lazy provisioning
/// failed earlier in this request; procedures that write on the member's
/// behalf cannot proceed without the row.
pub(crate) fn current_member(view: &SessionView) -> Result<&User, ApiError> {
    view.user()
        .ok_or_else(|| ApiError::new(ErrorCode::Internal, "member record not yet provisioned"))
}

/// Collects field-level validation errors for one input.
///
/// Checks run eagerly and accumulate, so a rejection names every offending
/// field at once. [`FieldChecks::finish`] must be called before the handler
/// touches storage - validation failures must leave no side effects.
#[derive(Default)]
pub(crate) struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Require `value` to be `min..=max` characters long.
    pub(crate) fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let chars = value.chars().count();
        if chars < min {
            self.errors.push(FieldError::new(
                field,
                format!("must be at least {min} character{}", plural(min)),
            ));
        } else if chars > max {
            self.errors.push(FieldError::new(
                field,
                format!("must be at most {max} character{}", plural(max)),
            ));
        }
    }

    /// Reject if any check failed.
    pub(crate) fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::bad_request(self.errors))
        }
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_field_checks_pass_within_bounds() {
        let mut checks = FieldChecks::new();
        checks.length("content", "hello", 1, 10);
        assert!(checks.finish().is_ok());
    }

    #[test]
    fn test_field_checks_accumulate_all_offending_fields() {
        let mut checks = FieldChecks::new();
        checks.length("post", "", 1, 200);
        checks.length("content", &"x".repeat(3000), 1, 2000);
        let err = checks.finish().unwrap_err();

        assert_eq!(err.code, ErrorCode::BadRequest);
        let fields: Vec<&str> = err.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["post", "content"]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut checks = FieldChecks::new();
        // Four characters, more than four bytes.
        checks.length("content", "héllö", 1, 5);
        assert!(checks.finish().is_ok());
    }
}
