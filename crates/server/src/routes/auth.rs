//! Sign-in and sign-out page handlers.
//!
//! The identity provider owns the actual credential lifecycle; the sign-in
//! page only forwards there, and sign-out drops Summit's cached resolution
//! before sending the member home.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::middleware::{Credential, OptionalAuth};
use crate::state::AppState;

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "sign_in.html")]
pub struct SignInTemplate {
    pub sign_in_url: String,
}

/// Display the sign-in page, or skip straight to the dashboard for a
/// member who already has a session.
#[instrument(skip(state, view))]
pub async fn sign_in_page(
    OptionalAuth(view): OptionalAuth,
    State(state): State<AppState>,
) -> Response {
    if view.is_authenticated() {
        return Redirect::to("/dashboard").into_response();
    }

    SignInTemplate {
        sign_in_url: state.config().identity.sign_in_url.clone(),
    }
    .into_response()
}

/// Sign out: invalidate the cached resolution for this credential and
/// redirect home. Idempotent for anonymous callers.
#[instrument(skip(state, credential))]
pub async fn sign_out(
    Credential(credential): Credential,
    State(state): State<AppState>,
) -> Redirect {
    if let Some(credential) = credential {
        state.resolver().invalidate(&credential).await;
    }
    Redirect::to("/")
}
