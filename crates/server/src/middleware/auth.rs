//! Authentication extractors.
//!
//! Extractors resolve the inbound credential into a [`SessionView`] and run
//! the authorization gate before the handler executes. Requests under
//! `/api/` are the procedure surface: they resolve through the cached entry
//! point and fail with structured rejections. Everything else is the page
//! surface: fresh resolution, failures redirect.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::api::error::ApiError;
use crate::auth::SessionView;
use crate::auth::policy::{Decision, Policy, Surface, authorize};
use crate::state::AppState;

/// Extractor that requires a valid session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(view): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", view.identity().map_or("member", |i| &i.name))
/// }
/// ```
pub struct RequireAuth(pub SessionView);

/// Extractor that requires a valid session of an onboarded member.
pub struct RequireOnboarded(pub SessionView);

/// Extractor that requires a valid session of an admin.
pub struct RequireAdmin(pub SessionView);

/// Rejection for a failed gate check.
///
/// Carries the gate's non-allow decision; page requests turn into
/// redirects, procedure calls into structured rejections.
pub struct GateRejection(Decision);

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self.0 {
            Decision::Allow => {
                // A rejection is only built from non-allow decisions.
                ApiError::from_code(crate::api::error::ErrorCode::Internal).into_response()
            }
            Decision::Redirect(target) => Redirect::to(target).into_response(),
            Decision::Reject(code) => ApiError::from_code(code).into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, Policy::Authenticated).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireOnboarded {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, Policy::Onboarded).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        gate(parts, state, Policy::Admin).await.map(Self)
    }
}

/// Extractor that resolves the session without gating.
///
/// Unlike [`RequireAuth`], this never rejects; anonymous requests get the
/// anonymous view.
pub struct OptionalAuth(pub SessionView);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let view = resolve(parts, state).await;
        Ok(Self(view))
    }
}

/// Extractor for the raw inbound credential.
///
/// Sign-out and onboarding handlers need the credential itself to
/// invalidate the cached resolution for it.
pub struct Credential(pub Option<String>);

impl FromRequestParts<AppState> for Credential {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_credential(
            parts,
            &state.config().identity.cookie_name,
        )))
    }
}

/// Run the gate for one policy against the resolved view.
async fn gate(
    parts: &Parts,
    state: &AppState,
    policy: Policy,
) -> Result<SessionView, GateRejection> {
    let view = resolve(parts, state).await;
    let surface = surface_of(parts);
    match authorize(&view, policy, surface) {
        Decision::Allow => Ok(view),
        decision => Err(GateRejection(decision)),
    }
}

/// Resolve the session through the entry point matching the surface:
/// cached for procedures, fresh for pages.
async fn resolve(parts: &Parts, state: &AppState) -> SessionView {
    let credential = extract_credential(parts, &state.config().identity.cookie_name);
    match surface_of(parts) {
        Surface::Procedure => state.resolver().resolve_cached(credential.as_deref()).await,
        Surface::Page => state.resolver().resolve(credential.as_deref()).await,
    }
}

fn surface_of(parts: &Parts) -> Surface {
    if parts.uri.path().starts_with("/api/") {
        Surface::Procedure
    } else {
        Surface::Page
    }
}

/// Pull the provider credential from the request: `Authorization: Bearer`
/// first (API clients), then the provider's session cookie (browsers).
fn extract_credential(parts: &Parts, cookie_name: &str) -> Option<String> {
    if let Some(bearer) = bearer_credential(parts) {
        return Some(bearer);
    }
    cookie_credential(parts, cookie_name)
}

fn bearer_credential(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

fn cookie_credential(parts: &Parts, cookie_name: &str) -> Option<String> {
    for value in parts.headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((name, credential)) = pair.trim().split_once('=')
                && name == cookie_name
                && !credential.is_empty()
            {
                return Some(credential.to_owned());
            }
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/dashboard");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_credential_wins_over_cookie() {
        let parts = parts_with_headers(&[
            ("authorization", "Bearer tok-123"),
            ("cookie", "summit_session=tok-456"),
        ]);
        assert_eq!(
            extract_credential(&parts, "summit_session").as_deref(),
            Some("tok-123")
        );
    }

    #[test]
    fn test_cookie_credential_is_found_among_other_cookies() {
        let parts =
            parts_with_headers(&[("cookie", "theme=dark; summit_session=tok-9; lang=en")]);
        assert_eq!(
            extract_credential(&parts, "summit_session").as_deref(),
            Some("tok-9")
        );
    }

    #[test]
    fn test_missing_credential_is_none() {
        let parts = parts_with_headers(&[("cookie", "theme=dark")]);
        assert_eq!(extract_credential(&parts, "summit_session"), None);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let parts =
            parts_with_headers(&[("authorization", "Bearer "), ("cookie", "summit_session=")]);
        assert_eq!(extract_credential(&parts, "summit_session"), None);
    }

    #[test]
    fn test_surface_selection() {
        let api = Request::builder()
            .uri("/api/comments")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(surface_of(&api), Surface::Procedure);

        let page = Request::builder()
            .uri("/dashboard")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(surface_of(&page), Surface::Page);
    }
}
