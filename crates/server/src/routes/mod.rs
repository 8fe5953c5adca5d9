//! HTTP route handlers for the Summit server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Auth
//! GET  /auth/sign-in           - Sign-in page (links to the identity provider)
//! POST /auth/sign-out          - Sign out (drops cached resolution, redirects home)
//!
//! # Onboarding
//! GET  /onboarding             - Onboarding page (requires auth)
//! POST /onboarding             - Complete onboarding (requires auth)
//!
//! # Member
//! GET  /dashboard              - Member dashboard (requires onboarded member)
//!
//! # Admin
//! GET  /admin                  - Admin dashboard (requires admin)
//!
//! # Procedures
//! /api/...                     - JSON procedure layer (see crate::api)
//! ```
//!
//! Gated pages never render an error for an under-privileged request; the
//! extractors redirect to sign-in, onboarding, or home instead.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;
pub mod onboarding;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Auth pages
        .route("/auth/sign-in", get(auth::sign_in_page))
        .route("/auth/sign-out", post(auth::sign_out))
        // Onboarding
        .route("/onboarding", get(onboarding::page).post(onboarding::submit))
        // Member dashboard
        .route("/dashboard", get(dashboard::index))
        // Admin dashboard
        .route("/admin", get(admin::index))
        // Procedure layer
        .nest("/api", crate::api::router())
}
