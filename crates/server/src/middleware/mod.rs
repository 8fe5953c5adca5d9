//! Request middleware and extractors.

pub mod auth;

pub use auth::{Credential, OptionalAuth, RequireAdmin, RequireAuth, RequireOnboarded};
