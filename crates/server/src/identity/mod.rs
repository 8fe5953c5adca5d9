//! External identity provider boundary.
//!
//! The provider owns sign-in, sign-out, and the session credential cookie.
//! Summit never sees passwords or token internals; it forwards the inbound
//! credential to the provider's resolution endpoint and receives either an
//! identity snapshot or nothing. The [`IdentityProvider`] trait is the
//! adapter seam: internal logic depends only on the minimal field set
//! defined here, not on the provider's actual schema.

mod client;

pub use client::HttpIdentityProvider;

use async_trait::async_trait;
use thiserror::Error;

use summit_core::{Email, UserId};

/// Snapshot of an identity as resolved by the external provider.
///
/// Read-only to Summit; the provider owns and mutates these fields.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    /// The provider's stable id for this identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Primary email.
    pub email: Email,
    /// Profile image URL, if any.
    pub image: Option<String>,
}

/// Errors from the identity provider boundary.
///
/// An absent session is not an error - `identify` returns `Ok(None)` for
/// it. Errors here mean the provider could not be consulted at all
/// (transient) or answered in a shape Summit does not understand
/// (protocol).
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider was unreachable or timed out; safe to retry.
    #[error("identity provider unreachable: {0}")]
    Transient(String),

    /// The provider answered with an unexpected status or body.
    #[error("identity provider protocol error: {0}")]
    Protocol(String),
}

impl IdentityError {
    /// Short category label for log fields.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Protocol(_) => "protocol",
        }
    }
}

/// Resolves an inbound session credential to an identity snapshot.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `credential` to the identity it belongs to.
    ///
    /// Returns `Ok(None)` when the credential is absent from, expired at,
    /// or unknown to the provider - no session is a state, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the provider cannot be consulted.
    async fn identify(&self, credential: &str) -> Result<Option<ExternalIdentity>, IdentityError>;
}
