//! Member domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use summit_core::{Email, Role, UserId};

/// A Summit member (domain type).
///
/// This is the local mirror of an external identity: the row is created on
/// first sight of a provider identity and keyed by the provider's id. The
/// provider owns name/email/image; Summit owns role and onboarding state.
#[derive(Debug, Clone)]
pub struct User {
    /// Member id, equal to the external identity's id.
    pub id: UserId,
    /// Display name, copied from the identity snapshot at creation.
    pub name: String,
    /// Email address, copied from the identity snapshot at creation.
    pub email: Email,
    /// Profile image URL, if the provider supplied one.
    pub image: Option<String>,
    /// Privilege level.
    pub role: Role,
    /// When the member completed onboarding, if they have.
    pub onboarded_at: Option<DateTime<Utc>>,
    /// When the mirror row was created.
    pub created_at: DateTime<Utc>,
    /// When the mirror row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the member has completed onboarding.
    #[must_use]
    pub const fn is_onboarded(&self) -> bool {
        self.onboarded_at.is_some()
    }
}
