//! Session resolution and authorization.
//!
//! One resolution path produces a [`SessionView`] for every inbound
//! request; the [`policy`] module turns a view plus a route policy into an
//! allow/redirect/reject decision. Extractors in `crate::middleware::auth`
//! wire both into axum handlers.

pub mod policy;
pub mod resolver;

pub use resolver::{PgUserStore, SessionResolver, UserStore};

use crate::identity::ExternalIdentity;
use crate::models::User;

use summit_core::Role;

/// Per-request composite of external identity, local member record, and
/// derived authorization state.
///
/// The fields are private so the invariants hold by construction: a view
/// can only be admin if it is authenticated, and only authenticated if an
/// identity is present. An identity without a member record is the legal
/// "authenticated but not yet provisioned" window during lazy creation,
/// not an error.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    identity: Option<ExternalIdentity>,
    user: Option<User>,
}

impl SessionView {
    /// The view of a request with no (valid) session.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            identity: None,
            user: None,
        }
    }

    /// The view of an authenticated request.
    ///
    /// `user` is `None` only when mirror provisioning has not completed.
    #[must_use]
    pub const fn authenticated(identity: ExternalIdentity, user: Option<User>) -> Self {
        Self {
            identity: Some(identity),
            user,
        }
    }

    /// The resolved external identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&ExternalIdentity> {
        self.identity.as_ref()
    }

    /// The local member record, if provisioned.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether the request carries a valid session.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether the member has completed onboarding.
    #[must_use]
    pub fn is_onboarded(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_onboarded)
    }

    /// Whether the request is from an authenticated admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use summit_core::{Email, UserId};

    fn identity(id: &str) -> ExternalIdentity {
        ExternalIdentity {
            id: UserId::new(id),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            image: None,
        }
    }

    fn user(id: &str, role: Role, onboarded: bool) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(id),
            name: "Ada".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            image: None,
            role,
            onboarded_at: onboarded.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_anonymous_view_has_no_flags() {
        let view = SessionView::anonymous();
        assert!(!view.is_authenticated());
        assert!(!view.is_onboarded());
        assert!(!view.is_admin());
        assert!(view.user().is_none());
    }

    #[test]
    fn test_admin_iff_authenticated_and_admin_role() {
        let admin = SessionView::authenticated(identity("u1"), Some(user("u1", Role::Admin, true)));
        assert!(admin.is_admin());

        let member =
            SessionView::authenticated(identity("u1"), Some(user("u1", Role::Member, true)));
        assert!(member.is_authenticated());
        assert!(!member.is_admin());
    }

    #[test]
    fn test_unprovisioned_view_is_authenticated_but_not_onboarded() {
        let view = SessionView::authenticated(identity("u1"), None);
        assert!(view.is_authenticated());
        assert!(!view.is_onboarded());
        assert!(!view.is_admin());
    }
}
