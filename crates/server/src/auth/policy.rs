//! Authorization gate.
//!
//! A pure decision function: given a resolved [`SessionView`], a route
//! policy, and the surface the request arrived on, produce allow, redirect,
//! or reject. Authorization failures are values, never faults - a caller
//! cannot accidentally let one propagate as an unhandled error.
//!
//! Failure channels differ by surface for the same predicate: a page
//! request is redirected (sign-in for missing authentication, onboarding
//! for an incomplete profile, home for an insufficient role), a procedure
//! call gets a structured rejection. A role failure never discloses why:
//! the redirect target is neutral and the rejection code is the same
//! `UNAUTHORIZED` an unauthenticated caller would see.

use super::SessionView;
use crate::api::error::ErrorCode;

/// Where unauthenticated page requests are sent.
pub const SIGN_IN_ROUTE: &str = "/auth/sign-in";

/// Where authenticated-but-not-onboarded page requests are sent.
pub const ONBOARDING_ROUTE: &str = "/onboarding";

/// Neutral landing route for under-privileged page requests.
pub const HOME_ROUTE: &str = "/";

/// Privilege a route or procedure requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// A valid session.
    Authenticated,
    /// A valid session belonging to an onboarded member.
    Onboarded,
    /// A valid session belonging to an admin.
    Admin,
}

/// The surface a request arrived on, selecting its failure channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Server-rendered page: failures redirect.
    Page,
    /// Procedure call under `/api`: failures reject with a structured code.
    Procedure,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// Page-surface failure: send the client to `target`.
    Redirect(&'static str),
    /// Procedure-surface failure: reject with `code`.
    Reject(ErrorCode),
}

/// Evaluate `policy` against a resolved view.
///
/// Checks run in a fixed order - authentication, then onboarding, then
/// role - so the caller always learns the earliest unmet requirement
/// (and an under-privileged caller learns nothing past it).
#[must_use]
pub fn authorize(view: &SessionView, policy: Policy, surface: Surface) -> Decision {
    if !view.is_authenticated() {
        return deny(surface, SIGN_IN_ROUTE);
    }

    match policy {
        Policy::Authenticated => Decision::Allow,
        Policy::Onboarded => {
            if view.is_onboarded() {
                Decision::Allow
            } else {
                deny(surface, ONBOARDING_ROUTE)
            }
        }
        Policy::Admin => {
            if view.is_admin() {
                Decision::Allow
            } else {
                // Neutral target, same code as unauthenticated: the
                // existence of admin-only resources is not disclosed.
                deny(surface, HOME_ROUTE)
            }
        }
    }
}

const fn deny(surface: Surface, page_target: &'static str) -> Decision {
    match surface {
        Surface::Page => Decision::Redirect(page_target),
        Surface::Procedure => Decision::Reject(ErrorCode::Unauthorized),
    }
}
