//! Member role.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognized.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

/// Privilege level of a member.
///
/// Stored as TEXT in the `users` table; repositories parse the column
/// through [`Role::parse`] so an unexpected value surfaces as data
/// corruption instead of silently granting or denying access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular conference member.
    #[default]
    Member,
    /// Administrator with access to the admin dashboard and procedures.
    Admin,
}

impl Role {
    /// Parse a role from its stored string form.
    ///
    /// # Errors
    ///
    /// Returns [`RoleParseError`] if the value is not `member` or `admin`.
    pub fn parse(s: &str) -> Result<Self, RoleParseError> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            other => Err(RoleParseError(other.to_owned())),
        }
    }

    /// The stored string form of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(Role::parse("member").ok(), Some(Role::Member));
        assert_eq!(Role::parse("admin").ok(), Some(Role::Admin));
        assert!(Role::parse("superuser").is_err());
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Member.to_string(), "member");
    }

    #[test]
    fn test_default_is_member() {
        assert_eq!(Role::default(), Role::Member);
    }
}
