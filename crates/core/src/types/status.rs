//! Status enums for moderation entities.

use serde::{Deserialize, Serialize};

/// Error returned when a stored status string is not recognized.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown status: {0}")]
pub struct StatusParseError(pub String);

/// Lifecycle of a comment report.
///
/// Reports start `open`; an admin review moves them to `resolved` (action
/// was taken) or `dismissed` (no action warranted). Stored as TEXT in the
/// `reports` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Awaiting admin review.
    #[default]
    Open,
    /// Reviewed; moderation action taken.
    Resolved,
    /// Reviewed; no action warranted.
    Dismissed,
}

impl ReportStatus {
    /// Parse a status from its stored string form.
    ///
    /// # Errors
    ///
    /// Returns [`StatusParseError`] if the value is not one of
    /// `open`, `resolved`, `dismissed`.
    pub fn parse(s: &str) -> Result<Self, StatusParseError> {
        match s {
            "open" => Ok(Self::Open),
            "resolved" => Ok(Self::Resolved),
            "dismissed" => Ok(Self::Dismissed),
            other => Err(StatusParseError(other.to_owned())),
        }
    }

    /// The stored string form of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    /// Whether an admin has already reviewed the report.
    #[must_use]
    pub const fn is_reviewed(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl core::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
