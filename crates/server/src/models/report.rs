//! Comment report domain types.

use chrono::{DateTime, Utc};

use summit_core::{CommentId, ReportId, ReportStatus, UserId};

/// A member-filed report against a comment (domain type).
///
/// Reports form the admin moderation queue. Review is a one-shot
/// transition out of [`ReportStatus::Open`].
#[derive(Debug, Clone)]
pub struct Report {
    /// Unique report id.
    pub id: ReportId,
    /// The reported comment.
    pub comment_id: CommentId,
    /// Member who filed the report.
    pub reporter_id: UserId,
    /// Reporter-supplied reason.
    pub reason: String,
    /// Review state.
    pub status: ReportStatus,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// When an admin reviewed the report, if reviewed.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Admin who reviewed the report, if reviewed.
    pub resolved_by: Option<UserId>,
}
