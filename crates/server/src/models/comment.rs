//! Blog comment domain types.

use chrono::{DateTime, Utc};

use summit_core::{CommentId, UserId};

/// A comment on a blog post (domain type).
#[derive(Debug, Clone)]
pub struct Comment {
    /// Unique comment id.
    pub id: CommentId,
    /// Slug of the post the comment belongs to.
    pub post_slug: String,
    /// Member who wrote the comment.
    pub author_id: UserId,
    /// Author display name at read time (joined from the member mirror).
    pub author_name: String,
    /// Comment body.
    pub content: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
    /// When the comment was last edited.
    pub updated_at: DateTime<Utc>,
}
