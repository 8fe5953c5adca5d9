//! Comment repository for database operations.
//!
//! Listings are keyset-paginated on `(created_at, id)` descending; the
//! cursor handed to callers is the id of the first row of the next page.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use summit_core::{CommentId, UserId};

use super::{Page, RepositoryError};
use crate::models::Comment;

/// Raw `comments` row joined with the author's display name.
#[derive(sqlx::FromRow)]
struct CommentRow {
    id: CommentId,
    post_slug: String,
    author_id: UserId,
    author_name: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_slug: row.post_slug,
            author_id: row.author_id,
            author_name: row.author_name,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const COMMENT_SELECT: &str = r"
    SELECT c.id, c.post_slug, c.author_id, u.name AS author_name,
           c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
";

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a comment by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row: Option<CommentRow> =
            sqlx::query_as(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Comment::from))
    }

    /// List comments on a post, newest first, cursor-paginated.
    ///
    /// `limit` must already be clamped. A supplied cursor resumes at the
    /// cursor row inclusive; an unknown cursor yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_post(
        &self,
        post_slug: &str,
        limit: i64,
        cursor: Option<CommentId>,
    ) -> Result<Page<Comment>, RepositoryError> {
        let rows: Vec<CommentRow> = sqlx::query_as(&format!(
            r"
            {COMMENT_SELECT}
            WHERE c.post_slug = $1
              AND ($2::uuid IS NULL
                   OR (c.created_at, c.id) <= (SELECT created_at, id FROM comments WHERE id = $2))
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $3
            "
        ))
        .bind(post_slug)
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(self.pool)
        .await?;

        let comments: Vec<Comment> = rows.into_iter().map(Comment::from).collect();
        Ok(Page::from_overfetch(comments, limit, |c| c.id.to_string()))
    }

    /// Create a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the author does not exist
    /// (foreign key), `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        post_slug: &str,
        author_id: &UserId,
        content: &str,
    ) -> Result<CommentId, RepositoryError> {
        let (id,): (CommentId,) = sqlx::query_as(
            r"
            INSERT INTO comments (post_slug, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(post_slug)
        .bind(author_id)
        .bind(content)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("unknown comment author".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }

    /// Replace a comment's content.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the comment doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_content(
        &self,
        id: CommentId,
        content: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE comments
            SET content = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(content)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a comment.
    ///
    /// # Returns
    ///
    /// Returns `true` if the comment was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
