//! Database operations for the Summit `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - Member mirror of the external identity provider
//! - `comments` - Blog comments
//! - `reports` - Comment reports (moderation queue)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p summit-cli -- migrate
//! ```

pub mod comments;
pub mod reports;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use comments::CommentRepository;
pub use reports::ReportRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Default number of items per listing page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of items per listing page; requested limits are clamped here.
pub const MAX_PAGE_SIZE: i64 = 50;

/// One page of a cursor-paginated listing.
///
/// Every listing in Summit shares one boundary contract: the repository
/// fetches `limit + 1` rows; if the extra row exists it is popped and its id
/// becomes `next_cursor`. A caller passing that cursor back resumes at the
/// popped row inclusive, so consecutive pages tile the result set with no
/// gaps or overlaps.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items on this page, at most the clamped limit.
    pub items: Vec<T>,
    /// Id of the first item of the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Build a page from an overfetched row set.
    ///
    /// `rows` must have been fetched with `LIMIT limit + 1`; `cursor_of`
    /// extracts the cursor id of a row.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64, cursor_of: impl Fn(&T) -> String) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let next_cursor = if rows.len() > limit {
            rows.pop().map(|extra| cursor_of(&extra))
        } else {
            None
        };
        Self { items: rows, next_cursor }
    }

    /// Map the items of the page, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
///
/// `None` yields [`DEFAULT_PAGE_SIZE`].
#[must_use]
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_limit(Some(7)), 7);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_pops_overfetched_row_as_cursor() {
        // 25 stored items, limit 20: the repository fetches 21.
        let rows: Vec<u32> = (0..21).collect();
        let page = Page::from_overfetch(rows, 20, u32::to_string);

        assert_eq!(page.items.len(), 20);
        // The popped 21st row is not on the page; its id is the cursor.
        assert!(!page.items.contains(&20));
        assert_eq!(page.next_cursor.as_deref(), Some("20"));
    }

    #[test]
    fn test_page_without_extra_row_has_no_cursor() {
        let rows: Vec<u32> = (0..5).collect();
        let page = Page::from_overfetch(rows, 20, u32::to_string);

        assert_eq!(page.items.len(), 5);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_page_exactly_full_has_no_cursor() {
        let rows: Vec<u32> = (0..20).collect();
        let page = Page::from_overfetch(rows, 20, u32::to_string);

        assert_eq!(page.items.len(), 20);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_page_map_keeps_cursor() {
        let rows: Vec<u32> = (0..3).collect();
        let page = Page::from_overfetch(rows, 2, u32::to_string).map(|n| n * 10);

        assert_eq!(page.items, vec![0, 10]);
        assert_eq!(page.next_cursor.as_deref(), Some("2"));
    }
}
