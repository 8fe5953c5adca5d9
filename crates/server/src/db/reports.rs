//! Report repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use summit_core::{CommentId, ReportId, ReportStatus, UserId};

use super::{Page, RepositoryError};
use crate::models::Report;

/// Raw `reports` row as stored.
#[derive(sqlx::FromRow)]
struct ReportRow {
    id: ReportId,
    comment_id: CommentId,
    reporter_id: UserId,
    reason: String,
    status: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
    resolved_by: Option<UserId>,
}

impl ReportRow {
    fn into_report(self) -> Result<Report, RepositoryError> {
        let status = ReportStatus::parse(&self.status).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid report status in database: {e}"))
        })?;

        Ok(Report {
            id: self.id,
            comment_id: self.comment_id,
            reporter_id: self.reporter_id,
            reason: self.reason,
            status,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
            resolved_by: self.resolved_by,
        })
    }
}

const REPORT_COLUMNS: &str =
    "id, comment_id, reporter_id, reason, status, created_at, resolved_at, resolved_by";

/// Repository for report database operations.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// File a report against a comment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the comment or reporter does
    /// not exist (foreign key), `RepositoryError::Database` for other
    /// database errors.
    pub async fn create(
        &self,
        comment_id: CommentId,
        reporter_id: &UserId,
        reason: &str,
    ) -> Result<ReportId, RepositoryError> {
        let (id,): (ReportId,) = sqlx::query_as(
            r"
            INSERT INTO reports (comment_id, reporter_id, reason)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(comment_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("unknown comment or reporter".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }

    /// List reports, newest first, cursor-paginated, optionally filtered by
    /// status.
    ///
    /// `limit` must already be clamped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored status is invalid.
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: i64,
        cursor: Option<ReportId>,
    ) -> Result<Page<Report>, RepositoryError> {
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            r"
            SELECT {REPORT_COLUMNS}
            FROM reports
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL
                   OR (created_at, id) <= (SELECT created_at, id FROM reports WHERE id = $2))
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "
        ))
        .bind(status.map(ReportStatus::as_str))
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(self.pool)
        .await?;

        let reports = rows
            .into_iter()
            .map(ReportRow::into_report)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::from_overfetch(reports, limit, |r| r.id.to_string()))
    }

    /// Review an open report, marking it resolved or dismissed.
    ///
    /// The transition is guarded in SQL: only an `open` report can be
    /// reviewed, so two admins racing on the same report produce one
    /// review and one conflict.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the report doesn't exist.
    /// Returns `RepositoryError::Conflict` if the report was already reviewed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn review(
        &self,
        id: ReportId,
        outcome: ReportStatus,
        reviewer_id: &UserId,
    ) -> Result<Report, RepositoryError> {
        let row: Option<ReportRow> = sqlx::query_as(&format!(
            r"
            UPDATE reports
            SET status = $2, resolved_at = now(), resolved_by = $3
            WHERE id = $1 AND status = 'open'
            RETURNING {REPORT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(outcome.as_str())
        .bind(reviewer_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => row.into_report(),
            // Distinguish "no such report" from "already reviewed".
            None => {
                let (exists,): (bool,) =
                    sqlx::query_as("SELECT EXISTS (SELECT 1 FROM reports WHERE id = $1)")
                        .bind(id)
                        .fetch_one(self.pool)
                        .await?;

                if exists {
                    Err(RepositoryError::Conflict("report already reviewed".to_owned()))
                } else {
                    Err(RepositoryError::NotFound)
                }
            }
        }
    }

    /// Number of reports awaiting review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_open(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reports WHERE status = 'open'")
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}
