//! Member repository for database operations.
//!
//! The `users` table mirrors the external identity provider: rows are
//! created lazily on first resolution of an identity and keyed by the
//! provider's id. Creation goes through an `INSERT .. ON CONFLICT DO
//! NOTHING` so concurrent first sights of the same identity collapse onto
//! one row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use summit_core::{Email, Role, UserId};

use super::{Page, RepositoryError};
use crate::identity::ExternalIdentity;
use crate::models::User;

/// Raw `users` row as stored.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    image: Option<String>,
    role: String,
    onboarded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert a stored row into the domain type.
    ///
    /// Email and role are parsed; a value that no longer parses is surfaced
    /// as data corruption rather than mapped to a default.
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = Role::parse(&self.role).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(User {
            id: self.id,
            name: self.name,
            email,
            image: self.image,
            role,
            onboarded_at: self.onboarded_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, image, role, onboarded_at, created_at, updated_at";

/// Repository for member database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a member by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Create the mirror row for an external identity if it does not exist,
    /// and return the stored row either way.
    ///
    /// The insert is `ON CONFLICT (id) DO NOTHING`: when two requests race
    /// on the same first-seen identity, one insert wins, the other becomes a
    /// no-op, and both observe the winner's row on the follow-up read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is
    /// invalid, or missing after the insert (which the primary key makes
    /// impossible short of a concurrent delete).
    pub async fn create_if_absent(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(&identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(identity.image.as_deref())
        .execute(self.pool)
        .await?;

        self.find_by_id(&identity.id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "user {} missing after insert-if-absent",
                identity.id
            ))
        })
    }

    /// Mark a member as onboarded.
    ///
    /// Idempotent: a member who already onboarded keeps the original
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_onboarded(&self, id: &UserId) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET onboarded_at = COALESCE(onboarded_at, now()), updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// Change a member's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the member doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_role(&self, id: &UserId, role: Role) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// List members, newest first, cursor-paginated.
    ///
    /// `limit` must already be clamped; the cursor is the id of the first
    /// member of the requested page (as handed out in a previous page's
    /// `next_cursor`). An unknown cursor yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn list(
        &self,
        limit: i64,
        cursor: Option<&UserId>,
    ) -> Result<Page<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE $1::text IS NULL
               OR (created_at, id) <= (SELECT created_at, id FROM users WHERE id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::from_overfetch(users, limit, |u| u.id.to_string()))
    }

    /// Total number of members.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
