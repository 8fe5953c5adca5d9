//! Member management commands.
//!
//! # Usage
//!
//! ```bash
//! # Promote a member to admin
//! summit-cli member set-role --id idp_01HZX4T9 --role admin
//!
//! # Show a member record
//! summit-cli member show --id idp_01HZX4T9
//! ```
//!
//! Role changes from the CLI take effect on a member's next session
//! resolution. Running server instances drop their cached resolutions on
//! their own short staleness window; use the admin procedure instead when
//! an immediate cache drop matters.
//!
//! # Environment Variables
//!
//! - `SUMMIT_DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;
use thiserror::Error;

use summit_core::{Role, UserId};
use summit_server::db::{RepositoryError, UserRepository};

/// Errors that can occur during member operations.
#[derive(Debug, Error)]
pub enum MemberError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: member, admin")]
    InvalidRole(String),

    /// No member with the given id.
    #[error("No member with id: {0}")]
    NotFound(String),
}

/// Change a member's role.
///
/// # Errors
///
/// Returns `MemberError::InvalidRole` for an unknown role name and
/// `MemberError::NotFound` if the member does not exist.
pub async fn set_role(id: &str, role: &str) -> Result<(), MemberError> {
    let role: Role = role
        .parse()
        .map_err(|_| MemberError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;
    let member_id = UserId::new(id);

    let updated = UserRepository::new(&pool)
        .set_role(&member_id, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => MemberError::NotFound(id.to_owned()),
            other => MemberError::Repository(other),
        })?;

    tracing::info!(
        "Role updated: {} ({}) is now {}",
        updated.name,
        updated.id,
        updated.role
    );
    Ok(())
}

/// Show a member record.
///
/// # Errors
///
/// Returns `MemberError::NotFound` if the member does not exist.
pub async fn show(id: &str) -> Result<(), MemberError> {
    let pool = connect().await?;
    let member_id = UserId::new(id);

    let member = UserRepository::new(&pool)
        .find_by_id(&member_id)
        .await?
        .ok_or_else(|| MemberError::NotFound(id.to_owned()))?;

    tracing::info!(
        "Member {}: {} <{}> role={} onboarded={}",
        member.id,
        member.name,
        member.email,
        member.role,
        member
            .onboarded_at
            .map_or_else(|| "no".to_owned(), |at| at.to_rfc3339()),
    );
    Ok(())
}

async fn connect() -> Result<PgPool, MemberError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SUMMIT_DATABASE_URL")
        .map_err(|_| MemberError::MissingEnvVar("SUMMIT_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(&database_url).await?)
}
