//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{PgUserStore, SessionResolver};
use crate::config::ServerConfig;
use crate::identity::HttpIdentityProvider;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the session resolver.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    resolver: SessionResolver,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Wires the HTTP identity provider and the Postgres-backed member
    /// store into one session resolver; the cached entry point's staleness
    /// window comes from the config.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let provider = Arc::new(HttpIdentityProvider::new(&config.identity));
        let store = Arc::new(PgUserStore::new(pool.clone()));
        let resolver = SessionResolver::new(provider, store, config.session_cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                resolver,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the session resolver.
    #[must_use]
    pub fn resolver(&self) -> &SessionResolver {
        &self.inner.resolver
    }
}
