//! Session resolution.
//!
//! Resolution turns an inbound credential into a [`SessionView`] in at most
//! two store reads and one conditional write: consult the identity
//! provider, look up the member mirror, lazily create the mirror row on
//! first sight. Two entry points share this one path:
//!
//! - [`SessionResolver::resolve`] - fresh, used for every server-rendered
//!   page request.
//! - [`SessionResolver::resolve_cached`] - used by the `/api` procedure
//!   surface; memoizes per credential with a short staleness window and is
//!   explicitly invalidated on sign-out and privilege-changing mutations.
//!
//! Resolution never fails: provider outages degrade to the anonymous view
//! (fail closed) and are logged with their failure category.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sqlx::PgPool;
use tracing::warn;

use summit_core::{Role, UserId};

use super::SessionView;
use crate::db::{RepositoryError, UserRepository};
use crate::identity::{ExternalIdentity, IdentityProvider};
use crate::models::User;

/// Upper bound on distinct credentials memoized at once.
const CACHE_CAPACITY: u64 = 10_000;

/// Persistence port for the member mirror.
///
/// The resolver needs exactly the mirror operations listed here;
/// production uses [`PgUserStore`], tests substitute an in-memory fake.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a member by id.
    async fn find(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Create the mirror row for `identity` if absent; return the stored
    /// row either way. Must be atomic under concurrent first sights.
    async fn create_if_absent(&self, identity: &ExternalIdentity)
    -> Result<User, RepositoryError>;

    /// Mark a member as onboarded.
    async fn set_onboarded(&self, id: &UserId) -> Result<User, RepositoryError>;

    /// Change a member's role.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<User, RepositoryError>;
}

/// [`UserStore`] backed by the `users` table.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).find_by_id(id).await
    }

    async fn create_if_absent(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create_if_absent(identity).await
    }

    async fn set_onboarded(&self, id: &UserId) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).set_onboarded(id).await
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).set_role(id, role).await
    }
}

/// Resolves inbound credentials to [`SessionView`]s.
#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn UserStore>,
    cache: Cache<String, SessionView>,
}

impl SessionResolver {
    /// Create a resolver.
    ///
    /// `cache_ttl` is the staleness window of the cached entry point;
    /// privilege changes do not wait it out - they invalidate explicitly.
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn UserStore>,
        cache_ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(cache_ttl)
            .build();

        Self {
            provider,
            store,
            cache,
        }
    }

    /// Resolve a credential freshly, bypassing the cache.
    ///
    /// Never fails: an absent credential, an unknown credential, and a
    /// provider outage all produce the anonymous view.
    pub async fn resolve(&self, credential: Option<&str>) -> SessionView {
        let Some(credential) = credential else {
            return SessionView::anonymous();
        };
        self.resolve_inner(credential).await.0
    }

    /// Resolve a credential through the per-credential cache.
    ///
    /// Views produced under a provider or store failure are not memoized,
    /// so a transient outage does not pin a member to the anonymous view
    /// for the full staleness window.
    pub async fn resolve_cached(&self, credential: Option<&str>) -> SessionView {
        let Some(credential) = credential else {
            return SessionView::anonymous();
        };

        if let Some(view) = self.cache.get(credential).await {
            return view;
        }

        let (view, cacheable) = self.resolve_inner(credential).await;
        if cacheable {
            self.cache.insert(credential.to_owned(), view.clone()).await;
        }
        view
    }

    /// Drop the memoized view for one credential.
    ///
    /// Called on sign-out and after mutations that change the calling
    /// member's onboarding state.
    pub async fn invalidate(&self, credential: &str) {
        self.cache.invalidate(credential).await;
    }

    /// Drop every memoized view.
    ///
    /// Called after admin role changes: the changed member's credential is
    /// not known to the server, and a stale-privilege window must not wait
    /// out the TTL.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// The shared resolution path. Returns the view and whether it is safe
    /// to memoize (false when a failure forced a degraded answer).
    async fn resolve_inner(&self, credential: &str) -> (SessionView, bool) {
        let identity = match self.provider.identify(credential).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return (SessionView::anonymous(), true),
            Err(err) => {
                warn!(
                    category = err.category(),
                    error = %err,
                    "identity resolution failed, treating request as unauthenticated"
                );
                return (SessionView::anonymous(), false);
            }
        };

        match self.lookup_or_provision(&identity).await {
            Ok(user) => (SessionView::authenticated(identity, Some(user)), true),
            Err(err) => {
                warn!(
                    member = %identity.id,
                    error = %err,
                    "member mirror unavailable, continuing unprovisioned"
                );
                (SessionView::authenticated(identity, None), false)
            }
        }
    }

    async fn lookup_or_provision(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<User, RepositoryError> {
        if let Some(user) = self.store.find(&identity.id).await? {
            return Ok(user);
        }
        self.store.create_if_absent(identity).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::identity::IdentityError;

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use chrono::Utc;
    use summit_core::Email;

    /// Provider fake: a credential table plus a failure switch.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        sessions: Mutex<HashMap<String, ExternalIdentity>>,
        failing: AtomicBool,
    }

    impl FakeProvider {
        pub(crate) fn with_session(credential: &str, identity: ExternalIdentity) -> Self {
            let provider = Self::default();
            provider.sign_in(credential, identity);
            provider
        }

        pub(crate) fn sign_in(&self, credential: &str, identity: ExternalIdentity) {
            self.sessions
                .lock()
                .unwrap()
                .insert(credential.to_owned(), identity);
        }

        pub(crate) fn sign_out(&self, credential: &str) {
            self.sessions.lock().unwrap().remove(credential);
        }

        pub(crate) fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn identify(
            &self,
            credential: &str,
        ) -> Result<Option<ExternalIdentity>, IdentityError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(IdentityError::Transient("connection refused".to_owned()));
            }
            Ok(self.sessions.lock().unwrap().get(credential).cloned())
        }
    }

    /// In-memory [`UserStore`] with an insert counter for race assertions.
    #[derive(Default)]
    pub(crate) struct MemoryStore {
        users: Mutex<HashMap<String, User>>,
        inserts: AtomicUsize,
    }

    impl MemoryStore {
        pub(crate) fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub(crate) fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn find(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
            Ok(self.users.lock().unwrap().get(id.as_str()).cloned())
        }

        async fn create_if_absent(
            &self,
            identity: &ExternalIdentity,
        ) -> Result<User, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .entry(identity.id.as_str().to_owned())
                .or_insert_with(|| {
                    self.inserts.fetch_add(1, Ordering::SeqCst);
                    let now = Utc::now();
                    User {
                        id: identity.id.clone(),
                        name: identity.name.clone(),
                        email: identity.email.clone(),
                        image: identity.image.clone(),
                        role: Role::Member,
                        onboarded_at: None,
                        created_at: now,
                        updated_at: now,
                    }
                });
            Ok(user.clone())
        }

        async fn set_onboarded(&self, id: &UserId) -> Result<User, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(id.as_str()).ok_or(RepositoryError::NotFound)?;
            user.onboarded_at.get_or_insert_with(Utc::now);
            Ok(user.clone())
        }

        async fn set_role(&self, id: &UserId, role: Role) -> Result<User, RepositoryError> {
            let mut users = self.users.lock().unwrap();
            let user = users.get_mut(id.as_str()).ok_or(RepositoryError::NotFound)?;
            user.role = role;
            Ok(user.clone())
        }
    }

    pub(crate) fn identity(id: &str) -> ExternalIdentity {
        ExternalIdentity {
            id: UserId::new(id),
            name: "Grace".to_owned(),
            email: Email::parse("grace@example.com").unwrap(),
            image: Some("https://cdn.example.com/grace.png".to_owned()),
        }
    }

    fn resolver(provider: Arc<FakeProvider>, store: Arc<MemoryStore>) -> SessionResolver {
        SessionResolver::new(provider, store, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_no_credential_resolves_anonymous() {
        let resolver = resolver(Arc::default(), Arc::default());

        let view = resolver.resolve(None).await;
        assert!(!view.is_authenticated());
        assert!(view.user().is_none());
    }

    #[tokio::test]
    async fn test_unknown_credential_resolves_anonymous() {
        let resolver = resolver(Arc::default(), Arc::default());

        let view = resolver.resolve(Some("cred-nobody")).await;
        assert!(!view.is_authenticated());
        assert!(view.user().is_none());
    }

    #[tokio::test]
    async fn test_first_sight_creates_exactly_one_mirror_row() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        let store = Arc::new(MemoryStore::default());
        let resolver = resolver(provider, Arc::clone(&store));

        let view = resolver.resolve(Some("cred-1")).await;
        let user = view.user().expect("mirror row should be provisioned");
        assert_eq!(user.id.as_str(), "idp-7");
        assert_eq!(store.inserts(), 1);

        // A second resolution reuses the row.
        let again = resolver.resolve(Some("cred-1")).await;
        assert_eq!(again.user().unwrap().id.as_str(), "idp-7");
        assert_eq!(store.inserts(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_sight_is_idempotent() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        let store = Arc::new(MemoryStore::default());
        let resolver = resolver(provider, Arc::clone(&store));

        let (a, b) = tokio::join!(
            resolver.resolve(Some("cred-1")),
            resolver.resolve(Some("cred-1"))
        );

        assert_eq!(a.user().unwrap().id.as_str(), "idp-7");
        assert_eq!(b.user().unwrap().id.as_str(), "idp-7");
        assert_eq!(store.len(), 1);
        assert_eq!(store.inserts(), 1);
    }

    #[tokio::test]
    async fn test_provider_outage_fails_closed() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        provider.set_failing(true);
        let resolver = resolver(Arc::clone(&provider), Arc::default());

        let view = resolver.resolve(Some("cred-1")).await;
        assert!(!view.is_authenticated());
    }

    #[tokio::test]
    async fn test_degraded_resolution_is_not_memoized() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        let resolver = resolver(Arc::clone(&provider), Arc::default());

        provider.set_failing(true);
        let degraded = resolver.resolve_cached(Some("cred-1")).await;
        assert!(!degraded.is_authenticated());

        // Once the provider recovers, the next cached resolution sees the
        // real session instead of a pinned failure.
        provider.set_failing(false);
        let recovered = resolver.resolve_cached(Some("cred-1")).await;
        assert!(recovered.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_invalidation_bypasses_ttl() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        let resolver = resolver(Arc::clone(&provider), Arc::default());

        assert!(resolver.resolve_cached(Some("cred-1")).await.is_authenticated());

        // The provider session ends, but the memoized view is still warm.
        provider.sign_out("cred-1");
        assert!(resolver.resolve_cached(Some("cred-1")).await.is_authenticated());

        // Explicit invalidation takes effect immediately, well inside the TTL.
        resolver.invalidate("cred-1").await;
        assert!(!resolver.resolve_cached(Some("cred-1")).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_invalidate_all_drops_every_credential() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        provider.sign_in("cred-2", identity("idp-8"));
        let resolver = resolver(Arc::clone(&provider), Arc::default());

        assert!(resolver.resolve_cached(Some("cred-1")).await.is_authenticated());
        assert!(resolver.resolve_cached(Some("cred-2")).await.is_authenticated());

        provider.sign_out("cred-1");
        provider.sign_out("cred-2");
        resolver.invalidate_all();

        assert!(!resolver.resolve_cached(Some("cred-1")).await.is_authenticated());
        assert!(!resolver.resolve_cached(Some("cred-2")).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_fresh_entry_point_ignores_cache() {
        let provider = Arc::new(FakeProvider::with_session("cred-1", identity("idp-7")));
        let resolver = resolver(Arc::clone(&provider), Arc::default());

        assert!(resolver.resolve_cached(Some("cred-1")).await.is_authenticated());

        // A server-rendered request re-resolves and sees the sign-out at
        // once, even though the cached entry is still live.
        provider.sign_out("cred-1");
        assert!(!resolver.resolve(Some("cred-1")).await.is_authenticated());
    }
}
