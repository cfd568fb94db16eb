use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::clock::Clock;
use crate::guards::RouteGuard;
use crate::navigation::{Navigator, Route};
use crate::session::store::SessionStore;
use crate::token;

/// Guard for views that require a live session.
///
/// Passes iff the store reports authenticated and the token has not expired;
/// otherwise redirects to the login view and denies.
pub struct AuthGuard {
    store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    navigator: Arc<dyn Navigator>,
}

impl AuthGuard {
    pub fn new(
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            clock,
            navigator,
        }
    }

    /// Shared session check: authenticated and not expired.
    pub(crate) fn session_valid(&self) -> bool {
        let state = self.store.get();
        match state.token() {
            Some(token) if state.is_authenticated() => {
                !token::is_expired(token, self.clock.now())
            }
            _ => false,
        }
    }
}

#[async_trait]
impl RouteGuard for AuthGuard {
    async fn can_activate(&self) -> bool {
        if self.session_valid() {
            return true;
        }
        debug!("auth guard denied, redirecting to login");
        self.navigator.navigate(Route::Login);
        false
    }
}

/// Guard for admin-only views.
///
/// Applies the auth check first (login redirect on failure); an
/// authenticated non-admin is redirected to home instead, so the two failure
/// modes are distinguishable by destination.
pub struct AdminGuard {
    auth: AuthGuard,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl AdminGuard {
    pub fn new(
        store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            auth: AuthGuard::new(Arc::clone(&store), clock, Arc::clone(&navigator)),
            store,
            navigator,
        }
    }
}

#[async_trait]
impl RouteGuard for AdminGuard {
    async fn can_activate(&self) -> bool {
        if !self.auth.session_valid() {
            debug!("admin guard denied unauthenticated user, redirecting to login");
            self.navigator.navigate(Route::Login);
            return false;
        }

        let state = self.store.get();
        if state.user().is_some_and(|user| user.is_admin()) {
            return true;
        }

        debug!("admin guard denied non-admin user, redirecting to home");
        self.navigator.navigate(Route::Home);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StorageKeys;
    use crate::navigation::RecordingNavigator;
    use crate::session::state::{Role, User};
    use crate::storage::MemoryStorage;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{Duration, Utc};

    fn make_token(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        format!("header.{payload}.signature")
    }

    fn user(role: Role) -> User {
        User {
            id: "u-1".into(),
            email: "climber@example.com".into(),
            role,
            first_name: None,
            last_name: None,
        }
    }

    struct Fixture {
        store: Arc<SessionStore>,
        clock: Arc<ManualClock>,
        navigator: Arc<RecordingNavigator>,
    }

    async fn fixture() -> Fixture {
        Fixture {
            store: Arc::new(
                SessionStore::open(Arc::new(MemoryStorage::new()), StorageKeys::default())
                    .await
                    .unwrap(),
            ),
            clock: Arc::new(ManualClock::new(Utc::now())),
            navigator: Arc::new(RecordingNavigator::new(Route::Home)),
        }
    }

    fn auth_guard(f: &Fixture) -> AuthGuard {
        AuthGuard::new(
            Arc::clone(&f.store),
            Arc::clone(&f.clock) as Arc<dyn Clock>,
            Arc::clone(&f.navigator) as Arc<dyn Navigator>,
        )
    }

    fn admin_guard(f: &Fixture) -> AdminGuard {
        AdminGuard::new(
            Arc::clone(&f.store),
            Arc::clone(&f.clock) as Arc<dyn Clock>,
            Arc::clone(&f.navigator) as Arc<dyn Navigator>,
        )
    }

    #[tokio::test]
    async fn auth_guard_denies_without_token() {
        let f = fixture().await;
        let guard = auth_guard(&f);

        assert!(!guard.can_activate().await);
        assert_eq!(f.navigator.visits(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn auth_guard_denies_expired_token() {
        let f = fixture().await;
        let token = make_token((f.clock.now() - Duration::minutes(1)).timestamp());
        f.store.set_authenticated(token, user(Role::User)).await.unwrap();
        let guard = auth_guard(&f);

        assert!(!guard.can_activate().await);
        assert_eq!(f.navigator.visits(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn auth_guard_passes_valid_token_without_redirect() {
        let f = fixture().await;
        let token = make_token((f.clock.now() + Duration::minutes(30)).timestamp());
        f.store.set_authenticated(token, user(Role::User)).await.unwrap();
        let guard = auth_guard(&f);

        assert!(guard.can_activate().await);
        assert!(f.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn admin_guard_sends_unauthenticated_users_to_login() {
        let f = fixture().await;
        let guard = admin_guard(&f);

        assert!(!guard.can_activate().await);
        assert_eq!(f.navigator.visits(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn admin_guard_sends_non_admins_home() {
        let f = fixture().await;
        let token = make_token((f.clock.now() + Duration::minutes(30)).timestamp());
        f.store
            .set_authenticated(token, user(Role::Moderator))
            .await
            .unwrap();
        let guard = admin_guard(&f);

        assert!(!guard.can_activate().await);
        // Distinguishable from the unauthenticated case by destination.
        assert_eq!(f.navigator.visits(), vec![Route::Home]);
    }

    #[tokio::test]
    async fn admin_guard_passes_admins() {
        let f = fixture().await;
        let token = make_token((f.clock.now() + Duration::minutes(30)).timestamp());
        f.store
            .set_authenticated(token, user(Role::Admin))
            .await
            .unwrap();
        let guard = admin_guard(&f);

        assert!(guard.can_activate().await);
        assert!(f.navigator.visits().is_empty());
    }
}
