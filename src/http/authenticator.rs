use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::navigation::{Navigator, Route};
use crate::notify::SessionNotifier;
use crate::session::{LogoutReason, SessionStore};
use crate::token;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Pipeline stage that attaches credentials to outbound requests and reacts
/// to authentication failures on responses.
pub struct RequestAuthenticator {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn SessionNotifier>,
    clock: Arc<dyn Clock>,
    /// Paths that are unauthenticated by construction (login, registration,
    /// password flows) and never carry injected headers.
    skip_paths: Vec<String>,
}

impl RequestAuthenticator {
    pub fn new(
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn SessionNotifier>,
        clock: Arc<dyn Clock>,
        skip_paths: Vec<String>,
    ) -> Self {
        Self {
            store,
            navigator,
            notifier,
            clock,
            skip_paths,
        }
    }

    /// Inject credentials into the outgoing headers, unless the path is on
    /// the skip list or there is no usable token.
    ///
    /// An absent or expired token forwards the request unmodified. This is a
    /// deliberate fail-open for anonymous-accessible endpoints, not a
    /// fail-closed.
    pub fn apply(&self, headers: &mut HashMap<String, String>, path: &str) {
        if self.skip_paths.iter().any(|p| p == path) {
            return;
        }

        let state = self.store.get();
        let Some(token) = state.token() else {
            return;
        };
        if token::is_expired(token, self.clock.now()) {
            debug!(path, "token expired, forwarding request unauthenticated");
            return;
        }

        headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {token}"));
        if let Some(user) = state.user() {
            headers.insert(USER_ID_HEADER.to_string(), user.id.clone());
        }
    }

    /// React to an authentication failure on a response.
    ///
    /// 401 forces a logout and a redirect to the login view, unless the user
    /// is already there (avoids a redirect loop) or the path is on the skip
    /// list: a rejected login attempt says nothing about the session that is
    /// already established. 403 means "authenticated but not permitted" and
    /// is deliberately left alone; destroying the session would be wrong.
    pub async fn on_response(&self, status: u16, path: &str) {
        if status != 401 {
            return;
        }
        if self.skip_paths.iter().any(|p| p == path) {
            return;
        }
        if self.navigator.current() == Route::Login {
            return;
        }

        info!("credential rejected with 401, ending session");
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "failed to clear session after 401");
        }
        self.notifier.session_ended(LogoutReason::Unauthorized);
        self.navigator.navigate(Route::Login);
    }
}
