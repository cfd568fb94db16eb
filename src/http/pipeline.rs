use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiError;
use crate::http::authenticator::RequestAuthenticator;
use crate::http::client::{HttpClient, HttpResponse};
use crate::http::maintenance::MaintenanceGate;

/// The outbound request pipeline.
///
/// Composes the maintenance gate and the request authenticator around the
/// HTTP transport. Both stages inspect every response; the gate never touches
/// the session and the authenticator never touches navigation except for its
/// own 401 recovery, so their order does not matter beyond both running.
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    gate: MaintenanceGate,
    authenticator: RequestAuthenticator,
}

impl ApiClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        gate: MaintenanceGate,
        authenticator: RequestAuthenticator,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            gate,
            authenticator,
        }
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        self.execute(path, None).await
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<HttpResponse, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Transport(e.into()))?;
        self.execute(path, Some(body)).await
    }

    async fn execute(&self, path: &str, body: Option<String>) -> Result<HttpResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HashMap::new();
        if body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        self.authenticator.apply(&mut headers, path);

        let response = match body {
            Some(body) => self.http.post(&url, headers, body).await,
            None => self.http.get(&url, headers).await,
        }
        .map_err(ApiError::Transport)?;

        self.gate.on_response(response.status());
        self.authenticator.on_response(response.status(), path).await;

        match response.status() {
            401 => Err(ApiError::Unauthorized),
            403 => Err(ApiError::Forbidden),
            _ if response.is_success() => Ok(response),
            status => Err(ApiError::Status {
                status,
                body: response.body().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::config::{Endpoints, StorageKeys};
    use crate::http::client::mock::MockHttpClient;
    use crate::navigation::{Navigator, RecordingNavigator, Route};
    use crate::notify::{RecordingNotifier, SessionNotifier};
    use crate::session::state::{Role, User};
    use crate::session::{LogoutReason, SessionStore};
    use crate::storage::MemoryStorage;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{Duration, Utc};

    const BASE: &str = "https://api.test";

    fn make_token(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        format!("header.{payload}.signature")
    }

    fn user() -> User {
        User {
            id: "u-1".into(),
            email: "climber@example.com".into(),
            role: Role::User,
            first_name: None,
            last_name: None,
        }
    }

    struct Fixture {
        http: Arc<MockHttpClient>,
        store: Arc<SessionStore>,
        navigator: Arc<RecordingNavigator>,
        notifier: Arc<RecordingNotifier>,
        api: ApiClient,
    }

    async fn fixture() -> Fixture {
        let http = Arc::new(MockHttpClient::new());
        let store = Arc::new(
            SessionStore::open(Arc::new(MemoryStorage::new()), StorageKeys::default())
                .await
                .unwrap(),
        );
        let navigator = Arc::new(RecordingNavigator::new(Route::Home));
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));

        let authenticator = RequestAuthenticator::new(
            Arc::clone(&store),
            Arc::clone(&navigator) as Arc<dyn Navigator>,
            Arc::clone(&notifier) as Arc<dyn SessionNotifier>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Endpoints::default().unauthenticated(),
        );
        let gate = MaintenanceGate::new(Arc::clone(&navigator) as Arc<dyn Navigator>);
        let api = ApiClient::new(
            Arc::clone(&http) as Arc<dyn HttpClient>,
            BASE,
            gate,
            authenticator,
        );

        Fixture {
            http,
            store,
            navigator,
            notifier,
            api,
        }
    }

    async fn authenticate(f: &Fixture) {
        let token = make_token((Utc::now() + Duration::minutes(30)).timestamp());
        f.store.set_authenticated(token, user()).await.unwrap();
    }

    #[tokio::test]
    async fn successful_request_carries_credentials() {
        let f = fixture().await;
        authenticate(&f).await;
        f.http.mock_response(format!("{BASE}/trophies"), 200, "[]");

        let response = f.api.get("/trophies").await.unwrap();
        assert_eq!(response.status(), 200);

        let requests = f.http.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.contains_key("Authorization"));
        assert_eq!(
            requests[0].headers.get("X-User-Id").map(String::as_str),
            Some("u-1")
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_error_after_forced_logout() {
        let f = fixture().await;
        authenticate(&f).await;
        f.http.mock_response(format!("{BASE}/trophies"), 401, "");

        let err = f.api.get("/trophies").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(!f.store.get().is_authenticated());
        assert_eq!(f.navigator.visits(), vec![Route::Login]);
        assert_eq!(f.notifier.ended(), vec![LogoutReason::Unauthorized]);
    }

    #[tokio::test]
    async fn rejected_login_attempt_leaves_existing_session_alone() {
        let f = fixture().await;
        authenticate(&f).await;
        f.http
            .mock_response(format!("{BASE}/auth/login"), 401, "bad credentials");

        let err = f
            .api
            .post("/auth/login", &serde_json::json!({ "email": "a", "password": "b" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        // A wrong password says nothing about the session already held.
        assert!(f.store.get().is_authenticated());
        assert!(f.navigator.visits().is_empty());
        assert!(f.notifier.ended().is_empty());
    }

    #[tokio::test]
    async fn forbidden_propagates_untouched() {
        let f = fixture().await;
        authenticate(&f).await;
        f.http.mock_response(format!("{BASE}/admin/settings"), 403, "");

        let err = f.api.get("/admin/settings").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert!(f.store.get().is_authenticated());
        assert!(f.navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn service_unavailable_redirects_and_errors() {
        let f = fixture().await;
        f.http.mock_response(format!("{BASE}/trophies"), 503, "down");

        let err = f.api.get("/trophies").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert_eq!(f.navigator.visits(), vec![Route::Maintenance]);
        // The gate leaves the session store alone.
        assert!(!f.store.get().is_authenticated());
        assert!(f.notifier.ended().is_empty());
    }

    #[tokio::test]
    async fn anonymous_request_goes_out_without_headers() {
        let f = fixture().await;
        f.http.mock_response(format!("{BASE}/routes"), 200, "[]");

        f.api.get("/routes").await.unwrap();

        let requests = f.http.requests();
        assert!(!requests[0].headers.contains_key("Authorization"));
    }
}
