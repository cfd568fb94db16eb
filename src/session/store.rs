use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::config::StorageKeys;
use crate::session::state::{AuthState, User};
use crate::storage::SessionStorage;

/// The single source of truth for the current [`AuthState`].
///
/// Durable storage mirrors the state under two keys (token and user blob)
/// that are always written or cleared together. Subscribers get last-value
/// replay through a watch channel: the current state is visible synchronously
/// at subscription time, every later transition arrives as a change.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    keys: StorageKeys,
    state: watch::Sender<AuthState>,
    /// Bumped on every state replacement; lets in-flight login completions
    /// detect an interleaved logout and discard themselves.
    epoch: AtomicU64,
    /// Serializes the persist-then-replace write path.
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Open the store, restoring a previous session from durable storage.
    ///
    /// Both keys present and the user blob parses: the session is restored.
    /// A corrupt user blob or a partial pair clears storage immediately and
    /// the store starts unauthenticated; a malformed state is never
    /// propagated.
    pub async fn open(storage: Arc<dyn SessionStorage>, keys: StorageKeys) -> Result<Self> {
        let token = storage.get(&keys.token).await?;
        let user = storage.get(&keys.user).await?;

        let initial = match (token, user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<User>(&raw_user) {
                Ok(user) => {
                    info!(user_id = %user.id, "restored session from storage");
                    AuthState::authenticated(token, user)
                }
                Err(e) => {
                    warn!(error = %e, "stored user data is corrupt, clearing session");
                    storage.remove(&keys.token).await?;
                    storage.remove(&keys.user).await?;
                    AuthState::unauthenticated()
                }
            },
            (None, None) => AuthState::unauthenticated(),
            _ => {
                // One key without the other violates the storage invariant.
                warn!("partial session found in storage, clearing");
                storage.remove(&keys.token).await?;
                storage.remove(&keys.user).await?;
                AuthState::unauthenticated()
            }
        };

        let (state, _) = watch::channel(initial);
        Ok(Self {
            storage,
            keys,
            state,
            epoch: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        })
    }

    /// Synchronous snapshot of the current state.
    pub fn get(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes. The receiver observes the current value
    /// immediately and every replacement thereafter.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current session epoch. Capture before starting an authentication
    /// round-trip, then commit with [`SessionStore::commit_if_current`].
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Persist the credential pair and replace the state with an
    /// authenticated value, notifying subscribers.
    pub async fn set_authenticated(&self, token: String, user: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist(&token, &user).await?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!(user_id = %user.id, "session established");
        self.state.send_replace(AuthState::authenticated(token, user));
        Ok(())
    }

    /// Commit a login completion only if no other transition happened since
    /// `epoch` was captured. Returns `false` when the completion was stale
    /// and discarded.
    pub async fn commit_if_current(&self, epoch: u64, token: String, user: User) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("session changed while request was in flight, discarding completion");
            return Ok(false);
        }
        self.persist(&token, &user).await?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!(user_id = %user.id, "session established");
        self.state.send_replace(AuthState::authenticated(token, user));
        Ok(true)
    }

    /// Remove both storage entries and replace the state with the
    /// unauthenticated value. Idempotent: clearing an already-cleared store
    /// re-clears storage and does nothing else, subscribers are not
    /// re-notified.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove(&self.keys.token).await?;
        self.storage.remove(&self.keys.user).await?;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.state.borrow().is_authenticated() {
            debug!("session cleared");
            self.state.send_replace(AuthState::unauthenticated());
        }
        Ok(())
    }

    async fn persist(&self, token: &str, user: &User) -> Result<()> {
        let raw_user = serde_json::to_string(user)?;
        self.storage.set(&self.keys.token, token).await?;
        self.storage.set(&self.keys.user, &raw_user).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::Role;
    use crate::storage::MemoryStorage;

    fn user() -> User {
        User {
            id: "u-1".into(),
            email: "climber@example.com".into(),
            role: Role::User,
            first_name: None,
            last_name: None,
        }
    }

    async fn open_store(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::open(storage, StorageKeys::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn starts_unauthenticated_with_empty_storage() {
        let store = open_store(Arc::new(MemoryStorage::new())).await;
        assert!(!store.get().is_authenticated());
    }

    #[tokio::test]
    async fn set_authenticated_persists_both_keys_and_notifies() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open_store(Arc::clone(&storage)).await;

        let mut rx = store.subscribe();
        assert!(!rx.borrow_and_update().is_authenticated());

        store.set_authenticated("tok".into(), user()).await.unwrap();

        assert!(store.get().is_authenticated());
        assert_eq!(storage.get("auth.token").await.unwrap().as_deref(), Some("tok"));
        assert!(storage.get("auth.user").await.unwrap().is_some());

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_authenticated());
    }

    #[tokio::test]
    async fn subscriber_sees_current_value_at_subscription() {
        let store = open_store(Arc::new(MemoryStorage::new())).await;
        store.set_authenticated("tok".into(), user()).await.unwrap();

        // A late subscriber must not observe a stale snapshot.
        let rx = store.subscribe();
        assert!(rx.borrow().is_authenticated());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open_store(Arc::clone(&storage)).await;
        store.set_authenticated("tok".into(), user()).await.unwrap();

        store.clear().await.unwrap();
        let after_first = store.get();
        assert!(!after_first.is_authenticated());
        assert!(storage.get("auth.token").await.unwrap().is_none());
        assert!(storage.get("auth.user").await.unwrap().is_none());

        store.clear().await.unwrap();
        assert_eq!(store.get(), after_first);
        assert!(storage.get("auth.token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restores_session_when_both_keys_parse() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed("auth.token", "tok").await;
        storage
            .seed("auth.user", &serde_json::to_string(&user()).unwrap())
            .await;

        let store = open_store(storage).await;
        let state = store.get();
        assert!(state.is_authenticated());
        assert_eq!(state.token(), Some("tok"));
    }

    #[tokio::test]
    async fn corrupt_user_blob_clears_storage_on_open() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed("auth.token", "tok").await;
        storage.seed("auth.user", "{ not json").await;

        let store = open_store(Arc::clone(&storage)).await;
        assert!(!store.get().is_authenticated());
        assert!(storage.get("auth.token").await.unwrap().is_none());
        assert!(storage.get("auth.user").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_pair_clears_storage_on_open() {
        let storage = Arc::new(MemoryStorage::new());
        storage.seed("auth.token", "tok").await;

        let store = open_store(Arc::clone(&storage)).await;
        assert!(!store.get().is_authenticated());
        assert!(storage.get("auth.token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stale_login_completion_is_discarded() {
        let store = open_store(Arc::new(MemoryStorage::new())).await;

        // Login starts, captures the epoch...
        let epoch = store.epoch();
        // ...a logout lands first...
        store.clear().await.unwrap();
        // ...then the login response arrives.
        let committed = store
            .commit_if_current(epoch, "tok".into(), user())
            .await
            .unwrap();

        assert!(!committed);
        assert!(!store.get().is_authenticated());
    }

    #[tokio::test]
    async fn current_login_completion_commits() {
        let store = open_store(Arc::new(MemoryStorage::new())).await;
        let epoch = store.epoch();
        let committed = store
            .commit_if_current(epoch, "tok".into(), user())
            .await
            .unwrap();
        assert!(committed);
        assert!(store.get().is_authenticated());
    }
}
