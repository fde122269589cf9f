use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use feedline_core::{Messages, Posts, User, Users};
use feedline_store::KvStore;

use crate::error::{SyncError, SyncResult};
use crate::keys::BlobKey;
use crate::writer::{WriteBehind, WriteOp, WriteStats};

/// Everything read from the store at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadedState {
    pub users: Users,
    pub posts: Posts,
    pub messages: Messages,
    /// The persisted session record, not yet checked against `users`.
    pub session: Option<User>,
}

/// Mirrors in-memory snapshots into a [`KvStore`].
///
/// Reads happen once, at startup, through [`load`](Self::load). After that
/// every `persist_*` call hands the full collection to a background writer
/// and returns immediately. A failed write is logged and counted; it never
/// reaches the caller and never alters memory.
pub struct Synchronizer<S> {
    store: Arc<S>,
    writer: WriteBehind<S>,
}

impl<S: KvStore + 'static> Synchronizer<S> {
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<S>) -> SyncResult<Self> {
        let writer = WriteBehind::new(Arc::clone(&store))?;
        Ok(Self { store, writer })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Read Users, Posts, Messages and Session, in that order.
    ///
    /// Missing blobs give empty collections and no session. A blob that is
    /// present but does not decode fails the whole load.
    pub async fn load(&self) -> SyncResult<LoadedState> {
        let mut blobs: [Option<String>; 4] = Default::default();
        for key in BlobKey::LOAD_ORDER {
            blobs[key.index()] = self.fetch(key).await?;
        }
        let mut take = |key: BlobKey| blobs[key.index()].take();

        let users: Option<Users> = decode(BlobKey::Users, take(BlobKey::Users))?;
        let posts: Option<Posts> = decode(BlobKey::Posts, take(BlobKey::Posts))?;
        let messages: Option<Messages> = decode(BlobKey::Messages, take(BlobKey::Messages))?;
        // The first client wrote `null` after sign-out instead of deleting.
        let session: Option<Option<User>> = decode(BlobKey::Session, take(BlobKey::Session))?;

        let state = LoadedState {
            users: users.unwrap_or_default(),
            posts: posts.unwrap_or_default(),
            messages: messages.unwrap_or_default(),
            session: session.flatten(),
        };
        info!(
            users = state.users.len(),
            posts = state.posts.len(),
            messages = state.messages.len(),
            session = state.session.is_some(),
            "state loaded"
        );
        Ok(state)
    }

    async fn fetch(&self, key: BlobKey) -> SyncResult<Option<String>> {
        let stored = self.store.get(key.name(), key.scope()).await?;
        if stored.is_none() {
            debug!(%key, "blob absent");
        }
        Ok(stored.map(|s| s.value))
    }

    pub fn persist_users(&self, users: &Users) {
        self.persist(BlobKey::Users, users);
    }

    pub fn persist_posts(&self, posts: &Posts) {
        self.persist(BlobKey::Posts, posts);
    }

    pub fn persist_messages(&self, messages: &Messages) {
        self.persist(BlobKey::Messages, messages);
    }

    /// Write the signed-in user, or remove the session blob when `None`.
    pub fn persist_session(&self, user: Option<&User>) {
        match user {
            Some(user) => self.persist(BlobKey::Session, user),
            None => self.writer.schedule(BlobKey::Session, WriteOp::Delete),
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, key: BlobKey, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.writer.schedule(key, WriteOp::Put(json)),
            Err(e) => {
                self.writer.record_failure();
                warn!(%key, error = %e, "failed to encode snapshot; write skipped");
            }
        }
    }

    /// Wait for every write scheduled so far to land (or fail).
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub fn stats(&self) -> WriteStats {
        self.writer.stats()
    }

    /// Writes that failed to encode or were rejected by the store.
    pub fn failed_writes(&self) -> u64 {
        self.writer.stats().failed
    }
}

fn decode<T: DeserializeOwned>(key: BlobKey, raw: Option<String>) -> SyncResult<Option<T>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| SyncError::Decode {
            key: key.name(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use feedline_core::Session;
    use feedline_store::{InMemoryKvStore, Scope, StoreError, StoreResult, StoredValue};
    use feedline_types::ManualClock;

    fn sync_over(store: &Arc<InMemoryKvStore>) -> Synchronizer<InMemoryKvStore> {
        Synchronizer::new(Arc::clone(store)).unwrap()
    }

    fn sample() -> (Users, Posts, User) {
        let (users, session) =
            Session::register(&Users::empty(), "alice", "alice@x.com", "pw").unwrap();
        let alice = session.require().unwrap().clone();
        let (posts, _) = Posts::empty()
            .create_post(&alice, "hello", None, &ManualClock::new(1))
            .unwrap();
        (users, posts, alice)
    }

    #[tokio::test]
    async fn empty_store_loads_empty_state() {
        let store = Arc::new(InMemoryKvStore::new());
        let state = sync_over(&store).load().await.unwrap();
        assert_eq!(state, LoadedState::default());
    }

    #[tokio::test]
    async fn persisted_state_round_trips() {
        let store = Arc::new(InMemoryKvStore::new());
        let sync = sync_over(&store);
        let (users, posts, alice) = sample();

        sync.persist_users(&users);
        sync.persist_posts(&posts);
        sync.persist_session(Some(&alice));
        sync.flush().await;

        assert_eq!(store.keys(Scope::Shared), vec!["app_posts", "app_users"]);
        assert_eq!(store.keys(Scope::Local), vec!["app_current_user"]);

        let state = sync_over(&store).load().await.unwrap();
        assert_eq!(state.users, users);
        assert_eq!(state.posts, posts);
        assert!(state.messages.is_empty());
        assert_eq!(state.session, Some(alice));
    }

    #[tokio::test]
    async fn clearing_session_deletes_blob() {
        let store = Arc::new(InMemoryKvStore::new());
        let sync = sync_over(&store);
        let (_, _, alice) = sample();

        sync.persist_session(Some(&alice));
        sync.flush().await;
        sync.persist_session(None);
        sync.flush().await;

        assert!(store.peek("app_current_user", Scope::Local).is_none());
    }

    #[tokio::test]
    async fn null_session_blob_means_signed_out() {
        let store = Arc::new(InMemoryKvStore::new());
        store
            .set("app_current_user", "null".into(), Scope::Local)
            .await
            .unwrap();
        let state = sync_over(&store).load().await.unwrap();
        assert_eq!(state.session, None);
    }

    #[tokio::test]
    async fn corrupt_blob_is_an_error() {
        let store = Arc::new(InMemoryKvStore::new());
        store
            .set("app_posts", "{not json".into(), Scope::Shared)
            .await
            .unwrap();
        let err = sync_over(&store).load().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode { key: "app_posts", .. }));
        // Still there; nothing overwrote it.
        assert_eq!(
            store.peek("app_posts", Scope::Shared).as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn post_with_half_media_is_a_decode_error() {
        let store = Arc::new(InMemoryKvStore::new());
        let posts = r#"[{"id":"p1","userId":"u1","username":"alice","content":"",
            "mediaUrl":"data:image/png;base64,AAAA","timestamp":1}]"#;
        store.set("app_posts", posts.into(), Scope::Shared).await.unwrap();

        let err = sync_over(&store).load().await.unwrap_err();
        assert!(matches!(err, SyncError::Decode { key: "app_posts", .. }));
        assert_eq!(store.peek("app_posts", Scope::Shared).as_deref(), Some(posts));
    }

    /// Passes reads through to an in-memory store and records their keys.
    struct RecordingStore {
        inner: InMemoryKvStore,
        reads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl KvStore for RecordingStore {
        async fn get(&self, key: &str, scope: Scope) -> StoreResult<Option<StoredValue>> {
            self.reads.lock().expect("lock poisoned").push(key.to_string());
            self.inner.get(key, scope).await
        }

        async fn set(&self, key: &str, value: String, scope: Scope) -> StoreResult<()> {
            self.inner.set(key, value, scope).await
        }

        async fn delete(&self, key: &str, scope: Scope) -> StoreResult<()> {
            self.inner.delete(key, scope).await
        }
    }

    #[tokio::test]
    async fn load_reads_users_posts_messages_then_session() {
        let store = Arc::new(RecordingStore {
            inner: InMemoryKvStore::new(),
            reads: Mutex::new(Vec::new()),
        });
        let (users, posts, alice) = sample();
        let sync = Synchronizer::new(Arc::clone(&store)).unwrap();
        sync.persist_users(&users);
        sync.persist_posts(&posts);
        sync.persist_session(Some(&alice));
        sync.flush().await;

        let state = sync.load().await.unwrap();
        assert_eq!(state.session, Some(alice));
        assert_eq!(
            *store.reads.lock().unwrap(),
            ["app_users", "app_posts", "app_messages", "app_current_user"]
        );
    }

    #[tokio::test]
    async fn legacy_blobs_load() {
        let store = Arc::new(InMemoryKvStore::new());
        let users = r#"[{"id":"1717000000000","username":"alice","email":"a@x.com",
            "password":"pw","friends":["1717000000001"]},
            {"id":"1717000000001","username":"bob","email":"b@x.com","password":"pw"}]"#;
        let messages = r#"[{"id":"1718000000001","senderId":"1717000000001",
            "receiverId":"1717000000000","content":"hi","timestamp":1718000000001}]"#;
        store.set("app_users", users.into(), Scope::Shared).await.unwrap();
        store
            .set("app_messages", messages.into(), Scope::Shared)
            .await
            .unwrap();

        let state = sync_over(&store).load().await.unwrap();
        assert_eq!(state.users.len(), 2);
        assert!(state.users[1].friends.is_empty());
        assert_eq!(state.messages.len(), 1);
        assert!(!state.messages[0].read);
    }

    #[tokio::test]
    async fn later_write_supersedes_pending_one() {
        let store = Arc::new(InMemoryKvStore::new());
        let sync = sync_over(&store);
        let (mut users, _, _) = sample();
        for i in 0..5 {
            let (next, _) =
                Session::register(&users, &format!("u{i}"), &format!("u{i}@x.com"), "pw")
                    .unwrap();
            sync.persist_users(&next);
            users = next;
        }
        sync.flush().await;

        let stats = sync.stats();
        assert_eq!(stats.scheduled, 5);
        assert_eq!(stats.written + stats.superseded, 5);
        assert!(stats.written >= 1);

        let state = sync_over(&store).load().await.unwrap();
        assert_eq!(state.users, users);
        assert_eq!(state.users.len(), 6);
    }

    struct BrokenStore;

    #[async_trait]
    impl KvStore for BrokenStore {
        async fn get(&self, _key: &str, _scope: Scope) -> StoreResult<Option<StoredValue>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String, _scope: Scope) -> StoreResult<()> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }

        async fn delete(&self, _key: &str, _scope: Scope) -> StoreResult<()> {
            Err(StoreError::Unavailable("quota exceeded".into()))
        }
    }

    #[tokio::test]
    async fn failed_writes_are_counted_not_raised() {
        let sync = Synchronizer::new(Arc::new(BrokenStore)).unwrap();
        let (users, posts, _) = sample();
        sync.persist_users(&users);
        sync.persist_posts(&posts);
        sync.flush().await;

        assert_eq!(sync.failed_writes(), 2);
        assert_eq!(sync.stats().written, 0);
    }

    #[test]
    fn new_outside_runtime_fails() {
        let store = Arc::new(InMemoryKvStore::new());
        assert!(matches!(
            Synchronizer::new(store),
            Err(SyncError::NoRuntime)
        ));
    }
}
