use std::sync::Arc;

use tracing::{debug, info};

use feedline_core::{
    Aggregator, Chat, CoreError, EntityKind, Message, Messages, Post, Posts, Session, User, Users,
};
use feedline_store::KvStore;
use feedline_sync::{Synchronizer, WriteStats};
use feedline_types::{Clock, CommentId, MessageId, PostId, SystemClock, UserId};

use crate::draft::{PostDraft, Profile, PublicUser};
use crate::error::SdkResult;

/// The Feedline application state.
///
/// Owns the three collection snapshots, the session, and the synchronizer.
/// Mutations take `&mut self`, so they never interleave; each one swaps in
/// the new snapshot and schedules its write before returning.
pub struct Feedline<S> {
    users: Users,
    posts: Posts,
    messages: Messages,
    session: Session,
    sync: Synchronizer<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KvStore + 'static> Feedline<S> {
    /// Load state from `store` and resume the persisted session, if its user
    /// still exists.
    pub async fn open(store: Arc<S>) -> SdkResult<Self> {
        Self::open_with_clock(store, Arc::new(SystemClock::new())).await
    }

    pub async fn open_with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> SdkResult<Self> {
        let sync = Synchronizer::new(store)?;
        let state = sync.load().await?;

        let persisted = state.session.clone();
        let session = persisted
            .clone()
            .map(Session::resume)
            .unwrap_or_default()
            .reconcile(&state.users);
        if session.user() != persisted.as_ref() {
            sync.persist_session(session.user());
        }

        info!(signed_in = session.is_active(), "feedline opened");
        Ok(Self {
            users: state.users,
            posts: state.posts,
            messages: state.messages,
            session,
            sync,
            clock,
        })
    }

    // ---- State ----

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn posts(&self) -> &Posts {
        &self.posts
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Find a user by id, exact email, or exact username (first match).
    pub fn resolve_user(&self, handle: &str) -> SdkResult<&User> {
        let handle = handle.trim();
        self.users
            .iter()
            .find(|u| u.id.as_str() == handle)
            .or_else(|| self.users.find_by_email(handle))
            .or_else(|| self.users.iter().find(|u| u.username == handle))
            .ok_or_else(|| CoreError::not_found(EntityKind::User, handle).into())
    }

    // ---- Session ----

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> SdkResult<User> {
        let (users, session) = Session::register(&self.users, username, email, password)?;
        self.set_users(users);
        self.set_session(session);
        Ok(self.session.require()?.clone())
    }

    pub fn login(&mut self, email: &str, password: &str) -> SdkResult<User> {
        let session = Session::login(&self.users, email, password)?;
        self.set_session(session);
        Ok(self.session.require()?.clone())
    }

    pub fn logout(&mut self) {
        let session = self.session.logout();
        self.set_session(session);
    }

    pub fn update_avatar(&mut self, avatar: Option<String>) -> SdkResult<()> {
        let (users, session) = self.session.update_avatar(&self.users, avatar)?;
        self.set_users(users);
        self.set_session(session);
        Ok(())
    }

    // ---- Posts ----

    pub fn create_post(&mut self, draft: PostDraft) -> SdkResult<PostId> {
        let me = self.session.require()?;
        let (posts, id) =
            self.posts
                .create_post(me, &draft.content, draft.media, self.clock.as_ref())?;
        self.set_posts(posts);
        Ok(id)
    }

    /// Flip the signed-in user's like. Returns whether the post is now liked;
    /// an unknown post is ignored and reported as not liked.
    pub fn toggle_like(&mut self, post: &PostId) -> SdkResult<bool> {
        let me = self.session.require()?.id.clone();
        let posts = self.posts.toggle_like(post, &me);
        let liked = posts.find(post).is_some_and(|p| p.is_liked_by(&me));
        self.set_posts(posts);
        Ok(liked)
    }

    pub fn add_comment(&mut self, post: &PostId, content: &str) -> SdkResult<CommentId> {
        let me = self.session.require()?;
        let (posts, id) = self
            .posts
            .add_comment(post, me, content, self.clock.as_ref())?;
        self.set_posts(posts);
        Ok(id)
    }

    // ---- Friends ----

    pub fn add_friend(&mut self, target: &UserId) -> SdkResult<()> {
        let me = self.session.require()?;
        let users = self.users.add_friend(&me.id, target)?;
        self.set_users(users);
        Ok(())
    }

    pub fn remove_friend(&mut self, target: &UserId) -> SdkResult<()> {
        let me = self.session.require()?;
        let users = self.users.remove_friend(&me.id, target)?;
        self.set_users(users);
        Ok(())
    }

    // ---- Messages ----

    pub fn send_message(&mut self, receiver: &UserId, content: &str) -> SdkResult<MessageId> {
        let me = self.session.require()?;
        let (messages, id) = self.messages.send_message(
            &self.users,
            &me.id,
            receiver,
            content,
            self.clock.as_ref(),
        )?;
        self.set_messages(messages);
        Ok(id)
    }

    /// Mark everything `peer` sent to the signed-in user as read and return
    /// the conversation, oldest first.
    pub fn open_chat(&mut self, peer: &UserId) -> SdkResult<Vec<Message>> {
        let me = self.session.require()?.id.clone();
        if !self.users.contains(peer) {
            return Err(CoreError::not_found(EntityKind::User, peer).into());
        }
        let (messages, flipped) = self.messages.mark_read(&me, peer);
        if flipped > 0 {
            debug!(peer = %peer, flipped, "messages marked read");
        }
        self.set_messages(messages);
        Ok(Aggregator::transcript(&me, peer, &self.messages)
            .into_iter()
            .cloned()
            .collect())
    }

    // ---- Views ----

    /// All posts, newest first.
    pub fn feed(&self) -> &[Post] {
        self.posts.as_slice()
    }

    pub fn chats(&self) -> SdkResult<Vec<Chat>> {
        let me = self.session.require()?;
        Ok(Aggregator::chats(me, &self.users, &self.messages))
    }

    pub fn transcript(&self, peer: &UserId) -> SdkResult<Vec<&Message>> {
        let me = self.session.require()?;
        Ok(Aggregator::transcript(&me.id, peer, &self.messages))
    }

    pub fn search_users(&self, query: &str) -> SdkResult<Vec<&User>> {
        let me = self.session.require()?;
        Ok(Aggregator::search_users(&me.id, &self.users, query))
    }

    pub fn friends(&self) -> SdkResult<Vec<&User>> {
        let me = self.session.require()?;
        Ok(Aggregator::friends_of(me, &self.users))
    }

    /// Profile of any user; no session required.
    pub fn profile(&self, user: &UserId) -> SdkResult<Profile> {
        let user = self
            .users
            .find(user)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, user))?;
        Ok(Profile {
            user: PublicUser::from(user),
            stats: Aggregator::profile_stats(user, &self.posts),
            posts: Aggregator::posts_by(&user.id, &self.posts)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    // ---- Persistence ----

    /// Wait for all scheduled writes to finish.
    pub async fn flush(&self) {
        self.sync.flush().await;
    }

    pub fn write_stats(&self) -> WriteStats {
        self.sync.stats()
    }

    pub fn store(&self) -> &Arc<S> {
        self.sync.store()
    }

    // Each setter is a no-op when the core returned the same snapshot.

    fn set_users(&mut self, users: Users) {
        if users.same_as(&self.users) {
            return;
        }
        self.sync.persist_users(&users);
        self.users = users;
        let session = self.session.reconcile(&self.users);
        self.set_session(session);
    }

    fn set_posts(&mut self, posts: Posts) {
        if posts.same_as(&self.posts) {
            return;
        }
        self.sync.persist_posts(&posts);
        self.posts = posts;
    }

    fn set_messages(&mut self, messages: Messages) {
        if messages.same_as(&self.messages) {
            return;
        }
        self.sync.persist_messages(&messages);
        self.messages = messages;
    }

    fn set_session(&mut self, session: Session) {
        if session == self.session {
            return;
        }
        self.sync.persist_session(session.user());
        self.session = session;
    }
}
