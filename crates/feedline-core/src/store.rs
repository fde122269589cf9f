//! Mutation engine.
//!
//! Every operation takes the current snapshot by reference and returns a new
//! one. Inputs are validated before any copy is made, so a failed operation
//! costs nothing and leaves no partial state.
//!
//! Missing-entity policy, per operation:
//!
//! | operation        | unknown id                    |
//! |------------------|-------------------------------|
//! | `toggle_like`    | no-op, snapshot returned as-is |
//! | `add_comment`    | `NotFound(post)`              |
//! | `add_friend`     | `NotFound(user)`              |
//! | `remove_friend`  | `NotFound(user)` for the owner; non-friend is a no-op |
//! | `send_message`   | `NotFound(user)` for the receiver |
//! | `mark_read`      | nothing matches, zero flipped |

use std::collections::BTreeSet;

use tracing::debug;

use feedline_types::{Clock, CommentId, Media, MessageId, PostId, UserId};

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::model::{Comment, Message, Post, User};
use crate::snapshot::{Messages, Posts, Users};

impl Posts {
    /// Publish a post by `author`, placed at the front of the feed.
    ///
    /// Storage order is the feed order: the newest post is first because it
    /// was prepended, not because anything sorts by timestamp.
    pub fn create_post(
        &self,
        author: &User,
        content: &str,
        media: Option<Media>,
        clock: &dyn Clock,
    ) -> CoreResult<(Posts, PostId)> {
        if content.trim().is_empty() && media.is_none() {
            return Err(CoreError::EmptyPost);
        }

        let post = Post {
            id: PostId::new(),
            author_id: author.id.clone(),
            author_username: author.username.clone(),
            author_avatar: author.avatar.clone(),
            content: content.to_string(),
            media,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            created_at: clock.now(),
        };
        let id = post.id.clone();
        let posts = self.derive(|items| items.insert(0, post));
        debug!(post = %id, author = %author.id, "post created");
        Ok((posts, id))
    }

    /// Flip `user`'s like on a post. Applying it twice restores the original
    /// like set.
    ///
    /// An unknown post id is a deliberate no-op: the current snapshot is
    /// returned unchanged (same handle), since a like on a post that is gone
    /// has nothing to attach to and nothing to report.
    pub fn toggle_like(&self, post_id: &PostId, user: &UserId) -> Posts {
        let Some(index) = self.iter().position(|p| &p.id == post_id) else {
            debug!(post = %post_id, "like on unknown post ignored");
            return self.clone();
        };

        self.derive(|items| {
            let likes = &mut items[index].likes;
            if !likes.remove(user) {
                likes.insert(user.clone());
            }
        })
    }

    /// Append a comment by `author`. Comments keep strict insertion order.
    pub fn add_comment(
        &self,
        post_id: &PostId,
        author: &User,
        content: &str,
        clock: &dyn Clock,
    ) -> CoreResult<(Posts, CommentId)> {
        if content.trim().is_empty() {
            return Err(CoreError::MissingField { field: "content" });
        }
        let index = self
            .iter()
            .position(|p| &p.id == post_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Post, post_id))?;

        let comment = Comment {
            id: CommentId::new(),
            author_id: author.id.clone(),
            author_username: author.username.clone(),
            content: content.to_string(),
            created_at: clock.now(),
        };
        let id = comment.id.clone();
        let posts = self.derive(|items| items[index].comments.push(comment));
        Ok((posts, id))
    }
}

impl Users {
    /// Add `target` to `owner`'s friend list.
    ///
    /// The relation is directed: only `owner`'s record changes. Adding an
    /// existing friend returns the snapshot unchanged.
    pub fn add_friend(&self, owner: &UserId, target: &UserId) -> CoreResult<Users> {
        if owner == target {
            return Err(CoreError::SelfReference);
        }
        if !self.contains(target) {
            return Err(CoreError::not_found(EntityKind::User, target));
        }
        let index = self.index_of(owner)?;
        if self[index].follows(target) {
            return Ok(self.clone());
        }
        Ok(self.derive(|items| items[index].friends.push(target.clone())))
    }

    /// Remove `target` from `owner`'s friend list. Only `owner`'s record
    /// changes; removing a non-friend returns the snapshot unchanged.
    pub fn remove_friend(&self, owner: &UserId, target: &UserId) -> CoreResult<Users> {
        let index = self.index_of(owner)?;
        if !self[index].follows(target) {
            return Ok(self.clone());
        }
        Ok(self.derive(|items| items[index].friends.retain(|id| id != target)))
    }

    /// Replace one user's avatar.
    pub fn set_avatar(&self, owner: &UserId, avatar: Option<String>) -> CoreResult<Users> {
        let index = self.index_of(owner)?;
        Ok(self.derive(|items| items[index].avatar = avatar))
    }

    fn index_of(&self, id: &UserId) -> CoreResult<usize> {
        self.iter()
            .position(|u| &u.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::User, id))
    }
}

impl Messages {
    /// Append a new unread message from `sender` to `receiver`.
    pub fn send_message(
        &self,
        users: &Users,
        sender: &UserId,
        receiver: &UserId,
        content: &str,
        clock: &dyn Clock,
    ) -> CoreResult<(Messages, MessageId)> {
        if content.trim().is_empty() {
            return Err(CoreError::EmptyMessage);
        }
        if !users.contains(receiver) {
            return Err(CoreError::not_found(EntityKind::User, receiver));
        }

        let message = Message {
            id: MessageId::new(),
            sender_id: sender.clone(),
            receiver_id: receiver.clone(),
            content: content.to_string(),
            created_at: clock.now(),
            read: false,
        };
        let id = message.id.clone();
        let messages = self.derive(|items| items.push(message));
        debug!(message = %id, from = %sender, to = %receiver, "message sent");
        Ok((messages, id))
    }

    /// Mark every unread message from `peer` to `reader` as read.
    ///
    /// Returns the new snapshot and how many messages flipped. When nothing
    /// flips the current snapshot is returned as-is.
    pub fn mark_read(&self, reader: &UserId, peer: &UserId) -> (Messages, usize) {
        let unread = self
            .iter()
            .filter(|m| m.is_unread_from(peer, reader))
            .count();
        if unread == 0 {
            return (self.clone(), 0);
        }

        let messages = self.derive(|items| {
            for m in items.iter_mut().filter(|m| m.is_unread_from(peer, reader)) {
                m.read = true;
            }
        });
        (messages, unread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedline_types::{ManualClock, MediaKind, Timestamp};
    use proptest::prelude::*;

    fn user(name: &str) -> User {
        User::new(name, format!("{name}@x.com"), "pw")
    }

    fn users_of(list: &[&User]) -> Users {
        list.iter().map(|u| (*u).clone()).collect::<Vec<_>>().into()
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    #[test]
    fn create_post_prepends() {
        let clock = ManualClock::new(100);
        let alice = user("alice");
        let (posts, first) = Posts::empty()
            .create_post(&alice, "one", None, &clock)
            .unwrap();
        clock.advance(1);
        let (posts, second) = posts.create_post(&alice, "two", None, &clock).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, second);
        assert_eq!(posts[1].id, first);
        assert_eq!(posts[0].created_at, Timestamp::from_millis(101));
    }

    #[test]
    fn create_post_keeps_storage_order_over_timestamps() {
        let clock = ManualClock::new(500);
        let alice = user("alice");
        let (posts, _) = Posts::empty()
            .create_post(&alice, "later", None, &clock)
            .unwrap();
        clock.set(10);
        let (posts, _) = posts.create_post(&alice, "earlier", None, &clock).unwrap();
        assert_eq!(posts[0].content, "earlier");
    }

    #[test]
    fn create_post_requires_text_or_media() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let err = Posts::empty()
            .create_post(&alice, "   ", None, &clock)
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyPost);

        let (posts, _) = Posts::empty()
            .create_post(&alice, "", Some(Media::image("data:x")), &clock)
            .unwrap();
        assert_eq!(posts[0].media.as_ref().unwrap().kind, MediaKind::Image);
    }

    #[test]
    fn create_post_denormalizes_author() {
        let clock = ManualClock::new(0);
        let mut alice = user("alice");
        alice.avatar = Some("data:avatar".into());
        let (posts, _) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();
        assert_eq!(posts[0].author_username, "alice");
        assert_eq!(posts[0].author_avatar.as_deref(), Some("data:avatar"));
    }

    #[test]
    fn mutation_does_not_touch_input_snapshot() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let (posts, id) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();
        let liked = posts.toggle_like(&id, &alice.id);
        assert!(liked[0].is_liked_by(&alice.id));
        assert!(!posts[0].is_liked_by(&alice.id));
    }

    #[test]
    fn toggle_like_adds_then_removes() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let bob = user("bob");
        let (posts, id) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();

        let posts = posts.toggle_like(&id, &bob.id);
        assert_eq!(posts[0].like_count(), 1);
        let posts = posts.toggle_like(&id, &alice.id);
        assert_eq!(posts[0].like_count(), 2);
        let posts = posts.toggle_like(&id, &bob.id);
        assert_eq!(posts[0].like_count(), 1);
        assert!(posts[0].is_liked_by(&alice.id));
    }

    #[test]
    fn toggle_like_on_unknown_post_is_noop() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let (posts, _) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();
        let after = posts.toggle_like(&PostId::new(), &alice.id);
        assert!(after.same_as(&posts));
    }

    #[test]
    fn comments_keep_insertion_order() {
        let clock = ManualClock::new(1_000);
        let alice = user("alice");
        let bob = user("bob");
        let (mut posts, id) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();

        // Clock runs backwards on purpose: order must still be insertion order.
        for (i, who) in [&bob, &alice, &bob].into_iter().enumerate() {
            clock.set(1_000 - i as u64);
            let (next, _) = posts
                .add_comment(&id, who, &format!("c{i}"), &clock)
                .unwrap();
            posts = next;
        }

        let contents: Vec<_> = posts[0].comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["c0", "c1", "c2"]);
        assert_eq!(posts[0].comments[1].author_username, "alice");
    }

    #[test]
    fn comment_on_unknown_post_is_not_found() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let err = Posts::empty()
            .add_comment(&PostId::new(), &alice, "hello", &clock)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::Post, .. }));
    }

    #[test]
    fn blank_comment_is_rejected() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let (posts, id) = Posts::empty()
            .create_post(&alice, "hi", None, &clock)
            .unwrap();
        let err = posts.add_comment(&id, &alice, " \n", &clock).unwrap_err();
        assert_eq!(err, CoreError::MissingField { field: "content" });
    }

    // -----------------------------------------------------------------------
    // Friends
    // -----------------------------------------------------------------------

    #[test]
    fn add_friend_is_directed() {
        let alice = user("alice");
        let bob = user("bob");
        let users = users_of(&[&alice, &bob]);

        let users = users.add_friend(&alice.id, &bob.id).unwrap();
        let a = users.find(&alice.id).unwrap();
        let b = users.find(&bob.id).unwrap();
        assert!(a.follows(&bob.id));
        assert!(!b.follows(&alice.id));

        let users = users.add_friend(&bob.id, &alice.id).unwrap();
        assert!(users.find(&bob.id).unwrap().follows(&alice.id));
    }

    #[test]
    fn add_friend_twice_is_noop() {
        let alice = user("alice");
        let bob = user("bob");
        let users = users_of(&[&alice, &bob])
            .add_friend(&alice.id, &bob.id)
            .unwrap();
        let again = users.add_friend(&alice.id, &bob.id).unwrap();
        assert!(again.same_as(&users));
        assert_eq!(again.find(&alice.id).unwrap().friends.len(), 1);
    }

    #[test]
    fn add_friend_rejects_self_and_unknown() {
        let alice = user("alice");
        let users = users_of(&[&alice]);
        assert_eq!(
            users.add_friend(&alice.id, &alice.id).unwrap_err(),
            CoreError::SelfReference
        );
        let err = users.add_friend(&alice.id, &UserId::new()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: EntityKind::User, .. }));
    }

    #[test]
    fn remove_friend_only_touches_owner() {
        let alice = user("alice");
        let bob = user("bob");
        let users = users_of(&[&alice, &bob])
            .add_friend(&alice.id, &bob.id)
            .unwrap()
            .add_friend(&bob.id, &alice.id)
            .unwrap();

        let users = users.remove_friend(&alice.id, &bob.id).unwrap();
        assert!(!users.find(&alice.id).unwrap().follows(&bob.id));
        assert!(users.find(&bob.id).unwrap().follows(&alice.id));

        let same = users.remove_friend(&alice.id, &bob.id).unwrap();
        assert!(same.same_as(&users));
    }

    #[test]
    fn friend_order_is_add_order() {
        let alice = user("alice");
        let bob = user("bob");
        let carol = user("carol");
        let users = users_of(&[&alice, &bob, &carol])
            .add_friend(&alice.id, &carol.id)
            .unwrap()
            .add_friend(&alice.id, &bob.id)
            .unwrap();
        assert_eq!(
            users.find(&alice.id).unwrap().friends,
            vec![carol.id.clone(), bob.id.clone()]
        );
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    #[test]
    fn send_message_appends_unread() {
        let clock = ManualClock::new(7);
        let alice = user("alice");
        let bob = user("bob");
        let users = users_of(&[&alice, &bob]);

        let (messages, id) = Messages::empty()
            .send_message(&users, &alice.id, &bob.id, "hi", &clock)
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, id);
        assert!(!messages[0].read);
        assert_eq!(messages[0].created_at, Timestamp::from_millis(7));
    }

    #[test]
    fn blank_message_is_rejected() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let bob = user("bob");
        let users = users_of(&[&alice, &bob]);
        let err = Messages::empty()
            .send_message(&users, &alice.id, &bob.id, "  ", &clock)
            .unwrap_err();
        assert_eq!(err, CoreError::EmptyMessage);
    }

    #[test]
    fn message_to_unknown_user_is_not_found() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let users = users_of(&[&alice]);
        let err = Messages::empty()
            .send_message(&users, &alice.id, &UserId::new(), "hi", &clock)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn mark_read_flips_only_incoming_from_peer() {
        let clock = ManualClock::new(0);
        let alice = user("alice");
        let bob = user("bob");
        let carol = user("carol");
        let users = users_of(&[&alice, &bob, &carol]);

        let (m, _) = Messages::empty()
            .send_message(&users, &bob.id, &alice.id, "1", &clock)
            .unwrap();
        let (m, _) = m.send_message(&users, &alice.id, &bob.id, "2", &clock).unwrap();
        let (m, _) = m.send_message(&users, &carol.id, &alice.id, "3", &clock).unwrap();
        let (m, _) = m.send_message(&users, &bob.id, &alice.id, "4", &clock).unwrap();

        let (after, flipped) = m.mark_read(&alice.id, &bob.id);
        assert_eq!(flipped, 2);
        let read: Vec<bool> = after.iter().map(|m| m.read).collect();
        assert_eq!(read, [true, false, false, true]);

        let (again, flipped) = after.mark_read(&alice.id, &bob.id);
        assert_eq!(flipped, 0);
        assert!(again.same_as(&after));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn toggle_like_twice_is_identity(
            initial in proptest::collection::btree_set("[a-z]{1,6}", 0..8),
            who in "[a-z]{1,6}",
        ) {
            let clock = ManualClock::new(0);
            let alice = user("alice");
            let (posts, id) = Posts::empty()
                .create_post(&alice, "p", None, &clock)
                .unwrap();
            let likes: BTreeSet<UserId> = initial
                .iter()
                .map(|s| UserId::parse(s).unwrap())
                .collect();
            let posts = posts.derive(|items| items[0].likes = likes.clone());
            let who = UserId::parse(&who).unwrap();

            let twice = posts.toggle_like(&id, &who).toggle_like(&id, &who);
            prop_assert_eq!(&twice[0].likes, &likes);
        }
    }
}
