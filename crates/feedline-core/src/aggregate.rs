use serde::Serialize;

use feedline_types::UserId;

use crate::model::{Message, Post, User};
use crate::snapshot::{Messages, Posts, Users};

/// Summary of the conversation between the signed-in user and one friend.
/// Derived on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub peer_id: UserId,
    pub peer_username: String,
    pub peer_avatar: Option<String>,
    pub last_message: Option<String>,
    pub unread_count: usize,
}

/// Counters shown on a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub post_count: usize,
    pub friend_count: usize,
}

/// Deterministic view builders over collection snapshots.
pub struct Aggregator;

impl Aggregator {
    /// One chat per friend of `me`, in friend-list order.
    ///
    /// Friend ids that no longer resolve to a user are skipped. The last
    /// message is the latest by timestamp; on a timestamp tie the one stored
    /// first wins.
    pub fn chats(me: &User, users: &Users, messages: &Messages) -> Vec<Chat> {
        me.friends
            .iter()
            .filter_map(|friend_id| users.find(friend_id))
            .map(|friend| {
                let last_message = messages
                    .iter()
                    .filter(|m| m.is_between(&me.id, &friend.id))
                    .fold(None, |best: Option<&Message>, m| match best {
                        Some(b) if b.created_at >= m.created_at => Some(b),
                        _ => Some(m),
                    })
                    .map(|m| m.content.clone());
                let unread_count = messages
                    .iter()
                    .filter(|m| m.is_unread_from(&friend.id, &me.id))
                    .count();
                Chat {
                    peer_id: friend.id.clone(),
                    peer_username: friend.username.clone(),
                    peer_avatar: friend.avatar.clone(),
                    last_message,
                    unread_count,
                }
            })
            .collect()
    }

    /// Messages between `me` and `peer`, oldest first. Stable on ties.
    pub fn transcript<'a>(me: &UserId, peer: &UserId, messages: &'a Messages) -> Vec<&'a Message> {
        let mut out: Vec<&Message> = messages.iter().filter(|m| m.is_between(me, peer)).collect();
        out.sort_by_key(|m| m.created_at);
        out
    }

    /// Users other than `me` whose username or email contains `query`,
    /// ignoring case. The query is matched as given, so an empty query
    /// matches everyone and surrounding whitespace is significant.
    pub fn search_users<'a>(me: &UserId, users: &'a Users, query: &str) -> Vec<&'a User> {
        let needle = query.to_lowercase();
        users
            .iter()
            .filter(|u| &u.id != me)
            .filter(|u| {
                u.username.to_lowercase().contains(&needle)
                    || u.email.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Posts written by `author`, in feed order.
    pub fn posts_by<'a>(author: &UserId, posts: &'a Posts) -> Vec<&'a Post> {
        posts.iter().filter(|p| &p.author_id == author).collect()
    }

    /// Resolved friend records of `user`, in list order. Dangling ids are
    /// skipped.
    pub fn friends_of<'a>(user: &User, users: &'a Users) -> Vec<&'a User> {
        user.friends.iter().filter_map(|id| users.find(id)).collect()
    }

    pub fn profile_stats(user: &User, posts: &Posts) -> ProfileStats {
        ProfileStats {
            post_count: posts.iter().filter(|p| p.author_id == user.id).count(),
            friend_count: user.friends.len(),
        }
    }
}
