//! The signed-in user context.
//!
//! A [`Session`] is a plain value owned by whoever drives the application and
//! passed to operations that need it. It carries a copy of the signed-in
//! user's record; [`Session::reconcile`] re-anchors that copy on a Users
//! snapshot after any change, and at load time.

use tracing::{debug, info, warn};

use feedline_types::UserId;

use crate::error::{CoreError, CoreResult};
use crate::model::User;
use crate::snapshot::Users;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Resume a session from a persisted user record. The record is not
    /// trusted until [`reconcile`](Self::reconcile) has checked it against
    /// Users.
    pub fn resume(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    pub fn is_active(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in user, or [`CoreError::NoSession`].
    pub fn require(&self) -> CoreResult<&User> {
        self.user.as_ref().ok_or(CoreError::NoSession)
    }

    /// Create an account and sign it in.
    ///
    /// Username and email are trimmed; the password is kept verbatim. Email
    /// uniqueness is an exact comparison.
    pub fn register(
        users: &Users,
        username: &str,
        email: &str,
        password: &str,
    ) -> CoreResult<(Users, Session)> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(CoreError::MissingField { field: "username" });
        }
        if email.is_empty() {
            return Err(CoreError::MissingField { field: "email" });
        }
        if password.is_empty() {
            return Err(CoreError::MissingField { field: "password" });
        }
        if users.find_by_email(email).is_some() {
            return Err(CoreError::DuplicateEmail {
                email: email.to_string(),
            });
        }

        let user = User::new(username, email, password);
        info!(user = %user.id, username, "user registered");
        let session = Session::resume(user.clone());
        let users = users.derive(|items| items.push(user));
        Ok((users, session))
    }

    /// Sign in with an exact email and password match.
    pub fn login(users: &Users, email: &str, password: &str) -> CoreResult<Session> {
        let email = email.trim();
        let user = users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .ok_or(CoreError::InvalidCredentials)?;
        info!(user = %user.id, "signed in");
        Ok(Session::resume(user.clone()))
    }

    /// Sign out. Users are untouched.
    pub fn logout(&self) -> Session {
        if let Some(id) = self.user_id() {
            info!(user = %id, "signed out");
        }
        Session::signed_out()
    }

    /// Replace the signed-in user's avatar, in both the session copy and the
    /// Users entry with the same id.
    pub fn update_avatar(
        &self,
        users: &Users,
        avatar: Option<String>,
    ) -> CoreResult<(Users, Session)> {
        let current = self.require()?;
        let users = users.set_avatar(&current.id, avatar)?;
        let session = self.reconcile(&users);
        debug!(user = %current.id, "avatar updated");
        Ok((users, session))
    }

    /// Re-check the session against a Users snapshot.
    ///
    /// A session whose user is absent is dropped; otherwise the session copy
    /// is replaced with the record from `users`.
    pub fn reconcile(&self, users: &Users) -> Session {
        let Some(current) = &self.user else {
            return Session::signed_out();
        };
        match users.find(&current.id) {
            Some(fresh) => Session::resume(fresh.clone()),
            None => {
                warn!(user = %current.id, "session user no longer exists; signing out");
                Session::signed_out()
            }
        }
    }
}
