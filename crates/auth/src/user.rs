//! In-memory user registry.

use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use reelpipe_core::DomainError;

use crate::password::{hash_password, verify_password};

/// A registered user. Only the password hash is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Registry of users, injected into the API at construction time.
#[derive(Debug, Default)]
pub struct UserStore {
    inner: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user; usernames are unique.
    pub fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::validation("username and password are required").into());
        }
        if self.find(username).is_some() {
            return Err(DomainError::conflict("Username already taken").into());
        }

        let password_hash = hash_password(password).map_err(|e| AuthError::Hash(e.to_string()))?;
        let user = User {
            username: username.to_string(),
            password_hash,
        };

        let mut users = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock: hashing ran without it.
        if users.iter().any(|u| u.username == username) {
            return Err(DomainError::conflict("Username already taken").into());
        }
        users.push(user.clone());
        tracing::info!(username, "user registered");
        Ok(user)
    }

    /// The user, if the password matches.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let user = self.find(username)?;
        verify_password(password, &user.password_hash).then_some(user)
    }

    pub fn find(&self, username: &str) -> Option<User> {
        let users = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        users.iter().find(|u| u.username == username).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
