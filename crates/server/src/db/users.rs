//! User repository for store operations.
//!
//! Passwords reach this layer already hashed.

use chrono::{DateTime, Utc};

use vitrine_core::UserId;

use super::{Store, StoreError};
use crate::models::{NewUser, User};

/// Repository for the `users` collection.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a user by their ID.
    pub async fn get_by_id(&self, id: UserId) -> Option<User> {
        self.store.find(id).await
    }

    /// All users, in stored order.
    pub async fn list(&self) -> Vec<User> {
        self.store.list().await
    }

    /// Insert a new user with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be written.
    pub async fn create(
        &self,
        input: NewUser,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let user = self
            .store
            .insert(|id| User::create(id, input, password_hash, created_at))
            .await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Write back a merged user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user disappeared meanwhile.
    /// Returns `StoreError` if the store cannot be written.
    pub async fn assign(&self, user: User) -> Result<User, StoreError> {
        let user = self.store.assign(user).await?;
        tracing::info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such user.
    /// Returns `StoreError` if the store cannot be written.
    pub async fn delete(&self, id: UserId) -> Result<User, StoreError> {
        let user = self.store.remove::<User>(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(user)
    }
}
