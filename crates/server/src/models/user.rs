//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{Email, UserId};

/// A user as stored in the `users` collection.
///
/// `password` always holds an Argon2id PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned ID, immutable once assigned.
    pub id: UserId,
    /// Display name (at least 2 characters).
    pub name: String,
    /// Contact email.
    pub email: Email,
    /// Password hash.
    pub password: String,
    /// Filename of the uploaded avatar, relative to the upload directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// When the user was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the user was last patched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated fields for a new user. The password is still plaintext.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub image: Option<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("image", &self.image)
            .finish()
    }
}

/// Validated partial update for a user. Absent fields stay untouched.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub password: Option<String>,
    pub image: Option<String>,
}

impl std::fmt::Debug for UserChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserChanges")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("image", &self.image)
            .finish()
    }
}

impl User {
    /// Build a new record from validated input and an already hashed password.
    #[must_use]
    pub fn create(
        id: UserId,
        input: NewUser,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: input.name,
            email: input.email,
            password: password_hash,
            image: input.image,
            created_at: Some(now),
            updated_at: None,
        }
    }

    /// Merge the present fields of `changes` over this record.
    ///
    /// `password_hash` replaces the stored hash when the patch carried a new
    /// password; the plaintext in `changes` is never stored.
    #[must_use]
    pub fn merge(
        self,
        changes: UserChanges,
        password_hash: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: self.id,
            name: changes.name.unwrap_or(self.name),
            email: changes.email.unwrap_or(self.email),
            password: password_hash.unwrap_or(self.password),
            image: changes.image.or(self.image),
            created_at: self.created_at,
            updated_at: Some(now),
        }
    }
}
