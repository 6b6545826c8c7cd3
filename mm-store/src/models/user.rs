//! User entity and its write-side inputs
//!
//! Ids and timestamps are assigned by the store. The input types carry no
//! such fields, so write paths cannot pre-populate them.

use chrono::{DateTime, Utc};

/// User record as read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
    pub pass_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Option<String>,
    pub email: String,
    pub pass_hash: String,
}

impl NewUser {
    pub fn new(username: Option<String>, email: impl Into<String>, pass_hash: impl Into<String>) -> Self {
        Self {
            username,
            email: email.into(),
            pass_hash: pass_hash.into(),
        }
    }
}

/// Replacement values for the mutable fields of an existing user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: i64,
    pub username: Option<String>,
    pub email: String,
    pub pass_hash: String,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            pass_hash: user.pass_hash.clone(),
        }
    }
}
