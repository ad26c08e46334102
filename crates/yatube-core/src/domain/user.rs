use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

const USERNAME_MAX_LENGTH: usize = 150;

/// User entity - the identity that authors posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    /// Usernames are 1 to 150 letters, digits or `@.+-_`.
    pub fn validate_username(username: &str) -> Result<(), DomainError> {
        if username.is_empty() || username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(DomainError::InvalidInput(format!(
                "username must be 1 to {USERNAME_MAX_LENGTH} characters"
            )));
        }
        let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
        if !username.chars().all(allowed) {
            return Err(DomainError::InvalidInput(
                "username may only contain letters, digits and @/./+/-/_".to_string(),
            ));
        }
        Ok(())
    }

    pub fn author(&self) -> Author {
        Author {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Public view of a user, safe to hand to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub username: String,
}
