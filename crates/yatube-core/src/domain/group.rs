use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub(crate) const TITLE_MAX_LENGTH: usize = 200;
pub(crate) const SLUG_MAX_LENGTH: usize = 50;

/// Group entity - a named community a post may belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    /// Create a new group, checking title length and slug shape.
    pub fn new(title: String, slug: String, description: String) -> Result<Self, DomainError> {
        let title = title.trim().to_string();
        let slug = slug.trim().to_string();
        let description = description.trim().to_string();

        if title.is_empty() || title.chars().count() > TITLE_MAX_LENGTH {
            return Err(DomainError::InvalidInput(format!(
                "title must be 1 to {TITLE_MAX_LENGTH} characters"
            )));
        }
        if !Self::is_valid_slug(&slug) {
            return Err(DomainError::InvalidInput(format!(
                "slug must be 1 to {SLUG_MAX_LENGTH} letters, digits, hyphens or underscores"
            )));
        }
        if description.is_empty() {
            return Err(DomainError::InvalidInput(
                "description is required".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description,
        })
    }

    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug.len() <= SLUG_MAX_LENGTH
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
