//! The post form: raw submitted fields in, a cleaned payload or field errors out.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Group, Post};

pub const TEXT_REQUIRED: &str = "text required";
pub const INVALID_GROUP: &str = "invalid group";

/// Raw values submitted on the create and edit forms.
///
/// Absent fields deserialize as empty, so a missing `text` is reported as a
/// field error rather than a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A validated create/update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl PostForm {
    /// Initial values for editing an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
        }
    }

    /// Validate against the groups a post may reference.
    pub fn validate(&self, groups: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", TEXT_REQUIRED);
        }

        let group_id = match non_blank(self.group.as_deref()) {
            None => None,
            Some(raw) => {
                let known = Uuid::parse_str(raw)
                    .ok()
                    .filter(|id| groups.iter().any(|g| g.id == *id));
                if known.is_none() {
                    errors.add("group", INVALID_GROUP);
                }
                known
            }
        };

        // Image format checks belong to the media store; only presence matters here.
        let image = non_blank(self.image.as_deref()).map(str::to_string);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CleanedPost {
            text: text.to_string(),
            group_id,
            image,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
