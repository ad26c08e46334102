//! Data Transfer Objects - request/response types for the site.
//!
//! Every "rendered page" is one of these documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `?page=N` on the feed views. Anything that is not a positive number means
/// the first page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> Option<u64> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// Signup and login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Group creation form on the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupForm {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub text: String,
    pub pub_date: String,
    pub author: UserResponse,
    pub group: Option<GroupResponse>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// One page of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<PostResponse>,
    pub page: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupFeedResponse {
    pub group: GroupResponse,
    pub feed: FeedResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub author: UserResponse,
    pub posts_count: u64,
    pub feed: FeedResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub author_posts_count: u64,
}

/// Values currently in the post form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

/// The create/edit form, blank, prefilled, or re-rendered with errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    pub is_edit: bool,
    pub post_id: Option<String>,
    pub values: PostFormValues,
    pub groups: Vec<GroupResponse>,
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginFormResponse {
    pub next: Option<String>,
}
