//! Feed queries and the post write flows, including the ownership rule.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Author, Group, Page, PageRequest, Post, PostCard};
use crate::error::DomainError;
use crate::form::PostForm;
use crate::ports::{GroupRepository, PostRepository, UserRepository};

/// A single post with the author's total post count.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub card: PostCard,
    pub author_posts: u64,
}

/// Whether the requesting user may edit a post.
///
/// Non-owners are not an error: the caller sends them back to the post.
#[derive(Debug, Clone)]
pub enum EditAccess {
    Owner(Post),
    NotOwner(Post),
}

impl EditAccess {
    pub fn post(&self) -> &Post {
        match self {
            Self::Owner(post) | Self::NotOwner(post) => post,
        }
    }
}

/// Application service over the user, group and post repositories.
pub struct BlogService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    per_page: u64,
}

impl BlogService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        per_page: u64,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
            per_page,
        }
    }

    pub fn page_request(&self, number: Option<u64>) -> PageRequest {
        PageRequest::new(number, self.per_page)
    }

    /// All posts, newest first.
    pub async fn home_feed(&self, page: Option<u64>) -> Result<Page<PostCard>, DomainError> {
        let posts = self.posts.find_recent(self.page_request(page)).await?;
        self.cards(posts).await
    }

    /// Posts in the group with `slug`.
    pub async fn group_feed(
        &self,
        slug: &str,
        page: Option<u64>,
    ) -> Result<(Group, Page<PostCard>), DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        let posts = self
            .posts
            .find_by_group(group.id, self.page_request(page))
            .await?;
        Ok((group, self.cards(posts).await?))
    }

    /// Posts written by `username`.
    pub async fn profile_feed(
        &self,
        username: &str,
        page: Option<u64>,
    ) -> Result<(Author, Page<PostCard>), DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let posts = self
            .posts
            .find_by_author(user.id, self.page_request(page))
            .await?;
        Ok((user.author(), self.cards(posts).await?))
    }

    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self.find_post(id).await?;
        let author_posts = self.posts.count_by_author(post.author_id).await?;
        let card = self.card(post).await?;
        Ok(PostDetail { card, author_posts })
    }

    /// Group choices offered on the post form.
    pub async fn groups(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.groups.find_all().await?)
    }

    /// Validate `form` and store a new post authored by `author_id`.
    ///
    /// An author that no longer exists is `Unauthorized`: the caller's
    /// session refers to a deleted user.
    pub async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post, DomainError> {
        if self.users.find_by_id(author_id).await?.is_none() {
            tracing::warn!(author_id = %author_id, "Post attempt by unknown user");
            return Err(DomainError::Unauthorized);
        }

        let groups = self.groups.find_all().await?;
        let cleaned = form.validate(&groups).map_err(DomainError::Validation)?;

        let post = self.posts.insert(Post::new(author_id, cleaned)).await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "Post created");
        Ok(post)
    }

    /// Look up a post and decide whether `editor_id` owns it.
    pub async fn edit_access(
        &self,
        editor_id: Uuid,
        post_id: Uuid,
    ) -> Result<EditAccess, DomainError> {
        let post = self.find_post(post_id).await?;
        if post.is_authored_by(editor_id) {
            Ok(EditAccess::Owner(post))
        } else {
            tracing::warn!(
                post_id = %post_id,
                editor_id = %editor_id,
                "Edit attempt by non-author ignored"
            );
            Ok(EditAccess::NotOwner(post))
        }
    }

    /// Apply `form` to a post owned by `editor_id`.
    ///
    /// Non-owners get `NotOwner` back with the post untouched, before the
    /// form is even validated.
    pub async fn edit_post(
        &self,
        editor_id: Uuid,
        post_id: Uuid,
        form: &PostForm,
    ) -> Result<EditAccess, DomainError> {
        let mut post = match self.edit_access(editor_id, post_id).await? {
            EditAccess::Owner(post) => post,
            not_owner @ EditAccess::NotOwner(_) => return Ok(not_owner),
        };

        let groups = self.groups.find_all().await?;
        let cleaned = form.validate(&groups).map_err(DomainError::Validation)?;
        post.apply(cleaned);

        let post = self.posts.update(post).await?;
        tracing::info!(post_id = %post.id, "Post edited");
        Ok(EditAccess::Owner(post))
    }

    pub async fn create_group(
        &self,
        title: String,
        slug: String,
        description: String,
    ) -> Result<Group, DomainError> {
        let group = Group::new(title, slug, description)?;
        if self.groups.find_by_slug(&group.slug).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "group with slug '{}' already exists",
                group.slug
            )));
        }

        let group = self.groups.insert(group).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    /// Delete a group. Its posts survive with no group.
    pub async fn delete_group(&self, slug: &str) -> Result<(), DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("group", slug))?;

        self.groups.delete(group.id).await?;
        tracing::info!(group_id = %group.id, slug = %slug, "Group deleted");
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn card(&self, post: Post) -> Result<PostCard, DomainError> {
        let mut cards = self.join(vec![post]).await?;
        cards
            .pop()
            .ok_or_else(|| DomainError::Internal("post lost while joining".to_string()))
    }

    async fn cards(&self, page: Page<Post>) -> Result<Page<PostCard>, DomainError> {
        let request = PageRequest {
            number: page.number,
            per_page: page.per_page,
        };
        let total_items = page.total_items;
        let cards = self.join(page.items).await?;
        Ok(Page::new(cards, request, total_items))
    }

    /// Attach authors and groups to posts, keeping their order.
    async fn join(&self, posts: Vec<Post>) -> Result<Vec<PostCard>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids = unique(posts.iter().map(|p| p.author_id));
        let group_ids = unique(posts.iter().filter_map(|p| p.group_id));

        let authors: HashMap<Uuid, Author> = self
            .users
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.author()))
            .collect();

        let groups: HashMap<Uuid, Group> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            self.groups
                .find_by_ids(&group_ids)
                .await?
                .into_iter()
                .map(|g| (g.id, g))
                .collect()
        };

        posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.author_id).cloned().ok_or_else(|| {
                    DomainError::Internal(format!(
                        "post {} references missing author {}",
                        post.id, post.author_id
                    ))
                })?;
                let group = post.group_id.and_then(|id| groups.get(&id).cloned());
                Ok(PostCard {
                    post,
                    author,
                    group,
                })
            })
            .collect()
    }
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
