//! In-memory storage - used when no database is configured, and in tests.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use yatube_core::domain::{Group, Page, PageRequest, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{BaseRepository, GroupRepository, PostRepository, UserRepository};

/// Rows are kept in insertion order.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    groups: Vec<Group>,
    posts: Vec<Post>,
}

impl Tables {
    /// Posts matching `filter`, newest first. Among equal `pub_date`s the
    /// later insertion comes first.
    fn feed(&self, filter: impl Fn(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .rev()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        posts.sort_by_key(|p| Reverse(p.pub_date));
        posts
    }
}

/// A process-local database with the same relational rules as the
/// PostgreSQL schema: unique usernames and slugs, posts cascade with their
/// author, and group references are cleared when the group goes away.
///
/// Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn groups(&self) -> InMemoryGroupRepository {
        InMemoryGroupRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryGroupRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(RepoError::Constraint("user id already exists".to_string()));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(RepoError::NotFound)?;
        *slot = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.posts.retain(|p| p.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .iter()
            .any(|g| g.id == group.id || g.slug == group.slug)
        {
            return Err(RepoError::Constraint(format!(
                "group slug '{}' already exists",
                group.slug
            )));
        }
        tables.groups.push(group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .iter()
            .any(|g| g.id != group.id && g.slug == group.slug)
        {
            return Err(RepoError::Constraint(format!(
                "group slug '{}' already exists",
                group.slug
            )));
        }
        let slot = tables
            .groups
            .iter_mut()
            .find(|g| g.id == group.id)
            .ok_or(RepoError::NotFound)?;
        *slot = group.clone();
        Ok(group)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.groups.len();
        tables.groups.retain(|g| g.id != id);
        if tables.groups.len() == before {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.iter_mut().filter(|p| p.group_id == Some(id)) {
            post.group_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups = tables.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.iter().any(|p| p.id == post.id) {
            return Err(RepoError::Constraint("post id already exists".to_string()));
        }
        if !tables.users.iter().any(|u| u.id == post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(RepoError::Constraint(format!(
                    "group {group_id} does not exist"
                )));
            }
        }
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if let Some(group_id) = post.group_id {
            if !tables.groups.iter().any(|g| g.id == group_id) {
                return Err(RepoError::Constraint(format!(
                    "group {group_id} does not exist"
                )));
            }
        }
        let slot = tables
            .posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(RepoError::NotFound)?;
        *slot = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_recent(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(page.slice(tables.feed(|_| true)))
    }

    async fn find_by_group(
        &self,
        group_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(page.slice(tables.feed(|p| p.group_id == Some(group_id))))
    }

    async fn find_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(page.slice(tables.feed(|p| p.author_id == author_id)))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().filter(|p| p.author_id == author_id).count() as u64)
    }
}
