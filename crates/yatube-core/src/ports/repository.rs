use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Group, Page, PageRequest, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError>;

    /// All groups, ordered by title.
    async fn find_all(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository.
///
/// Every feed is ordered newest first; posts sharing a `pub_date` are ordered
/// by id, descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_recent(&self, page: PageRequest) -> Result<Page<Post>, RepoError>;

    async fn find_by_group(
        &self,
        group_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    async fn find_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}
