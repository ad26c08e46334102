//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select};
use uuid::Uuid;

use yatube_core::domain::{Group, Page, PageRequest, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{GroupRepository, PostRepository, UserRepository};

use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username = %username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

impl PostgresPostRepository {
    /// Run a feed query newest first and cut out the requested page.
    async fn page(
        &self,
        select: Select<PostEntity>,
        request: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let paginator = select
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, request.per_page);

        let total_items = paginator.num_items().await.map_err(query_error)?;
        let models = if request.offset() < total_items {
            paginator
                .fetch_page(request.number - 1)
                .await
                .map_err(query_error)?
        } else {
            Vec::new()
        };

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            request,
            total_items,
        ))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_recent(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        self.page(PostEntity::find(), page).await
    }

    async fn find_by_group(
        &self,
        group_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = PostEntity::find().filter(post::Column::GroupId.eq(group_id));
        self.page(select, page).await
    }

    async fn find_by_author(
        &self,
        author_id: Uuid,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = PostEntity::find().filter(post::Column::AuthorId.eq(author_id));
        self.page(select, page).await
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(query_error)
    }
}
