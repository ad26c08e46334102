//! Application state - shared across all handlers.

use std::sync::Arc;

use yatube_core::BlogService;
use yatube_core::ports::{
    GroupRepository, PasswordService, PostRepository, TokenService, UserRepository,
};
use yatube_infra::database::InMemoryDatabase;
use yatube_infra::{Argon2PasswordService, JwtTokenService};

#[cfg(feature = "postgres")]
use yatube_infra::database::{
    DatabaseConnections, PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub config: Arc<AppConfig>,
    /// Which storage backend is serving requests.
    pub storage: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// A configured database that cannot be reached is a startup error.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = config.database.clone() {
            let connections = DatabaseConnections::init(&db_config).await?;
            let conn = connections.main;
            tracing::info!("Using PostgreSQL storage");
            return Ok(Self::build(
                config,
                Arc::new(PostgresUserRepository::new(conn.clone())),
                Arc::new(PostgresGroupRepository::new(conn.clone())),
                Arc::new(PostgresPostRepository::new(conn)),
                "postgres",
            ));
        }

        if config.database.is_some() {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled");
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        Ok(Self::in_memory(config, &InMemoryDatabase::new()))
    }

    /// State backed by the given in-memory database.
    pub fn in_memory(config: AppConfig, db: &InMemoryDatabase) -> Self {
        Self::build(
            config,
            Arc::new(db.users()),
            Arc::new(db.groups()),
            Arc::new(db.posts()),
            "memory",
        )
    }

    fn build(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        storage: &'static str,
    ) -> Self {
        let blog = BlogService::new(users.clone(), groups, posts, config.posts_per_page);
        let tokens = JwtTokenService::new(config.jwt.clone());

        tracing::info!(storage, per_page = config.posts_per_page, "Application state initialized");

        Self {
            blog: Arc::new(blog),
            users,
            tokens: Arc::new(tokens),
            passwords: Arc::new(Argon2PasswordService::new()),
            config: Arc::new(config),
            storage,
        }
    }
}
