//! Schema for users, groups and posts.

pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_users_table;
mod m20240601_000002_create_groups_table;
mod m20240601_000003_create_posts_table;
mod m20240601_000004_create_index_at_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_users_table::Migration),
            Box::new(m20240601_000002_create_groups_table::Migration),
            Box::new(m20240601_000003_create_posts_table::Migration),
            Box::new(m20240601_000004_create_index_at_posts::Migration),
        ]
    }
}
