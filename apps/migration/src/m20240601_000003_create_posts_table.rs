use sea_orm_migration::prelude::*;

use crate::m20240601_000001_create_users_table::User;
use crate::m20240601_000002_create_groups_table::Group;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Post::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Post::GroupId).uuid().null())
                    .col(ColumnDef::new(Post::Text).text().not_null())
                    .col(ColumnDef::new(Post::Image).string().null())
                    .col(
                        ColumnDef::new(Post::PubDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // Deleting a user removes their posts.
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk_posts_author_id")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    // Deleting a group leaves its posts ungrouped.
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk_posts_group_id")
                            .from(Post::Table, Post::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Post {
    #[sea_orm(iden = "posts")]
    Table,
    Id,
    AuthorId,
    GroupId,
    Text,
    Image,
    PubDate,
}
