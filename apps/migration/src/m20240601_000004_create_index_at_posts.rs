use sea_orm_migration::prelude::*;

use crate::m20240601_000003_create_posts_table::Post;

const PUB_DATE_INDEX: &str = "idx_posts_pub_date_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(Post::Table)
                    .name(PUB_DATE_INDEX)
                    .col((Post::PubDate, IndexOrder::Desc))
                    .col((Post::Id, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_posts_author_id", Post::AuthorId),
            ("idx_posts_group_id", Post::GroupId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .table(Post::Table)
                        .name(name)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in ["idx_posts_group_id", "idx_posts_author_id", PUB_DATE_INDEX] {
            manager
                .drop_index(Index::drop().table(Post::Table).name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
