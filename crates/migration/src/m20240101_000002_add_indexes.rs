use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // News: index on publication_date (list ordering column)
        manager
            .create_index(
                Index::create()
                    .name("idx_news_publication_date")
                    .table(News::Table)
                    .col(News::PublicationDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_news_publication_date")
                    .table(News::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum News {
    Table,
    PublicationDate,
}
