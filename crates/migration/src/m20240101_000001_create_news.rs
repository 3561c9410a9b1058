use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(News::Table)
                    .if_not_exists()
                    .col(pk_auto(News::Id))
                    // Uniqueness is enforced at the storage level; the service
                    // pre-check only exists for a friendlier error message.
                    .col(string_uniq(News::Title))
                    .col(text(News::Text))
                    .col(string(News::Author))
                    .col(timestamp_with_time_zone(News::PublicationDate))
                    .col(boolean(News::FirstHand))
                    .col(timestamp_with_time_zone(News::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(News::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum News {
    Table,
    Id,
    Title,
    Text,
    Author,
    PublicationDate,
    FirstHand,
    CreatedAt,
}
