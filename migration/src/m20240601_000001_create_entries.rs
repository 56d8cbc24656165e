use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(pk_auto(Entries::Id))
                    .col(string(Entries::Owner))
                    .col(string(Entries::Title))
                    .col(string(Entries::Category))
                    .col(big_integer(Entries::CreatedAt))
                    .col(boolean(Entries::Done).default(false))
                    .col(integer(Entries::Rating).default(0))
                    .col(string_null(Entries::Link))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_owner_title_category")
                    .table(Entries::Table)
                    .col(Entries::Owner)
                    .col(Entries::Title)
                    .col(Entries::Category)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_owner")
                    .table(Entries::Table)
                    .col(Entries::Owner)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Entries::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    Owner,
    Title,
    Category,
    CreatedAt,
    Done,
    Rating,
    Link,
}
