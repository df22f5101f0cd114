use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string_len(Categories::Name, 80))
                    .col(string_len_null(Categories::Description, 200))
                    // 1 = active, 2 = inactive
                    .col(integer(Categories::Status).default(1))
                    .col(
                        timestamp_with_time_zone(Categories::CreatedDate)
                            .default(Expr::current_timestamp()),
                    )
                    .col(integer(Categories::Version).default(1))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Categories {
    Table,
    Id,
    Name,
    Description,
    Status,
    CreatedDate,
    Version,
}
