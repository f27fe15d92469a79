use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(uuid(Courses::Id).primary_key())
                    .col(string(Courses::Title))
                    .col(integer(Courses::DurationMinutes))
                    .col(string_null(Courses::Thumbnail))
                    .col(timestamp(Courses::CreatedAt))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Courses {
    Table,
    Id,
    Title,
    DurationMinutes,
    Thumbnail,
    CreatedAt,
}
