use crate::m20260810_101500_create_users_table::Users;
use crate::m20260810_102200_create_courses_table::Courses;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Progress::Table)
                    .if_not_exists()
                    .col(uuid(Progress::Id).primary_key())
                    .col(uuid(Progress::UserId))
                    .col(uuid(Progress::CourseId))
                    .col(double(Progress::CompletionPercentage))
                    .col(double(Progress::LastWatchedPosition))
                    .col(boolean(Progress::IsCompleted))
                    .col(timestamp_null(Progress::CompletedAt))
                    .col(json(Progress::WatchHistory))
                    .col(timestamp(Progress::CreatedAt))
                    .col(timestamp(Progress::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_user_id")
                            .from(Progress::Table, Progress::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_course_id")
                            .from(Progress::Table, Progress::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one progress record per (user, course). Concurrent creates
        // race on this index instead of producing duplicates.
        manager
            .create_index(
                Index::create()
                    .name("idx_progress_user_course")
                    .table(Progress::Table)
                    .col(Progress::UserId)
                    .col(Progress::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Progress::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Progress {
    Table,
    Id,
    UserId,
    CourseId,
    CompletionPercentage,
    LastWatchedPosition,
    IsCompleted,
    CompletedAt,
    WatchHistory,
    CreatedAt,
    UpdatedAt,
}
