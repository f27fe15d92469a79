use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// One playback checkpoint. Stored inside the `watch_history` JSON column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub timestamp: DateTimeUtc,
    /// Seconds into the course video.
    pub position: f64,
}

/// Bounded FIFO log of recent checkpoints, newest last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct WatchHistory(pub Vec<WatchEntry>);

/// Per-(user, course) progress record. The (user_id, course_id) pair is
/// unique — enforced by an index created in the migration, so a concurrent
/// create race surfaces as a constraint violation rather than a duplicate.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// Always within [0, 100].
    pub completion_percentage: f64,
    /// Seconds into the course video, never negative.
    pub last_watched_position: f64,
    /// One-way latch; only `reset` clears it.
    pub is_completed: bool,
    pub completed_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Json")]
    pub watch_history: WatchHistory,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Course,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
