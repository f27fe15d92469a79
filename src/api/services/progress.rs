use chrono::Utc;
use entities::{courses, progress};
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::api::models::{ProgressRecordDto, ProgressStatsDto};
use crate::api::services::entitlement;
use crate::domain::progress as domain;
use crate::error::{ServiceError, ServiceResult};

/// Mediates all reads and writes of progress records: entitlement gate,
/// at-most-one record per (user, course), completion latch, bounded history.
pub struct ProgressService<'a> {
    pub db: &'a DatabaseConnection,
}

impl<'a> ProgressService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All of the caller's records, newest-updated first.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<ProgressRecordDto>> {
        let rows = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .find_also_related(courses::Entity)
            .order_by_desc(progress::Column::UpdatedAt)
            .all(self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(record, course)| ProgressRecordDto::from_model(record, course))
            .collect())
    }

    /// Return the record for the pair, creating a zeroed one lazily. Creation
    /// is gated on entitlement; a lost creation race is resolved by re-reading.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_or_create(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<ProgressRecordDto> {
        if let Some((record, course)) = self.find_pair_with_course(user_id, course_id).await? {
            return Ok(ProgressRecordDto::from_model(record, course));
        }

        entitlement::ensure_entitled(self.db, user_id, course_id).await?;

        let record = domain::new_record(user_id, course_id, Utc::now());
        match active_insert(record).insert(self.db).await {
            Ok(inserted) => {
                tracing::info!(%user_id, %course_id, "created progress record");
                let course = courses::Entity::find_by_id(course_id).one(self.db).await?;
                Ok(ProgressRecordDto::from_model(inserted, course))
            }
            Err(err) if is_unique_violation(&err) => {
                // Lost the race on the (user, course) index: the record exists now.
                match self.find_pair_with_course(user_id, course_id).await? {
                    Some((record, course)) => Ok(ProgressRecordDto::from_model(record, course)),
                    None => Err(ServiceError::Conflict(
                        "Progress record creation conflicted, retry".into(),
                    )),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a progress report: validation, entitlement, course existence,
    /// then a read-modify-write transaction over the pair.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn update(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        position: f64,
        completion_percentage: f64,
    ) -> ServiceResult<ProgressRecordDto> {
        domain::validate_update(position, completion_percentage)
            .map_err(ServiceError::BadRequest)?;
        entitlement::ensure_entitled(self.db, user_id, course_id).await?;
        let course = courses::Entity::find_by_id(course_id)
            .one(self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Course not found".into()))?;

        let txn = self.db.begin().await?;
        let existing = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CourseId.eq(course_id))
            .one(&txn)
            .await?;

        let now = Utc::now();
        let persisted = match existing {
            Some(mut record) => {
                domain::apply_update(&mut record, position, completion_percentage, now);
                active_patch(&record).update(&txn).await?
            }
            None => {
                let mut record = domain::new_record(user_id, course_id, now);
                domain::apply_update(&mut record, position, completion_percentage, now);
                match active_insert(record).insert(&txn).await {
                    Ok(inserted) => inserted,
                    Err(err) if is_unique_violation(&err) => {
                        return Err(ServiceError::Conflict(
                            "Progress record creation conflicted, retry".into(),
                        ));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        };
        txn.commit().await?;

        if persisted.is_completed {
            tracing::debug!(%user_id, %course_id, percentage = persisted.completion_percentage, "progress updated (completed)");
        }
        Ok(ProgressRecordDto::from_model(persisted, Some(course)))
    }

    /// Zero the record's progress fields. The record itself survives; no
    /// entitlement re-check, existence already implies prior entitlement.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn reset(&self, user_id: Uuid, course_id: Uuid) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let mut record = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CourseId.eq(course_id))
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Progress not found".into()))?;

        domain::apply_reset(&mut record, Utc::now());
        active_patch(&record).update(&txn).await?;
        txn.commit().await?;
        tracing::info!(%user_id, %course_id, "progress reset");
        Ok(())
    }

    /// Read-side aggregation over all of the caller's records.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn stats(&self, user_id: Uuid) -> ServiceResult<ProgressStatsDto> {
        let records = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .all(self.db)
            .await?;

        let total = records.len() as u64;
        let completed = records.iter().filter(|r| r.is_completed).count() as u64;
        let average_progress = if total > 0 {
            (records.iter().map(|r| r.completion_percentage).sum::<f64>() / total as f64).round()
        } else {
            0.0
        };
        let completion_rate = if total > 0 {
            (completed as f64 / total as f64 * 100.0).round()
        } else {
            0.0
        };

        Ok(ProgressStatsDto {
            total_courses: total,
            completed_courses: completed,
            in_progress_courses: total - completed,
            average_progress,
            completion_rate,
        })
    }

    async fn find_pair_with_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<Option<(progress::Model, Option<courses::Model>)>> {
        Ok(progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CourseId.eq(course_id))
            .find_also_related(courses::Entity)
            .one(self.db)
            .await?)
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn active_insert(record: progress::Model) -> progress::ActiveModel {
    progress::ActiveModel {
        id: Set(record.id),
        user_id: Set(record.user_id),
        course_id: Set(record.course_id),
        completion_percentage: Set(record.completion_percentage),
        last_watched_position: Set(record.last_watched_position),
        is_completed: Set(record.is_completed),
        completed_at: Set(record.completed_at),
        watch_history: Set(record.watch_history),
        created_at: Set(record.created_at),
        updated_at: Set(record.updated_at),
    }
}

fn active_patch(record: &progress::Model) -> progress::ActiveModel {
    progress::ActiveModel {
        id: Unchanged(record.id),
        user_id: Unchanged(record.user_id),
        course_id: Unchanged(record.course_id),
        completion_percentage: Set(record.completion_percentage),
        last_watched_position: Set(record.last_watched_position),
        is_completed: Set(record.is_completed),
        completed_at: Set(record.completed_at),
        watch_history: Set(record.watch_history.clone()),
        created_at: Unchanged(record.created_at),
        updated_at: Set(record.updated_at),
    }
}
