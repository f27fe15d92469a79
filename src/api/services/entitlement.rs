//! Entitlement check shared by the progress and certificate paths: a user is
//! entitled to a course iff a completed payment row exists for the pair.

use entities::payments;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

#[tracing::instrument(level = "debug", skip(db))]
pub async fn ensure_entitled<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    course_id: Uuid,
) -> ServiceResult<()> {
    let completed = payments::Entity::find()
        .filter(payments::Column::UserId.eq(user_id))
        .filter(payments::Column::CourseId.eq(course_id))
        .filter(payments::Column::Status.eq(payments::STATUS_COMPLETED))
        .count(db)
        .await?;

    if completed == 0 {
        tracing::debug!(%user_id, %course_id, "entitlement check failed");
        return Err(ServiceError::Forbidden("Course not purchased".into()));
    }
    Ok(())
}
