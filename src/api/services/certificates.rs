use anyhow::anyhow;
use chrono::Utc;
use entities::{courses, progress, users};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::api::models::{
    CertificatePreviewDto, CertificateStatsDto, CourseMetaDto, EligibilityDto,
    EligibleCertificateDto,
};
use crate::domain::progress::{COMPLETION_THRESHOLD, is_eligible};
use crate::error::{ServiceError, ServiceResult};
use crate::renderer_client::{CertificateData, RendererClient};

/// Certificate eligibility and issuance. Eligibility is a pure function of
/// the stored progress record; the renderer is only ever invoked after the
/// threshold gate passed within the same request.
pub struct CertificateService<'a> {
    pub db: &'a DatabaseConnection,
    pub renderer: &'a RendererClient,
}

impl<'a> CertificateService<'a> {
    pub fn new(db: &'a DatabaseConnection, renderer: &'a RendererClient) -> Self {
        Self { db, renderer }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn eligibility(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<EligibilityDto> {
        let pair = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CourseId.eq(course_id))
            .find_also_related(courses::Entity)
            .one(self.db)
            .await?;

        let Some((record, course)) = pair else {
            return Ok(EligibilityDto {
                eligible: false,
                message: "No progress found for this course".into(),
                current_progress: 0.0,
                required_progress: COMPLETION_THRESHOLD,
                course: None,
            });
        };

        let eligible = is_eligible(record.completion_percentage);
        Ok(EligibilityDto {
            eligible,
            message: if eligible {
                "Certificate can be generated".into()
            } else {
                format!("Course must be at least {COMPLETION_THRESHOLD}% complete")
            },
            current_progress: record.completion_percentage,
            required_progress: COMPLETION_THRESHOLD,
            course: course.map(CourseMetaDto::from_model),
        })
    }

    /// Every course the caller can already claim a certificate for, highest
    /// completion first.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn eligible_list(&self, user_id: Uuid) -> ServiceResult<Vec<EligibleCertificateDto>> {
        let rows = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CompletionPercentage.gte(COMPLETION_THRESHOLD))
            .find_also_related(courses::Entity)
            .order_by_desc(progress::Column::CompletionPercentage)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(record, course)| {
                let course = course?;
                Some(EligibleCertificateDto {
                    course_id: record.course_id,
                    course_title: course.title,
                    completion_percentage: record.completion_percentage,
                    completed_at: record.completed_at,
                    duration: course.duration_minutes,
                    thumbnail: course.thumbnail,
                })
            })
            .collect())
    }

    /// Certificate metadata without rendering anything.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn preview(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<CertificatePreviewDto> {
        let record = self.eligible_record(user_id, course_id).await?;
        let data = self.certificate_data(&record).await?;
        Ok(CertificatePreviewDto {
            student_name: data.student_name,
            course_name: data.course_name,
            completion_date: data.completion_date,
            certificate_id: data.certificate_id,
            completion_percentage: data.completion_percentage,
            course_duration: data.course_duration,
        })
    }

    /// Gate, then hand the metadata to the renderer collaborator. Returns the
    /// suggested filename and the document bytes.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn generate(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<(String, Vec<u8>)> {
        let record = self.eligible_record(user_id, course_id).await?;
        let data = self.certificate_data(&record).await?;
        let bytes = self
            .renderer
            .render_certificate(&data)
            .await
            .map_err(|err| {
                tracing::error!(error = %format!("{:?}", err), %course_id, "renderer call failed");
                ServiceError::Upstream(err.to_string())
            })?;
        tracing::info!(%user_id, %course_id, certificate_id = %data.certificate_id, "certificate generated");
        Ok((format!("certificate_{}.pdf", course_id), bytes))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn stats(&self, user_id: Uuid) -> ServiceResult<CertificateStatsDto> {
        let records = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .all(self.db)
            .await?;

        let total = records.len() as u64;
        let total_eligible = records
            .iter()
            .filter(|r| is_eligible(r.completion_percentage))
            .count() as u64;
        let total_completed = records.iter().filter(|r| r.is_completed).count() as u64;
        let average_completion_rate = if total > 0 {
            (records.iter().map(|r| r.completion_percentage).sum::<f64>() / total as f64).round()
        } else {
            0.0
        };

        Ok(CertificateStatsDto {
            total_eligible_certificates: total_eligible,
            total_completed_courses: total_completed,
            average_completion_rate,
        })
    }

    /// The shared threshold gate for preview and generate.
    async fn eligible_record(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> ServiceResult<progress::Model> {
        let record = progress::Entity::find()
            .filter(progress::Column::UserId.eq(user_id))
            .filter(progress::Column::CourseId.eq(course_id))
            .one(self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Progress not found".into()))?;

        if !is_eligible(record.completion_percentage) {
            return Err(ServiceError::BelowThreshold {
                current_progress: record.completion_percentage,
            });
        }
        Ok(record)
    }

    /// Certificate ids are fresh per call, a display nonce rather than a
    /// persisted credential.
    async fn certificate_data(&self, record: &progress::Model) -> ServiceResult<CertificateData> {
        let user = users::Entity::find_by_id(record.user_id)
            .one(self.db)
            .await?
            .ok_or_else(|| ServiceError::Internal(anyhow!("user row missing for progress record")))?;
        let course = courses::Entity::find_by_id(record.course_id)
            .one(self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(anyhow!("course row missing for progress record"))
            })?;

        Ok(CertificateData {
            student_name: user.name,
            course_name: course.title,
            completion_date: Utc::now().format("%B %-d, %Y").to_string(),
            certificate_id: Uuid::new_v4(),
            completion_percentage: record.completion_percentage,
            course_duration: course.duration_minutes,
        })
    }
}
