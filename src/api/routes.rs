use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::Path,
    payload::{Attachment, AttachmentType, Json, PlainText},
};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::models::{
    CertificateGenerateResponseDto, CertificatePreviewResponseDto, CertificateStatsResponseDto,
    EligibilityResponseDto, EligibleListResponseDto, MessageDto, ProgressGetResponseDto,
    ProgressListResponseDto, ProgressResetResponseDto, ProgressStatsResponseDto,
    ProgressUpdateResponseDto, UpdateProgressRequestDto,
};
use super::services::{certificates::CertificateService, progress::ProgressService};
use crate::auth::BearerAuth;
use crate::renderer_client::RendererClient;

pub struct CourseTrackApi {
    pub db: Arc<DatabaseConnection>,
    pub renderer: Arc<RendererClient>,
}

#[OpenApi]
impl CourseTrackApi {
    /// Liveness probe
    #[oai(path = "/health", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn health(&self) -> PlainText<String> {
        PlainText("ok".to_string())
    }

    // ===== Progress endpoints =====

    /// List the caller's progress records
    #[oai(path = "/progress", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth))]
    async fn list_progress(&self, auth: BearerAuth) -> ProgressListResponseDto {
        match ProgressService::new(&self.db).list(auth.0.user_id).await {
            Ok(records) => ProgressListResponseDto::Ok(Json(records)),
            Err(err) => err.into(),
        }
    }

    /// Get (or lazily create) progress for a course
    #[oai(path = "/progress/course/:course_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id))]
    async fn get_course_progress(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
    ) -> ProgressGetResponseDto {
        match ProgressService::new(&self.db)
            .get_or_create(auth.0.user_id, course_id.0)
            .await
        {
            Ok(record) => ProgressGetResponseDto::Ok(Json(record)),
            Err(err) => err.into(),
        }
    }

    /// Report watch progress for a course
    #[oai(path = "/progress/course/:course_id", method = "put")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id, body))]
    async fn update_course_progress(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
        body: Json<UpdateProgressRequestDto>,
    ) -> ProgressUpdateResponseDto {
        match ProgressService::new(&self.db)
            .update(
                auth.0.user_id,
                course_id.0,
                body.0.position,
                body.0.completion_percentage,
            )
            .await
        {
            Ok(record) => ProgressUpdateResponseDto::Ok(Json(record)),
            Err(err) => err.into(),
        }
    }

    /// Aggregate progress statistics for the caller
    #[oai(path = "/progress/stats", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth))]
    async fn progress_stats(&self, auth: BearerAuth) -> ProgressStatsResponseDto {
        match ProgressService::new(&self.db).stats(auth.0.user_id).await {
            Ok(stats) => ProgressStatsResponseDto::Ok(Json(stats)),
            Err(err) => err.into(),
        }
    }

    /// Reset progress for a course
    #[oai(path = "/progress/course/:course_id", method = "delete")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id))]
    async fn reset_course_progress(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
    ) -> ProgressResetResponseDto {
        match ProgressService::new(&self.db)
            .reset(auth.0.user_id, course_id.0)
            .await
        {
            Ok(()) => ProgressResetResponseDto::Ok(Json(MessageDto {
                message: "Progress reset successfully".into(),
            })),
            Err(err) => err.into(),
        }
    }

    // ===== Certificate endpoints =====

    /// Certificate eligibility for a course
    #[oai(path = "/certificates/eligibility/:course_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id))]
    async fn certificate_eligibility(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
    ) -> EligibilityResponseDto {
        match CertificateService::new(&self.db, &self.renderer)
            .eligibility(auth.0.user_id, course_id.0)
            .await
        {
            Ok(dto) => EligibilityResponseDto::Ok(Json(dto)),
            Err(err) => err.into(),
        }
    }

    /// All courses the caller holds an eligible certificate for
    #[oai(path = "/certificates/eligible", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth))]
    async fn eligible_certificates(&self, auth: BearerAuth) -> EligibleListResponseDto {
        match CertificateService::new(&self.db, &self.renderer)
            .eligible_list(auth.0.user_id)
            .await
        {
            Ok(list) => EligibleListResponseDto::Ok(Json(list)),
            Err(err) => err.into(),
        }
    }

    /// Certificate metadata preview (no document rendered)
    #[oai(path = "/certificates/preview/:course_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id))]
    async fn certificate_preview(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
    ) -> CertificatePreviewResponseDto {
        match CertificateService::new(&self.db, &self.renderer)
            .preview(auth.0.user_id, course_id.0)
            .await
        {
            Ok(dto) => CertificatePreviewResponseDto::Ok(Json(dto)),
            Err(err) => err.into(),
        }
    }

    /// Render and download the certificate document
    #[oai(path = "/certificates/generate/:course_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth, course_id))]
    async fn certificate_generate(
        &self,
        auth: BearerAuth,
        course_id: Path<Uuid>,
    ) -> CertificateGenerateResponseDto {
        match CertificateService::new(&self.db, &self.renderer)
            .generate(auth.0.user_id, course_id.0)
            .await
        {
            Ok((filename, bytes)) => CertificateGenerateResponseDto::Ok(
                Attachment::new(bytes)
                    .attachment_type(AttachmentType::Attachment)
                    .filename(filename),
            ),
            Err(err) => err.into(),
        }
    }

    /// Aggregate certificate statistics for the caller
    #[oai(path = "/certificates/stats", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, auth))]
    async fn certificate_stats(&self, auth: BearerAuth) -> CertificateStatsResponseDto {
        match CertificateService::new(&self.db, &self.renderer)
            .stats(auth.0.user_id)
            .await
        {
            Ok(stats) => CertificateStatsResponseDto::Ok(Json(stats)),
            Err(err) => err.into(),
        }
    }
}
