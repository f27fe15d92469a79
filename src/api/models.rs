use chrono::{DateTime, Utc};
use poem_openapi::{
    ApiResponse, Object,
    payload::{Attachment, Json},
};
use uuid::Uuid;

use crate::error::ServiceError;

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct MessageDto {
    pub message: String,
}

/// 400 body for certificate requests below the completion threshold.
#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct BelowThresholdDto {
    pub message: String,
    pub current_progress: f64,
}

/// Course display fields joined in from the catalog collaborator.
#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct CourseMetaDto {
    pub title: String,
    /// Minutes, display only.
    pub duration: i32,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct WatchEntryDto {
    pub timestamp: DateTime<Utc>,
    pub position: f64,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ProgressRecordDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completion_percentage: f64,
    pub last_watched_position: f64,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watch_history: Vec<WatchEntryDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present when the course row still exists.
    pub course: Option<CourseMetaDto>,
}

impl ProgressRecordDto {
    pub fn from_model(
        record: entities::progress::Model,
        course: Option<entities::courses::Model>,
    ) -> Self {
        ProgressRecordDto {
            id: record.id,
            user_id: record.user_id,
            course_id: record.course_id,
            completion_percentage: record.completion_percentage,
            last_watched_position: record.last_watched_position,
            is_completed: record.is_completed,
            completed_at: record.completed_at,
            watch_history: record
                .watch_history
                .0
                .into_iter()
                .map(|e| WatchEntryDto { timestamp: e.timestamp, position: e.position })
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            course: course.map(CourseMetaDto::from_model),
        }
    }
}

impl CourseMetaDto {
    pub fn from_model(course: entities::courses::Model) -> Self {
        CourseMetaDto {
            title: course.title,
            duration: course.duration_minutes,
            thumbnail: course.thumbnail,
        }
    }
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct UpdateProgressRequestDto {
    /// Seconds into the course video.
    pub position: f64,
    pub completion_percentage: f64,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct ProgressStatsDto {
    pub total_courses: u64,
    pub completed_courses: u64,
    pub in_progress_courses: u64,
    pub average_progress: f64,
    /// Completed / total, as a rounded percentage.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct EligibilityDto {
    pub eligible: bool,
    pub message: String,
    pub current_progress: f64,
    pub required_progress: f64,
    pub course: Option<CourseMetaDto>,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct EligibleCertificateDto {
    pub course_id: Uuid,
    pub course_title: String,
    pub completion_percentage: f64,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration: i32,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct CertificatePreviewDto {
    pub student_name: String,
    pub course_name: String,
    /// Human-readable, e.g. "August 28, 2026".
    pub completion_date: String,
    /// Fresh per request; re-requesting yields a different id.
    pub certificate_id: Uuid,
    pub completion_percentage: f64,
    pub course_duration: i32,
}

#[derive(Debug, Clone, Object)]
#[oai(rename_all = "camelCase")]
pub struct CertificateStatsDto {
    pub total_eligible_certificates: u64,
    pub total_completed_courses: u64,
    pub average_completion_rate: f64,
}

// ===== Per-endpoint response enums =====

#[derive(ApiResponse)]
pub enum ProgressListResponseDto {
    /// Caller's progress records, newest-updated first
    #[oai(status = 200)]
    Ok(Json<Vec<ProgressRecordDto>>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ProgressGetResponseDto {
    /// Existing or freshly created record
    #[oai(status = 200)]
    Ok(Json<ProgressRecordDto>),

    /// No completed payment for this course
    #[oai(status = 403)]
    Forbidden(Json<ErrorDto>),

    /// Creation race; retry as a read
    #[oai(status = 409)]
    Conflict(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ProgressUpdateResponseDto {
    /// The persisted record after the update
    #[oai(status = 200)]
    Ok(Json<ProgressRecordDto>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),

    #[oai(status = 403)]
    Forbidden(Json<ErrorDto>),

    /// Course does not exist
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    /// Creation race; retry as a read
    #[oai(status = 409)]
    Conflict(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ProgressStatsResponseDto {
    #[oai(status = 200)]
    Ok(Json<ProgressStatsDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum ProgressResetResponseDto {
    #[oai(status = 200)]
    Ok(Json<MessageDto>),

    /// No record to reset
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum EligibilityResponseDto {
    #[oai(status = 200)]
    Ok(Json<EligibilityDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum EligibleListResponseDto {
    /// Eligible courses, highest completion first
    #[oai(status = 200)]
    Ok(Json<Vec<EligibleCertificateDto>>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum CertificatePreviewResponseDto {
    #[oai(status = 200)]
    Ok(Json<CertificatePreviewDto>),

    /// Below the completion threshold
    #[oai(status = 400)]
    BadRequest(Json<BelowThresholdDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum CertificateGenerateResponseDto {
    /// Rendered certificate document
    #[oai(status = 200)]
    Ok(Attachment<Vec<u8>>),

    /// Below the completion threshold
    #[oai(status = 400)]
    BadRequest(Json<BelowThresholdDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    /// Renderer collaborator error
    #[oai(status = 502)]
    BadGateway(Json<ErrorDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum CertificateStatsResponseDto {
    #[oai(status = 200)]
    Ok(Json<CertificateStatsDto>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorDto>),
}

// ===== ServiceError → response mappings =====

fn internal_error_dto(err: &ServiceError) -> ErrorDto {
    tracing::error!(error = %format!("{:?}", err), "internal service error");
    ErrorDto { message: "Server error".into() }
}

fn below_threshold_dto(err: &ServiceError, current_progress: f64) -> BelowThresholdDto {
    BelowThresholdDto { message: err.to_string(), current_progress }
}

impl From<ServiceError> for ProgressListResponseDto {
    fn from(err: ServiceError) -> Self {
        Self::InternalServerError(Json(internal_error_dto(&err)))
    }
}

impl From<ServiceError> for ProgressGetResponseDto {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(msg) => Self::Forbidden(Json(ErrorDto { message: msg })),
            ServiceError::Conflict(msg) => Self::Conflict(Json(ErrorDto { message: msg })),
            other => Self::InternalServerError(Json(internal_error_dto(&other))),
        }
    }
}

impl From<ServiceError> for ProgressUpdateResponseDto {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::BadRequest(msg) => Self::BadRequest(Json(ErrorDto { message: msg })),
            ServiceError::Forbidden(msg) => Self::Forbidden(Json(ErrorDto { message: msg })),
            ServiceError::NotFound(msg) => Self::NotFound(Json(ErrorDto { message: msg })),
            ServiceError::Conflict(msg) => Self::Conflict(Json(ErrorDto { message: msg })),
            other => Self::InternalServerError(Json(internal_error_dto(&other))),
        }
    }
}

impl From<ServiceError> for ProgressStatsResponseDto {
    fn from(err: ServiceError) -> Self {
        Self::InternalServerError(Json(internal_error_dto(&err)))
    }
}

impl From<ServiceError> for ProgressResetResponseDto {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self::NotFound(Json(ErrorDto { message: msg })),
            other => Self::InternalServerError(Json(internal_error_dto(&other))),
        }
    }
}

impl From<ServiceError> for EligibilityResponseDto {
    fn from(err: ServiceError) -> Self {
        Self::InternalServerError(Json(internal_error_dto(&err)))
    }
}

impl From<ServiceError> for EligibleListResponseDto {
    fn from(err: ServiceError) -> Self {
        Self::InternalServerError(Json(internal_error_dto(&err)))
    }
}

impl From<ServiceError> for CertificatePreviewResponseDto {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self::NotFound(Json(ErrorDto { message: msg })),
            ServiceError::BelowThreshold { current_progress } => {
                let dto = below_threshold_dto(
                    &ServiceError::BelowThreshold { current_progress },
                    current_progress,
                );
                Self::BadRequest(Json(dto))
            }
            other => Self::InternalServerError(Json(internal_error_dto(&other))),
        }
    }
}

impl From<ServiceError> for CertificateGenerateResponseDto {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => Self::NotFound(Json(ErrorDto { message: msg })),
            ServiceError::BelowThreshold { current_progress } => {
                let dto = below_threshold_dto(
                    &ServiceError::BelowThreshold { current_progress },
                    current_progress,
                );
                Self::BadRequest(Json(dto))
            }
            ServiceError::Upstream(msg) => {
                Self::BadGateway(Json(ErrorDto { message: format!("Renderer error: {}", msg) }))
            }
            other => Self::InternalServerError(Json(internal_error_dto(&other))),
        }
    }
}

impl From<ServiceError> for CertificateStatsResponseDto {
    fn from(err: ServiceError) -> Self {
        Self::InternalServerError(Json(internal_error_dto(&err)))
    }
}
