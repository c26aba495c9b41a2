use axum::http::StatusCode;
use tracing::error;
use uuid::Uuid;

/// Failures surfaced at the HTTP edge.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Meal {0} not found")]
    MealNotFound(Uuid),
    #[error("Draft {0} not found")]
    DraftNotFound(Uuid),
    #[error("Invalid month `{0}`, expected YYYY-M")]
    InvalidMonth(String),
    #[error("Stored photo reference is not a usable URL")]
    InvalidPhotoUri,
    #[error("Photo storage is not configured")]
    StorageUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for (StatusCode, String) {
    fn from(e: AppError) -> Self {
        let status = match &e {
            AppError::MealNotFound(_) | AppError::DraftNotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidPhotoUri => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(inner) => {
                error!(error = ?inner, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, e.to_string())
    }
}

pub(crate) fn internal(e: anyhow::Error) -> (StatusCode, String) {
    AppError::Internal(e).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        let id = Uuid::new_v4();
        let (status, msg): (StatusCode, String) = AppError::MealNotFound(id).into();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(msg.contains(&id.to_string()));

        let (status, _): (StatusCode, String) = AppError::InvalidMonth("May".into()).into();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _): (StatusCode, String) = AppError::InvalidPhotoUri.into();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _): (StatusCode, String) = AppError::StorageUnavailable.into();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, msg) = internal(anyhow::anyhow!("db down"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, "db down");
    }
}
