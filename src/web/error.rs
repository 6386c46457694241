use crate::services::error::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

pub struct AppError(anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ServiceError>() {
            Some(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(ServiceError::Forbidden) | Some(ServiceError::AccountInactive) => {
                StatusCode::FORBIDDEN
            }
            Some(ServiceError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Some(ServiceError::SlugConflict(_)) | Some(ServiceError::Conflict(_)) => {
                StatusCode::CONFLICT
            }
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0.downcast_ref::<ServiceError>() {
            Some(err) => serde_json::json!({
                "error": err.to_string(),
                "messages": err.messages(),
            }),
            None => {
                tracing::error!("Application error: {:?}", self.0);
                serde_json::json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON error body for failures raised outside the service layer.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({
        "error": message,
        "messages": [message],
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::invalid("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("Post"), StatusCode::NOT_FOUND),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::AccountInactive, StatusCode::FORBIDDEN),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::SlugConflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = AppError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
