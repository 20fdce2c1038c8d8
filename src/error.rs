use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::services::ServiceError;
use crate::utils::{error_codes, error_to_api_response};

/// HTTP 层错误，统一转换为 `ApiResponse` 信封
#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden,
    Service(ServiceError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::Forbidden => (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED),
            AppError::Service(err) => match err {
                ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
                ServiceError::Duplicate { .. } => (StatusCode::CONFLICT, error_codes::DUPLICATE),
                ServiceError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED)
                }
                ServiceError::AccountDisabled => {
                    (StatusCode::FORBIDDEN, error_codes::ACCOUNT_DISABLED)
                }
                ServiceError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR)
                }
                ServiceError::Repo(_)
                | ServiceError::Cache(_)
                | ServiceError::Password(_)
                | ServiceError::Token(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let msg = match self {
            AppError::Unauthorized => "未授权访问".to_string(),
            AppError::Forbidden => "没有操作权限".to_string(),
            AppError::Service(err) if status.is_server_error() => {
                tracing::error!("Service failure: {}", err);
                "内部服务器错误".to_string()
            }
            AppError::Service(err) => err.to_string(),
        };

        (status, error_to_api_response::<()>(code, msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RepoError;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::not_found("post"), StatusCode::NOT_FOUND),
            (ServiceError::duplicate("username"), StatusCode::CONFLICT),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                ServiceError::Repo(RepoError::Persistence("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
