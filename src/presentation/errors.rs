// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::{ClassifiedError, ErrorKind};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::executor::job_executor::ExecutorError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口。
/// 仓库错误和已分类错误映射到对应的HTTP状态码，
/// 其余一律归为500，原始错误文本不跨越此边界。
#[derive(Debug)]
pub struct AppError(anyhow::Error);

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::JobNotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation | ErrorKind::InvalidUrl => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Permission => StatusCode::FORBIDDEN,
        ErrorKind::RateLimit | ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::AiService => StatusCode::BAD_GATEWAY,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(invalid) = self.0.downcast_ref::<validator::ValidationErrors>() {
            let body = Json(json!({ "error": invalid.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        if let Some(classified) = self.0.downcast_ref::<ClassifiedError>() {
            let status = status_for_kind(classified.kind);
            let body = Json(json!({
                "error": classified.user_message,
                "kind": classified.kind.to_string(),
                "recoverable": classified.recoverable,
            }));
            return (status, body).into_response();
        }

        let (status, message) = match self.0.downcast_ref::<ExecutorError>() {
            Some(ExecutorError::NotFound) => (StatusCode::NOT_FOUND, "Job not found".to_string()),
            Some(ExecutorError::AlreadyRunning) => {
                (StatusCode::CONFLICT, "Job is already running".to_string())
            }
            Some(ExecutorError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            _ => match self.0.downcast_ref::<RepositoryError>() {
                Some(RepositoryError::NotFound) => {
                    (StatusCode::NOT_FOUND, "Resource not found".to_string())
                }
                Some(RepositoryError::AlreadyRunning) => {
                    (StatusCode::CONFLICT, "Job is already running".to_string())
                }
                Some(RepositoryError::Database(_)) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
                None => {
                    let error_message = self.0.to_string();
                    // 验证类错误暴露给客户端，其余屏蔽细节
                    if error_message.contains("cannot be empty")
                        || error_message.contains("invalid")
                        || error_message.contains("required")
                        || error_message.contains("validation")
                    {
                        (StatusCode::BAD_REQUEST, error_message)
                    } else {
                        tracing::error!("Unhandled application error: {}", error_message);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal server error".to_string(),
                        )
                    }
                }
            },
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
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
