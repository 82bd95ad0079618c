use crate::application::loan::LoanApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    /// アプリケーション層のエラー
    Application(LoanApplicationError),
    /// 利用者を特定できない（x-user-id がない、または不正）
    Unauthenticated(String),
}

impl From<LoanApplicationError> for ApiError {
    fn from(err: LoanApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),

            // 400 Bad Request - 入力不正、ビジネスルール違反
            ApiError::Application(LoanApplicationError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg)
            }
            ApiError::Application(LoanApplicationError::InvalidReference(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REFERENCE", msg)
            }
            ApiError::Application(LoanApplicationError::AlreadyReturned) => (
                StatusCode::BAD_REQUEST,
                "ALREADY_RETURNED",
                "Loan has already been returned".to_string(),
            ),

            // 401 Unauthorized - 借りた本人以外による返却
            ApiError::Application(LoanApplicationError::Forbidden) => (
                StatusCode::UNAUTHORIZED,
                "FORBIDDEN",
                "Only the borrower may return this loan".to_string(),
            ),

            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::Application(LoanApplicationError::NotFound) => (
                StatusCode::NOT_FOUND,
                "LOAN_NOT_FOUND",
                "Loan not found".to_string(),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Application(LoanApplicationError::StoreUnavailable(e)) => {
                tracing::error!("Loan store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_UNAVAILABLE",
                    "Failed to access loan store".to_string(),
                )
            }
            ApiError::Application(LoanApplicationError::LookupUnavailable(e)) => {
                tracing::error!("Reference lookup error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOOKUP_UNAVAILABLE",
                    "Failed to verify user or book".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
