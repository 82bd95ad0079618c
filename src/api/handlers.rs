use crate::application::loan::{
    LoanApplicationError, ServiceDependencies, create_loan as execute_create_loan,
    get_loans_for_user, return_loan as execute_return_loan,
};
use crate::domain::commands::{CreateLoan, ReturnLoan};
use crate::domain::value_objects::{BookId, LoanId, UserId};
use crate::ports::Clock;
use axum::{
    Json, async_trait,
    extract::{FromRequestParts, Path, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{CreateLoanRequest, LoanOutcomeResponse, LoanResponse},
};

/// 利用者を識別するリクエストヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub clock: Arc<dyn Clock>,
}

// ============================================================================
// Extractors
// ============================================================================

/// リクエストを送った利用者
///
/// 認証は上流で済んでいる前提で、`x-user-id` ヘッダーの値をそのまま使う。
#[derive(Debug, Clone, Copy)]
pub struct RequestingUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for RequestingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {} header", USER_ID_HEADER)))?;

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .map(RequestingUser)
            .ok_or_else(|| ApiError::Unauthenticated(format!("malformed {} header", USER_ID_HEADER)))
    }
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /loans - 新しい貸出を作成
///
/// 強制されるビジネスルール:
/// - 貸出期間が1日以上であること
/// - 利用者と書籍が存在すること
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    RequestingUser(user_id): RequestingUser,
    payload: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoanOutcomeResponse>), ApiError> {
    let Json(req) =
        payload.map_err(|rejection| LoanApplicationError::InvalidInput(rejection.body_text()))?;
    let book_id: BookId = req.book_id.parse().map_err(LoanApplicationError::from)?;

    let cmd = CreateLoan {
        user_id,
        book_id,
        duration_days: req.duration_days,
        requested_at: state.clock.now(),
    };

    let outcome = execute_create_loan(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 強制されるビジネスルール:
/// - 貸出が存在すること
/// - 借りた本人による返却であること
/// - 貸出中であること
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    RequestingUser(user_id): RequestingUser,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanOutcomeResponse>, ApiError> {
    let loan_id: LoanId = loan_id.parse().map_err(LoanApplicationError::from)?;

    let cmd = ReturnLoan {
        loan_id,
        requested_by: user_id,
        returned_at: state.clock.now(),
    };

    let outcome = execute_return_loan(&state.service_deps, cmd).await?;

    Ok(Json(outcome.into()))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /loans - 利用者の貸出一覧
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    RequestingUser(user_id): RequestingUser,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = get_loans_for_user(&state.service_deps, user_id).await?;

    Ok(Json(loans.iter().map(LoanResponse::from).collect()))
}
