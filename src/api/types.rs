use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::loan::LoanOutcome;
use crate::domain::loan::Loan;

/// 貸出作成リクエスト（POST /loans）
///
/// 借り手はリクエストボディではなく認証済みの利用者（x-user-id）から決まる。
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub book_id: String,
    pub duration_days: i64,
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    pub duration_days: u32,
    pub due_at: DateTime<Utc>,
    pub returned: bool,
    pub returned_at: Option<DateTime<Utc>>,
    pub fine: u64,
}

impl From<&Loan> for LoanResponse {
    fn from(loan: &Loan) -> Self {
        Self {
            loan_id: loan.loan_id.value(),
            user_id: loan.user_id.value(),
            book_id: loan.book_id.value(),
            borrowed_at: loan.borrowed_at,
            duration_days: loan.duration.days(),
            due_at: loan.due_at(),
            returned: loan.is_returned(),
            returned_at: loan.returned_at(),
            fine: loan.fine().amount(),
        }
    }
}

/// 貸出作成・返却のレスポンス
///
/// 通知に失敗した場合は `warnings` にその内容が入る（操作自体は成功）。
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanOutcomeResponse {
    #[serde(flatten)]
    pub loan: LoanResponse,
    pub warnings: Vec<String>,
}

impl From<LoanOutcome> for LoanOutcomeResponse {
    fn from(outcome: LoanOutcome) -> Self {
        Self {
            loan: LoanResponse::from(&outcome.loan),
            warnings: outcome.warning.into_iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
