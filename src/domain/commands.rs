use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, UserId};

/// コマンド：書籍を貸し出す
///
/// `duration_days` は未検証の値のまま受け取り、アプリケーション層で
/// `LoanDuration` に変換する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLoan {
    pub user_id: UserId,
    pub book_id: BookId,
    pub duration_days: i64,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub requested_by: UserId,
    pub returned_at: DateTime<Utc>,
}
