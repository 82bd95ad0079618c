use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Fine, LoanId, UserId};

/// イベント：貸出が開始された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOpened {
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// イベント：書籍が返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub returned_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub late_days: u64,
    pub fine: Fine,
}

impl LoanReturned {
    pub fn was_late(&self) -> bool {
        self.returned_at > self.due_at
    }
}
