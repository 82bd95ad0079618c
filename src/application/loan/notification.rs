use crate::domain::loan::Loan;
use crate::domain::{LoanOpened, LoanReturned, UserId};
use crate::ports::{Notifier, UserLookup};
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::errors::NotificationFailed;

/// 利用者に送る通知（件名と本文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// 貸出確認
pub fn loan_confirmation(event: &LoanOpened) -> Notice {
    Notice {
        subject: "Loan confirmation".to_string(),
        body: format!(
            "Thank you for borrowing from the library. Please return the book by {}.",
            format_date(event.due_at)
        ),
    }
}

/// 返却時の通知
///
/// 延滞料金がある場合は延滞料金の通知、ない場合は返却確認。
pub fn return_notice(event: &LoanReturned) -> Notice {
    if event.fine.is_zero() {
        Notice {
            subject: "Return confirmation".to_string(),
            body: "The book you borrowed has been returned successfully.".to_string(),
        }
    } else {
        Notice {
            subject: "Late return fine".to_string(),
            body: format!(
                "The book you borrowed was returned {} day(s) late. A fine of {} has been charged.",
                event.late_days, event.fine
            ),
        }
    }
}

/// 返却期限が近い貸出のリマインダー
pub fn due_soon_reminder(loan: &Loan) -> Notice {
    Notice {
        subject: "Return reminder".to_string(),
        body: format!(
            "Book {} that you borrowed is due on {}. Please return it on time.",
            loan.book_id,
            format_date(loan.due_at())
        ),
    }
}

/// 利用者の通知先を解決して通知を送る
///
/// 通知先の取得と送信の全体を `limit` で打ち切る。
/// 失敗は `NotificationFailed` として返し、呼び出し側の処理は止めない。
pub(crate) async fn deliver_notice(
    user_lookup: &dyn UserLookup,
    notifier: &dyn Notifier,
    user_id: UserId,
    notice: &Notice,
    limit: Duration,
) -> std::result::Result<(), NotificationFailed> {
    let delivery = async {
        let recipient = user_lookup
            .contact_address_for(user_id)
            .await
            .map_err(|e| NotificationFailed::LookupFailed(e.to_string()))?
            .ok_or(NotificationFailed::NoContactAddress(user_id))?;

        notifier
            .send(&recipient, &notice.subject, &notice.body)
            .await
            .map_err(|e| NotificationFailed::DeliveryFailed(e.to_string()))
    };

    match tokio::time::timeout(limit, delivery).await {
        Ok(result) => result,
        Err(_) => Err(NotificationFailed::TimedOut(limit)),
    }
}
