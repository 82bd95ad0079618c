use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Fine, LoanDuration, LoanId, LoanOpened, LoanReturned, ReturnLoanError, UserId};

/// 1日あたりの延滞料金（既定値）
pub const DEFAULT_FINE_PER_DAY: Fine = Fine::new(5000);

/// 貸出の状態
///
/// 状態遷移は Open → Closed の一方向のみ。
/// 返却日時と延滞料金は Closed にしか存在しないため、
/// 「未返却なのに延滞料金がある」状態は型で表現できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoanState {
    /// 貸出中
    Open,
    /// 返却済み（終端状態）
    Closed {
        returned_at: DateTime<Utc>,
        fine: Fine,
    },
}

/// Loan集約 - 1冊の書籍の1回の貸出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub user_id: UserId,
    pub book_id: BookId,

    // 貸出管理の責務
    pub borrowed_at: DateTime<Utc>,
    pub duration: LoanDuration,
    #[serde(flatten)]
    pub state: LoanState,
}

impl Loan {
    /// 返却期限
    ///
    /// 常に borrowed_at + duration から導出する。独立して保存しない。
    pub fn due_at(&self) -> DateTime<Utc> {
        self.borrowed_at + self.duration.as_duration()
    }

    pub fn is_returned(&self) -> bool {
        matches!(self.state, LoanState::Closed { .. })
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            LoanState::Open => None,
            LoanState::Closed { returned_at, .. } => Some(returned_at),
        }
    }

    /// 延滞料金（未返却の場合は0）
    pub fn fine(&self) -> Fine {
        match self.state {
            LoanState::Open => Fine::ZERO,
            LoanState::Closed { fine, .. } => fine,
        }
    }
}

/// 純粋関数：貸出を開始する
///
/// ビジネスルール：
/// - 貸出日時は要求時刻
/// - 状態はOpen
/// - 貸出期間は呼び出し側で検証済み（LoanDuration）
///
/// 副作用なし。新しいLoanとイベントを返す。
pub fn open_loan(
    user_id: UserId,
    book_id: BookId,
    duration: LoanDuration,
    borrowed_at: DateTime<Utc>,
) -> (Loan, LoanOpened) {
    let loan = Loan {
        loan_id: LoanId::new(),
        user_id,
        book_id,
        borrowed_at,
        duration,
        state: LoanState::Open,
    };

    let event = LoanOpened {
        loan_id: loan.loan_id,
        user_id,
        book_id,
        borrowed_at,
        due_at: loan.due_at(),
    };

    (loan, event)
}

/// 純粋関数：延滞日数
///
/// 期限を過ぎた時間を時間単位で切り捨て、24で割った日数。
/// 24時間未満の超過は0日として扱う。
pub fn late_days(due_at: DateTime<Utc>, returned_at: DateTime<Utc>) -> u64 {
    if returned_at <= due_at {
        return 0;
    }
    let hours_late = (returned_at - due_at).num_hours();
    (hours_late / 24) as u64
}

/// 純粋関数：延滞料金の計算
pub fn calculate_fine(due_at: DateTime<Utc>, returned_at: DateTime<Utc>, fine_per_day: Fine) -> Fine {
    Fine::new(late_days(due_at, returned_at).saturating_mul(fine_per_day.amount()))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却済みの貸出は返却不可
/// - 期限超過の場合は延滞日数 × 1日あたりの料金を課す
///
/// 副作用なし。新しいLoanとイベントを返す。
pub fn close_loan(
    loan: &Loan,
    returned_at: DateTime<Utc>,
    fine_per_day: Fine,
) -> Result<(Loan, LoanReturned), ReturnLoanError> {
    // バリデーション：既に返却済みは不可
    if loan.is_returned() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    let due_at = loan.due_at();
    let late_days = late_days(due_at, returned_at);
    let fine = calculate_fine(due_at, returned_at, fine_per_day);

    let closed = Loan {
        state: LoanState::Closed { returned_at, fine },
        ..loan.clone()
    };

    let event = LoanReturned {
        loan_id: loan.loan_id,
        user_id: loan.user_id,
        book_id: loan.book_id,
        returned_at,
        due_at,
        late_days,
        fine,
    };

    Ok((closed, event))
}

/// 純粋関数：返却期限が近いか
///
/// 貸出中で、返却期限が [now, now + horizon) に入る場合にtrue。
/// 既に期限を過ぎた貸出と返却済みの貸出は対象外。
pub fn is_due_soon(loan: &Loan, now: DateTime<Utc>, horizon: Duration) -> bool {
    if loan.is_returned() {
        return false;
    }
    let due_at = loan.due_at();
    match now.checked_add_signed(horizon) {
        Some(until) => due_at >= now && due_at < until,
        // 上限が日時の範囲を超える場合は上限なし
        None => due_at >= now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn week_loan() -> Loan {
        let duration = LoanDuration::try_from(7_i64).unwrap();
        let (loan, _) = open_loan(UserId::new(), BookId::new(), duration, t0());
        loan
    }

    // 不変条件：未返却 ⇔ returned_at なし かつ 延滞料金0
    fn assert_state_invariant(loan: &Loan) {
        assert_eq!(!loan.is_returned(), loan.returned_at().is_none());
        if !loan.is_returned() {
            assert!(loan.fine().is_zero());
        }
        if !loan.fine().is_zero() {
            assert!(loan.returned_at().unwrap() > loan.due_at());
        }
    }

    // open_loan() のテスト
    #[test]
    fn test_open_loan_sets_due_date_from_duration() {
        let user_id = UserId::new();
        let book_id = BookId::new();
        let duration = LoanDuration::try_from(7_i64).unwrap();

        let (loan, event) = open_loan(user_id, book_id, duration, t0());

        assert_eq!(loan.due_at(), t0() + Duration::days(7));
        assert_eq!(loan.state, LoanState::Open);
        assert_eq!(loan.user_id, user_id);
        assert_eq!(loan.book_id, book_id);
        assert_eq!(loan.fine(), Fine::ZERO);
        assert_state_invariant(&loan);

        // イベントの検証
        assert_eq!(event.loan_id, loan.loan_id);
        assert_eq!(event.borrowed_at, t0());
        assert_eq!(event.due_at, loan.due_at());
    }

    // late_days() / calculate_fine() のテスト
    #[test]
    fn test_late_days_truncates_partial_days() {
        let due = t0();
        assert_eq!(late_days(due, due - Duration::hours(1)), 0);
        assert_eq!(late_days(due, due), 0);
        assert_eq!(late_days(due, due + Duration::hours(23)), 0);
        assert_eq!(late_days(due, due + Duration::minutes(24 * 60 - 1)), 0);
        assert_eq!(late_days(due, due + Duration::hours(24)), 1);
        assert_eq!(late_days(due, due + Duration::hours(47)), 1);
        assert_eq!(late_days(due, due + Duration::days(3)), 3);
    }

    #[test]
    fn test_calculate_fine_per_whole_day() {
        let due = t0();
        let per_day = Fine::new(5000);
        assert_eq!(calculate_fine(due, due + Duration::hours(12), per_day), Fine::ZERO);
        assert_eq!(calculate_fine(due, due + Duration::days(2), per_day), Fine::new(10000));
    }

    // close_loan() のテスト
    #[test]
    fn test_close_loan_on_time_has_no_fine() {
        let loan = week_loan();
        let returned_at = t0() + Duration::days(5);

        let (closed, event) = close_loan(&loan, returned_at, DEFAULT_FINE_PER_DAY).unwrap();

        assert_eq!(closed.returned_at(), Some(returned_at));
        assert_eq!(closed.fine(), Fine::ZERO);
        assert!(!event.was_late());
        assert_eq!(event.late_days, 0);
        assert_state_invariant(&closed);
    }

    #[test]
    fn test_close_loan_late_charges_per_day() {
        let loan = week_loan();
        // 期限から2日後
        let returned_at = t0() + Duration::days(9);

        let (closed, event) = close_loan(&loan, returned_at, DEFAULT_FINE_PER_DAY).unwrap();

        assert_eq!(event.late_days, 2);
        assert_eq!(closed.fine(), Fine::new(2 * 5000));
        assert!(event.was_late());
        assert_state_invariant(&closed);
    }

    #[test]
    fn test_close_loan_keeps_identity_and_due_date() {
        let loan = week_loan();
        let (closed, _) = close_loan(&loan, t0() + Duration::days(1), DEFAULT_FINE_PER_DAY).unwrap();

        assert_eq!(closed.loan_id, loan.loan_id);
        assert_eq!(closed.borrowed_at, loan.borrowed_at);
        assert_eq!(closed.due_at(), loan.due_at());
    }

    #[test]
    fn test_close_loan_fails_when_already_returned() {
        let loan = week_loan();
        let (closed, _) = close_loan(&loan, t0() + Duration::days(9), DEFAULT_FINE_PER_DAY).unwrap();

        // 2回目の返却は失敗
        let result = close_loan(&closed, t0() + Duration::days(20), DEFAULT_FINE_PER_DAY);
        assert_eq!(result.unwrap_err(), ReturnLoanError::AlreadyReturned);
    }

    // is_due_soon() のテスト
    #[test]
    fn test_is_due_soon_window() {
        let loan = week_loan();
        let due = loan.due_at();
        let horizon = Duration::hours(24);

        assert!(is_due_soon(&loan, due - Duration::hours(23), horizon));
        assert!(is_due_soon(&loan, due, horizon));
        // ちょうど24時間前は範囲外（半開区間）
        assert!(!is_due_soon(&loan, due - Duration::hours(24), horizon));
        // 期限切れは対象外
        assert!(!is_due_soon(&loan, due + Duration::minutes(1), horizon));
    }

    #[test]
    fn test_is_due_soon_with_unbounded_horizon() {
        let loan = week_loan();

        assert!(is_due_soon(&loan, t0(), Duration::MAX));
        assert!(!is_due_soon(&loan, loan.due_at() + Duration::hours(1), Duration::MAX));
    }

    #[test]
    fn test_is_due_soon_false_when_returned() {
        let loan = week_loan();
        let (closed, _) = close_loan(&loan, t0() + Duration::days(1), DEFAULT_FINE_PER_DAY).unwrap();

        assert!(!is_due_soon(&closed, closed.due_at() - Duration::hours(1), Duration::hours(24)));
    }

    #[test]
    fn test_loan_serializes_state_inline() {
        let loan = week_loan();
        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["status"], "open");

        let (closed, _) = close_loan(&loan, t0() + Duration::days(9), DEFAULT_FINE_PER_DAY).unwrap();
        let json = serde_json::to_value(&closed).unwrap();
        assert_eq!(json["status"], "closed");
        assert_eq!(json["fine"], 10000);

        let back: Loan = serde_json::from_value(json).unwrap();
        assert_eq!(back, closed);
    }
}
