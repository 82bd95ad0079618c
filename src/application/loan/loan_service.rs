use crate::domain::loan::{self, Loan};
use crate::domain::{Fine, LoanDuration, LoanOpened, UserId, commands::*};
use crate::ports::*;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::errors::{LoanApplicationError, NotificationFailed, Result};
use super::notification::{self, Notice};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 貸出ポリシー
///
/// 延滞料金は貸出ごとに保存せず、返却時にこの値で計算する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    pub fine_per_day: Fine,
    pub notification_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            fine_per_day: loan::DEFAULT_FINE_PER_DAY,
            notification_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_store: Arc<dyn LoanStore>,
    pub notifier: Arc<dyn Notifier>,
    pub user_lookup: Arc<dyn UserLookup>,
    pub book_catalog: Arc<dyn BookCatalog>,
    pub policy: LoanPolicy,
}

/// 成功した操作の結果
///
/// 通知に失敗しても操作自体は成功しているため、
/// 失敗は `warning` として結果と並べて返す。
#[derive(Debug, Clone)]
pub struct LoanOutcome {
    pub loan: Loan,
    pub warning: Option<NotificationFailed>,
}

/// ポート呼び出しをタイムアウト付きで実行し、失敗をアプリケーションエラーに変換する
async fn bounded<T, F>(
    limit: Duration,
    call: F,
    wrap: fn(BoxError) -> LoanApplicationError,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, BoxError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(wrap),
        Err(elapsed) => Err(wrap(Box::new(elapsed))),
    }
}

/// 利用者へ通知し、失敗した場合は警告としてログに記録する
async fn notify_borrower(
    deps: &ServiceDependencies,
    user_id: UserId,
    notice: &Notice,
) -> Option<NotificationFailed> {
    let result = notification::deliver_notice(
        deps.user_lookup.as_ref(),
        deps.notifier.as_ref(),
        user_id,
        notice,
        deps.policy.notification_timeout,
    )
    .await;

    match result {
        Ok(()) => None,
        Err(warning) => {
            tracing::warn!(user_id = %user_id, subject = %notice.subject, "{}", warning);
            Some(warning)
        }
    }
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出期間は1日以上（上限あり）
/// - 利用者と書籍が参照先に存在すること
///
/// 貸出を保存した後に貸出確認を通知する。
/// 通知の失敗は貸出を巻き戻さず、`LoanOutcome::warning` で返す。
///
/// # エラー
/// - InvalidInput: 貸出期間が不正
/// - InvalidReference: 利用者または書籍が存在しない
/// - LookupUnavailable: 参照チェックの失敗
/// - StoreUnavailable: 保存の失敗（何も保存されない）
pub async fn create_loan(deps: &ServiceDependencies, cmd: CreateLoan) -> Result<LoanOutcome> {
    // 1. 貸出期間の検証
    let duration = LoanDuration::try_from(cmd.duration_days)?;
    let limit = deps.policy.store_timeout;

    // 2. 利用者の存在確認
    let user_exists = bounded(
        limit,
        deps.user_lookup.exists(cmd.user_id),
        LoanApplicationError::LookupUnavailable,
    )
    .await?;
    if !user_exists {
        return Err(LoanApplicationError::InvalidReference(format!(
            "user {} not found",
            cmd.user_id
        )));
    }

    // 3. 書籍の存在確認
    let book_exists = bounded(
        limit,
        deps.book_catalog.exists(cmd.book_id),
        LoanApplicationError::LookupUnavailable,
    )
    .await?;
    if !book_exists {
        return Err(LoanApplicationError::InvalidReference(format!(
            "book {} not found",
            cmd.book_id
        )));
    }

    // 4. ドメイン層の純粋関数を呼び出し
    let (loan, event) = loan::open_loan(cmd.user_id, cmd.book_id, duration, cmd.requested_at);

    // 5. 保存
    let loan_id = bounded(
        limit,
        deps.loan_store.create(&loan),
        LoanApplicationError::StoreUnavailable,
    )
    .await?;
    let loan = Loan { loan_id, ..loan };
    let event = LoanOpened { loan_id, ..event };

    tracing::info!(
        loan_id = %loan_id,
        user_id = %loan.user_id,
        book_id = %loan.book_id,
        due_at = %event.due_at,
        "Loan created"
    );

    // 6. 貸出確認の通知（ベストエフォート）
    let warning = notify_borrower(deps, loan.user_id, &notification::loan_confirmation(&event)).await;

    Ok(LoanOutcome { loan, warning })
}

/// 利用者の貸出一覧を取得する
///
/// 読み取りのみ。貸出がない場合は空のVecを返す。
pub async fn get_loans_for_user(deps: &ServiceDependencies, user_id: UserId) -> Result<Vec<Loan>> {
    bounded(
        deps.policy.store_timeout,
        deps.loan_store.get_by_user(user_id),
        LoanApplicationError::StoreUnavailable,
    )
    .await
}

/// 書籍を返却する
///
/// チェック順序：
/// 1. 貸出が存在すること（NotFound）
/// 2. 返却者が借りた本人であること（Forbidden）
/// 3. 貸出中であること（AlreadyReturned）
///
/// 期限を過ぎていれば延滞日数 × 1日あたりの料金を課す。
/// 保存は貸出単位の compare-and-set で行い、同時返却の敗者は AlreadyReturned になる。
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<LoanOutcome> {
    let limit = deps.policy.store_timeout;

    // 1. 貸出を取得
    let loan = bounded(
        limit,
        deps.loan_store.get_by_id(cmd.loan_id),
        LoanApplicationError::StoreUnavailable,
    )
    .await?
    .ok_or(LoanApplicationError::NotFound)?;

    // 2. 本人確認
    if loan.user_id != cmd.requested_by {
        return Err(LoanApplicationError::Forbidden);
    }

    // 3. ドメイン層の純粋関数を呼び出し（返却済みならエラー）
    let (closed, event) = loan::close_loan(&loan, cmd.returned_at, deps.policy.fine_per_day)?;

    // 4. 保存（貸出中の場合のみ書き込まれる）
    let applied = bounded(
        limit,
        deps.loan_store.update(&closed),
        LoanApplicationError::StoreUnavailable,
    )
    .await?;
    if !applied {
        return Err(LoanApplicationError::AlreadyReturned);
    }

    tracing::info!(
        loan_id = %closed.loan_id,
        user_id = %closed.user_id,
        late_days = event.late_days,
        fine = %event.fine,
        "Loan returned"
    );

    // 5. 返却確認または延滞料金の通知（ベストエフォート）
    let warning = notify_borrower(deps, closed.user_id, &notification::return_notice(&event)).await;

    Ok(LoanOutcome {
        loan: closed,
        warning,
    })
}

/// 返却期限が近い貸出を取得する
///
/// 貸出中で返却期限が [now, now + horizon) に入る貸出を、期限の早い順に返す。
/// 延滞通知バッチ専用の読み取り操作。
///
/// # エラー
/// - InvalidInput: horizon が0以下、または now + horizon が日時の範囲を超える
/// - StoreUnavailable: 取得の失敗
pub async fn list_due_soon(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
    horizon: chrono::Duration,
) -> Result<Vec<Loan>> {
    if horizon <= chrono::Duration::zero() {
        return Err(LoanApplicationError::InvalidInput(format!(
            "horizon must be positive, got {}",
            horizon
        )));
    }
    let until = now.checked_add_signed(horizon).ok_or_else(|| {
        LoanApplicationError::InvalidInput(format!("horizon {} is out of range", horizon))
    })?;

    let candidates = bounded(
        deps.policy.store_timeout,
        deps.loan_store.get_due_soon(until),
        LoanApplicationError::StoreUnavailable,
    )
    .await?;

    let mut due_soon: Vec<Loan> = candidates
        .into_iter()
        .filter(|loan| loan::is_due_soon(loan, now, horizon))
        .collect();
    due_soon.sort_by_key(Loan::due_at);

    Ok(due_soon)
}
