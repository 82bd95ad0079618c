use crate::domain::{InvalidIdentifier, LoanDurationError, ReturnLoanError, UserId};
use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LoanApplicationError {
    /// 入力値が不正（貸出期間、識別子の書式）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 参照先の利用者または書籍が存在しない
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// 貸出が見つからない
    #[error("Loan not found")]
    NotFound,

    /// 貸出した本人以外による返却
    #[error("Only the borrower may return this loan")]
    Forbidden,

    /// 既に返却済み
    #[error("Loan has already been returned")]
    AlreadyReturned,

    /// LoanStoreのエラー
    #[error("Loan store unavailable")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// UserLookup / BookCatalog のエラー
    #[error("Reference lookup unavailable")]
    LookupUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<InvalidIdentifier> for LoanApplicationError {
    fn from(err: InvalidIdentifier) -> Self {
        LoanApplicationError::InvalidInput(err.to_string())
    }
}

impl From<LoanDurationError> for LoanApplicationError {
    fn from(err: LoanDurationError) -> Self {
        LoanApplicationError::InvalidInput(err.to_string())
    }
}

impl From<ReturnLoanError> for LoanApplicationError {
    fn from(err: ReturnLoanError) -> Self {
        match err {
            ReturnLoanError::AlreadyReturned => LoanApplicationError::AlreadyReturned,
        }
    }
}

/// 通知の失敗（警告）
///
/// 業務処理の失敗ではない。成功した結果と並べて呼び出し側に返される。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationFailed {
    /// 利用者の通知先が登録されていない
    #[error("No contact address for user {0}")]
    NoContactAddress(UserId),

    /// 通知先の取得に失敗
    #[error("Contact lookup failed: {0}")]
    LookupFailed(String),

    /// 通知の送信に失敗
    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),

    /// 通知がタイムアウトした
    #[error("Notification timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LoanApplicationError>;
