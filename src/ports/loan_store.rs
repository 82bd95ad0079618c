use crate::domain::loan::Loan;
use crate::domain::value_objects::{LoanId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出ストアポート
///
/// 貸出集約の永続化を抽象化する。
/// 返却期限（due_at）は borrowed_at と貸出期間から導出し、独立して保存しない。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 新しい貸出を保存し、保存したIDを返す
    async fn create(&self, loan: &Loan) -> Result<LoanId>;

    /// IDで貸出を取得する
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 利用者の全貸出を取得する
    ///
    /// 順序は規定しない。
    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Loan>>;

    /// 返却期限が `before` より前の未返却の貸出を取得する
    ///
    /// 返却期限の近い貸出の通知バッチに使用される。
    async fn get_due_soon(&self, before: DateTime<Utc>) -> Result<Vec<Loan>>;

    /// 返却済みになった貸出を保存する
    ///
    /// 貸出単位でアトミックな compare-and-set：保存済みの貸出がまだ貸出中の場合のみ
    /// 書き込み、`true` を返す。既に返却済みだった場合は何も書かずに `false` を返す。
    /// 同じ貸出に対する同時返却のうち、成功するのは1件だけになる。
    async fn update(&self, loan: &Loan) -> Result<bool>;
}
