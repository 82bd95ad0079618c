use crate::domain::value_objects::{ContactAddress, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者参照ポート
///
/// 貸出コンテキストと利用者管理コンテキストの境界を維持する。
/// 貸出コンテキストはUserIdと通知先のみを知り、アカウント詳細は知らない。
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// 利用者が存在するか確認する
    ///
    /// 貸出作成前の参照チェックに使用される。
    async fn exists(&self, user_id: UserId) -> Result<bool>;

    /// 利用者の通知先アドレスを取得する
    ///
    /// 利用者が存在しない、または連絡先が未登録の場合は `None`。
    async fn contact_address_for(&self, user_id: UserId) -> Result<Option<ContactAddress>>;
}
