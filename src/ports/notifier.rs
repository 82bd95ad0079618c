use crate::domain::value_objects::ContactAddress;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知ポート
///
/// 利用者への通知配信メカニズムを抽象化する。
/// 失敗は呼び出し側でログに記録され、業務処理を巻き戻さない。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 件名と本文を宛先に送信する
    async fn send(&self, recipient: &ContactAddress, subject: &str, body: &str) -> Result<()>;
}
