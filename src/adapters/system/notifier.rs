use crate::domain::value_objects::ContactAddress;
use crate::ports::notifier::{Notifier as NotifierTrait, Result};
use async_trait::async_trait;

/// ログに出力するだけのNotifier
///
/// メール送信を設定していない環境で使用する。
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifierTrait for LogNotifier {
    async fn send(&self, recipient: &ContactAddress, subject: &str, body: &str) -> Result<()> {
        tracing::debug!(recipient = %recipient, subject, body, "Notification (not delivered: email disabled)");
        Ok(())
    }
}
