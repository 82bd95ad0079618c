use chrono::{DateTime, Utc};

/// 時計ポート
///
/// 現在時刻を注入可能にし、延滞料金や期限判定をテストで決定的にする。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
