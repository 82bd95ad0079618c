use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 貸出期間の上限（日数）
///
/// 返却期限の計算が日時の範囲を超えないようにするための上限。
pub const MAX_LOAN_DURATION_DAYS: u32 = 3650;

/// 識別子の書式エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid identifier: {0}")]
pub struct InvalidIdentifier(pub String);

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = InvalidIdentifier;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| InvalidIdentifier(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_identifier!(
    /// 貸出ID - 貸出集約のID
    LoanId
);

uuid_identifier!(
    /// 書籍ID - カタログ管理コンテキストへの参照
    BookId
);

uuid_identifier!(
    /// 利用者ID - 利用者管理コンテキストへの参照
    UserId
);

/// 貸出期間エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanDurationError {
    /// 0日以下
    #[error("loan duration must be positive, got {0} days")]
    NotPositive(i64),
    /// 上限を超えている
    #[error("loan duration must not exceed {} days, got {0}", MAX_LOAN_DURATION_DAYS)]
    TooLong(i64),
}

/// 貸出期間（日数）
///
/// 不変条件：1以上、上限以下。
/// 型で制約を強制し、0日や負の期間の貸出を作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct LoanDuration(u32);

impl LoanDuration {
    pub fn days(&self) -> u32 {
        self.0
    }

    /// chronoの期間に変換する
    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.0))
    }
}

impl TryFrom<i64> for LoanDuration {
    type Error = LoanDurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(LoanDurationError::NotPositive(value));
        }
        if value > i64::from(MAX_LOAN_DURATION_DAYS) {
            return Err(LoanDurationError::TooLong(value));
        }
        Ok(Self(value as u32))
    }
}

impl From<LoanDuration> for i64 {
    fn from(duration: LoanDuration) -> Self {
        i64::from(duration.0)
    }
}

/// 延滞料金（通貨単位の整数）
///
/// 負の値は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fine(u64);

impl Fine {
    pub const ZERO: Fine = Fine(0);

    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Fine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 連絡先アドレスの書式エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid contact address: {0}")]
pub struct InvalidContactAddress(pub String);

/// 通知先アドレス（メールアドレス）
///
/// 書式の最低限の確認のみ行う。配送可能かどうかは通知アダプターが判断する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactAddress(String);

impl ContactAddress {
    pub fn new(address: impl Into<String>) -> Result<Self, InvalidContactAddress> {
        let address = address.into();
        let trimmed = address.trim();
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(InvalidContactAddress(address)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContactAddress {
    type Error = InvalidContactAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContactAddress> for String {
    fn from(address: ContactAddress) -> Self {
        address.0
    }
}

impl fmt::Display for ContactAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // LoanDuration のテスト
    #[test]
    fn test_loan_duration_accepts_positive_days() {
        let duration = LoanDuration::try_from(7_i64).unwrap();
        assert_eq!(duration.days(), 7);
        assert_eq!(duration.as_duration(), chrono::Duration::days(7));
    }

    #[test]
    fn test_loan_duration_rejects_zero() {
        let result = LoanDuration::try_from(0_i64);
        assert_eq!(result.unwrap_err(), LoanDurationError::NotPositive(0));
    }

    #[test]
    fn test_loan_duration_rejects_negative() {
        let result = LoanDuration::try_from(-3_i64);
        assert_eq!(result.unwrap_err(), LoanDurationError::NotPositive(-3));
    }

    #[test]
    fn test_loan_duration_rejects_too_long() {
        let result = LoanDuration::try_from(i64::from(MAX_LOAN_DURATION_DAYS) + 1);
        assert!(matches!(result, Err(LoanDurationError::TooLong(_))));
        assert!(LoanDuration::try_from(i64::from(MAX_LOAN_DURATION_DAYS)).is_ok());
    }

    #[test]
    fn test_domain_error_messages() {
        assert_eq!(
            LoanDurationError::NotPositive(0).to_string(),
            "loan duration must be positive, got 0 days"
        );
        assert_eq!(
            LoanDurationError::TooLong(4000).to_string(),
            "loan duration must not exceed 3650 days, got 4000"
        );
        assert_eq!(
            InvalidIdentifier("42".to_string()).to_string(),
            "invalid identifier: 42"
        );
        assert_eq!(
            InvalidContactAddress("x".to_string()).to_string(),
            "invalid contact address: x"
        );
    }

    #[test]
    fn test_loan_duration_deserialize_validates() {
        let ok: LoanDuration = serde_json::from_str("14").unwrap();
        assert_eq!(ok.days(), 14);
        assert!(serde_json::from_str::<LoanDuration>("0").is_err());
    }

    // ID value objects のテスト
    #[test]
    fn test_loan_id_creation() {
        let id1 = LoanId::new();
        let id2 = LoanId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_user_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_identifier_parse() {
        let uuid = Uuid::new_v4();
        let id: BookId = uuid.to_string().parse().unwrap();
        assert_eq!(id.value(), uuid);

        let err = "42".parse::<BookId>().unwrap_err();
        assert_eq!(err, InvalidIdentifier("42".to_string()));
    }

    // ContactAddress のテスト
    #[test]
    fn test_contact_address_valid() {
        let address = ContactAddress::new(" reader@example.com ").unwrap();
        assert_eq!(address.as_str(), "reader@example.com");
    }

    #[test]
    fn test_contact_address_invalid() {
        assert!(ContactAddress::new("").is_err());
        assert!(ContactAddress::new("no-at-sign").is_err());
        assert!(ContactAddress::new("@example.com").is_err());
        assert!(ContactAddress::new("reader@").is_err());
    }
}
