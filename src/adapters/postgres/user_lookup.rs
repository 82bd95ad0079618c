use crate::domain::value_objects::{ContactAddress, UserId};
use crate::ports::user_lookup::{Result, UserLookup as UserLookupTrait};
use async_trait::async_trait;
use sqlx::PgPool;

/// UserLookupのPostgreSQL実装
///
/// 利用者管理コンテキストが所有する users テーブルを読み取り専用で参照する。
pub struct UserLookup {
    pool: PgPool,
}

impl UserLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLookupTrait for UserLookup {
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id.value())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// 登録されたメールアドレスを返す
    ///
    /// 未登録、または書式が不正なアドレスは `None` として扱う。
    async fn contact_address_for(&self, user_id: UserId) -> Result<Option<ContactAddress>> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT email FROM users WHERE user_id = $1")
                .bind(user_id.value())
                .fetch_optional(&self.pool)
                .await?;

        let Some(email) = email.flatten() else {
            return Ok(None);
        };

        match ContactAddress::new(email) {
            Ok(address) => Ok(Some(address)),
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Ignoring stored contact address: {}", e);
                Ok(None)
            }
        }
    }
}
