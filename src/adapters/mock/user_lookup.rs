use crate::domain::value_objects::{ContactAddress, UserId};
use crate::ports::user_lookup::{Result, UserLookup as UserLookupTrait};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// UserLookupのモック実装
///
/// 利用者IDと通知先を保存することで状態を持ったテストをサポート。
/// 通知先のない利用者も登録可能。
pub struct UserLookup {
    users: Mutex<HashMap<UserId, Option<ContactAddress>>>,
}

impl UserLookup {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    /// テスト用に通知先付きの利用者を登録
    pub fn add_user(&self, user_id: UserId, contact: ContactAddress) {
        self.users.lock().unwrap().insert(user_id, Some(contact));
    }

    /// テスト用に通知先のない利用者を登録
    pub fn add_user_without_contact(&self, user_id: UserId) {
        self.users.lock().unwrap().insert(user_id, None);
    }
}

impl Default for UserLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserLookupTrait for UserLookup {
    /// 登録された利用者の中に存在するかチェック
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.users.lock().unwrap().contains_key(&user_id))
    }

    /// 登録された通知先を返す
    async fn contact_address_for(&self, user_id: UserId) -> Result<Option<ContactAddress>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned().flatten())
    }
}
