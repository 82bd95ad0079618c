use crate::domain::loan::Loan;
use crate::domain::value_objects::{LoanId, UserId};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// LoanStoreのインメモリ実装
///
/// 1つのMutexで全貸出を保護するため、update の compare-and-set は
/// 貸出単位でアトミックになる。
/// 障害を模擬するため、利用不可状態に切り替えられる。
pub struct LoanStore {
    loans: Mutex<HashMap<LoanId, Loan>>,
    unavailable: AtomicBool,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            loans: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// テスト用に貸出を直接登録
    pub fn insert(&self, loan: Loan) {
        self.loans.lock().unwrap().insert(loan.loan_id, loan);
    }

    /// 保存されている貸出の件数
    pub fn len(&self) -> usize {
        self.loans.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// trueの間、すべての操作がエラーを返す
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("loan store unavailable".into());
        }
        Ok(())
    }
}

impl Default for LoanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn create(&self, loan: &Loan) -> Result<LoanId> {
        self.check_available()?;
        let mut loans = self.loans.lock().unwrap();
        if loans.contains_key(&loan.loan_id) {
            return Err(format!("duplicate loan id {}", loan.loan_id).into());
        }
        loans.insert(loan.loan_id, loan.clone());
        Ok(loan.loan_id)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        self.check_available()?;
        Ok(self.loans.lock().unwrap().get(&loan_id).cloned())
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        self.check_available()?;
        let loans = self.loans.lock().unwrap();
        Ok(loans
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_due_soon(&self, before: DateTime<Utc>) -> Result<Vec<Loan>> {
        self.check_available()?;
        let loans = self.loans.lock().unwrap();
        Ok(loans
            .values()
            .filter(|l| !l.is_returned() && l.due_at() < before)
            .cloned()
            .collect())
    }

    async fn update(&self, loan: &Loan) -> Result<bool> {
        self.check_available()?;
        if !loan.is_returned() {
            return Err("only a returned loan can be written back".into());
        }
        let mut loans = self.loans.lock().unwrap();
        match loans.get(&loan.loan_id) {
            Some(stored) if !stored.is_returned() => {
                loans.insert(loan.loan_id, loan.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
