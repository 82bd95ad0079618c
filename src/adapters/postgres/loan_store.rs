use crate::domain::loan::{Loan, LoanState};
use crate::domain::value_objects::{BookId, Fine, LoanDuration, LoanId, UserId};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをLoanに変換する
///
/// duration_days（INTEGER）と fine（BIGINT）はドメインの値オブジェクトに
/// 変換できない場合にエラーを返す。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let duration_days: i32 = row.get("duration_days");
    let duration = LoanDuration::try_from(i64::from(duration_days))
        .map_err(|e| invalid_data(format!("duration_days out of range: {}", e)))?;

    let returned: bool = row.get("returned");
    let returned_at: Option<DateTime<Utc>> = row.get("returned_at");
    let fine: i64 = row.get("fine");

    let state = match (returned, returned_at) {
        (false, _) => LoanState::Open,
        (true, Some(returned_at)) => {
            let fine: u64 = fine
                .try_into()
                .map_err(|_| invalid_data(format!("fine out of range: {}", fine)))?;
            LoanState::Closed {
                returned_at,
                fine: Fine::new(fine),
            }
        }
        (true, None) => {
            return Err(invalid_data(
                "returned loan without returned_at".to_string(),
            ));
        }
    };

    Ok(Loan {
        loan_id: LoanId::from_uuid(row.get("loan_id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        borrowed_at: row.get("borrowed_at"),
        duration,
        state,
    })
}

/// LoanStoreのPostgreSQL実装
///
/// 返却期限は列として持たず、borrowed_at + duration_days * 24時間 で計算する。
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn create(&self, loan: &Loan) -> Result<LoanId> {
        let fine = i64::try_from(loan.fine().amount())?;

        sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                duration_days,
                returned,
                returned_at,
                fine
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.borrowed_at)
        .bind(loan.duration.days() as i32)
        .bind(loan.is_returned())
        .bind(loan.returned_at())
        .bind(fine)
        .execute(&self.pool)
        .await?;

        Ok(loan.loan_id)
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                duration_days,
                returned,
                returned_at,
                fine
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 利用者の全貸出（新しい順）
    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                duration_days,
                returned,
                returned_at,
                fine
            FROM loans
            WHERE user_id = $1
            ORDER BY borrowed_at DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    /// 返却期限が `before` より前の未返却の貸出（期限の早い順）
    async fn get_due_soon(&self, before: DateTime<Utc>) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                user_id,
                book_id,
                borrowed_at,
                duration_days,
                returned,
                returned_at,
                fine
            FROM loans
            WHERE returned = FALSE
              AND borrowed_at + duration_days * INTERVAL '24 hours' < $1
            ORDER BY borrowed_at + duration_days * INTERVAL '24 hours' ASC
            "#,
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    /// 返却を保存する（未返却の行のみ更新）
    ///
    /// `returned = FALSE` を条件にしたUPDATEで、同時返却のうち1件だけが行を更新する。
    async fn update(&self, loan: &Loan) -> Result<bool> {
        let LoanState::Closed { returned_at, fine } = loan.state else {
            return Err("only a returned loan can be written back".into());
        };
        let fine = i64::try_from(fine.amount())?;

        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned = TRUE,
                returned_at = $2,
                fine = $3
            WHERE loan_id = $1 AND returned = FALSE
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(returned_at)
        .bind(fine)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
