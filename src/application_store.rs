//! Persistence for loan applications
//!
//! [`ApplicationStore`] is the seam between the submission handler and the
//! database so the handler can be exercised without PostgreSQL.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use crate::application::{ApplicationStatus, LoanApplication, NewLoanApplication};

/// Store failures. The message is surfaced to callers as-is.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// Storage abstraction for loan application rows.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert a new `pending` row and return its generated id.
    ///
    /// Either the row is committed and the id returned, or nothing is written.
    async fn insert(&self, application: &NewLoanApplication) -> Result<i64, StoreError>;

    async fn fetch(&self, id: i64) -> Result<Option<LoanApplication>, StoreError>;

    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgApplicationStore {
    db_pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn insert(&self, application: &NewLoanApplication) -> Result<i64, StoreError> {
        // Connection and transaction are released on drop; an uncommitted
        // transaction rolls back.
        let mut tx = self.db_pool.begin().await?;

        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO loan_applications (
                email, amount, term_months, monthly_payment, interest_rate,
                purpose, income, additional_info, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&application.email)
        .bind(application.amount)
        .bind(application.term_months)
        .bind(application.monthly_payment)
        .bind(application.interest_rate)
        .bind(&application.purpose)
        .bind(&application.income)
        .bind(&application.additional_info)
        .bind(ApplicationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Option<LoanApplication>, StoreError> {
        let application = sqlx::query_as::<_, LoanApplication>(
            r#"
            SELECT id, email, amount, term_months, monthly_payment, interest_rate,
                   purpose, income, additional_info, status, created_at
            FROM loan_applications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(application)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }
}

/// Process-local store, handy for tests and for running without a database.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    rows: Mutex<Vec<LoanApplication>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row in insertion order
    pub fn rows(&self) -> Vec<LoanApplication> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, application: &NewLoanApplication) -> Result<i64, StoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;

        let id = rows.len() as i64 + 1;
        rows.push(LoanApplication {
            id,
            email: application.email.clone(),
            amount: application.amount,
            term_months: application.term_months,
            monthly_payment: application.monthly_payment,
            interest_rate: application.interest_rate,
            purpose: application.purpose.clone(),
            income: application.income.clone(),
            additional_info: application.additional_info.clone(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn fetch(&self, id: i64) -> Result<Option<LoanApplication>, StoreError> {
        Ok(self.rows().into_iter().find(|row| row.id == id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
