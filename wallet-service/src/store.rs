use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundingStatus {
    Pending,
    Success,
    Failed,
}

impl FundingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundingStatus::Pending => "pending",
            FundingStatus::Success => "success",
            FundingStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<FundingStatus> {
        match s {
            "pending" => Some(FundingStatus::Pending),
            "success" => Some(FundingStatus::Success),
            "failed" => Some(FundingStatus::Failed),
            _ => None,
        }
    }
}

/// One funding attempt as persisted. `success` is terminal; a row never
/// leaves it, which is what makes crediting idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FundingTransaction {
    pub reference: String,
    pub user_id: Uuid,
    pub email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub metadata_json: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFundingTransaction {
    pub reference: String,
    pub user_id: Uuid,
    pub email: String,
    pub amount_minor: i64,
    pub currency: String,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    /// This call performed the credit.
    Credited,
    /// The reference was already credited; balance untouched.
    AlreadyCredited,
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Idempotent check-then-create of the backing tables. Safe to call
    /// repeatedly and concurrently; every caller observes the same end
    /// state.
    async fn ensure_provisioned(&self) -> Result<()>;

    /// Upsert a pending row keyed by reference (audit bookkeeping for the
    /// initialize path).
    async fn record_pending(&self, tx: &NewFundingTransaction) -> Result<FundingTransaction>;

    /// Atomically transition the reference to `success` and increment the
    /// wallet, iff the reference was not already `success`. The check and
    /// the credit are one operation at the persistence layer; callers never
    /// read-then-write.
    async fn credit_once(&self, tx: &NewFundingTransaction) -> Result<CreditOutcome>;

    /// Record a failed verification. No-op (returns None) when the row is
    /// already `success` or absent.
    async fn mark_failed(&self, reference: &str) -> Result<Option<FundingTransaction>>;

    async fn balance_minor(&self, user_id: Uuid) -> Result<i64>;

    async fn find(&self, reference: &str) -> Result<Option<FundingTransaction>>;
}

const TX_COLUMNS: &str = "reference, user_id, email, amount_minor, currency, status, metadata_json, created_at, updated_at";

pub struct PgWalletStore {
    pool: PgPool,
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn ensure_provisioned(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS funding_transactions (
                reference TEXT PRIMARY KEY,
                user_id UUID NOT NULL,
                email TEXT NOT NULL,
                amount_minor BIGINT NOT NULL,
                currency TEXT NOT NULL,
                status TEXT NOT NULL,
                metadata_json JSONB,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS funding_transactions_user_idx ON funding_transactions (user_id)",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS wallets (
                user_id UUID PRIMARY KEY,
                balance_minor BIGINT NOT NULL DEFAULT 0,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_pending(&self, tx: &NewFundingTransaction) -> Result<FundingTransaction> {
        let sql = format!(
            r#"INSERT INTO funding_transactions (reference, user_id, email, amount_minor, currency, status, metadata_json)
               VALUES ($1, $2, $3, $4, $5, 'pending', $6)
               ON CONFLICT (reference) DO UPDATE SET updated_at = now()
               RETURNING {TX_COLUMNS}"#,
        );
        let rec = sqlx::query_as::<_, FundingTransaction>(&sql)
            .bind(&tx.reference)
            .bind(tx.user_id)
            .bind(&tx.email)
            .bind(tx.amount_minor)
            .bind(&tx.currency)
            .bind(&tx.metadata)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn credit_once(&self, tx: &NewFundingTransaction) -> Result<CreditOutcome> {
        let mut txn = self.pool.begin().await?;

        // Insert-or-transition in one statement: the row lands in (or moves
        // to) 'success' unless it is already there. Concurrent callers
        // serialize on the row lock; exactly one sees a returned row.
        let transitioned = sqlx::query_scalar::<_, String>(
            r#"INSERT INTO funding_transactions (reference, user_id, email, amount_minor, currency, status, metadata_json)
               VALUES ($1, $2, $3, $4, $5, 'success', $6)
               ON CONFLICT (reference) DO UPDATE
                   SET status = 'success', amount_minor = EXCLUDED.amount_minor, updated_at = now()
                   WHERE funding_transactions.status <> 'success'
               RETURNING reference"#,
        )
        .bind(&tx.reference)
        .bind(tx.user_id)
        .bind(&tx.email)
        .bind(tx.amount_minor)
        .bind(&tx.currency)
        .bind(&tx.metadata)
        .fetch_optional(&mut *txn)
        .await?;

        if transitioned.is_none() {
            txn.rollback().await?;
            return Ok(CreditOutcome::AlreadyCredited);
        }

        sqlx::query(
            r#"INSERT INTO wallets (user_id, balance_minor)
               VALUES ($1, $2)
               ON CONFLICT (user_id) DO UPDATE
                   SET balance_minor = wallets.balance_minor + EXCLUDED.balance_minor,
                       updated_at = now()"#,
        )
        .bind(tx.user_id)
        .bind(tx.amount_minor)
        .execute(&mut *txn)
        .await?;

        txn.commit().await?;
        Ok(CreditOutcome::Credited)
    }

    async fn mark_failed(&self, reference: &str) -> Result<Option<FundingTransaction>> {
        let sql = format!(
            r#"UPDATE funding_transactions
               SET status = 'failed', updated_at = now()
               WHERE reference = $1 AND status <> 'success'
               RETURNING {TX_COLUMNS}"#,
        );
        let rec = sqlx::query_as::<_, FundingTransaction>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }

    async fn balance_minor(&self, user_id: Uuid) -> Result<i64> {
        let balance =
            sqlx::query_scalar::<_, i64>("SELECT balance_minor FROM wallets WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance.unwrap_or(0))
    }

    async fn find(&self, reference: &str) -> Result<Option<FundingTransaction>> {
        let sql = format!("SELECT {TX_COLUMNS} FROM funding_transactions WHERE reference = $1");
        let rec = sqlx::query_as::<_, FundingTransaction>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec)
    }
}

/// Mutex-held maps standing in for Postgres; local development and tests.
/// The lock makes check-and-credit a single atomic section, matching the
/// conditional-update semantics of the SQL path.
#[derive(Default)]
pub struct MemoryWalletStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    transactions: HashMap<String, FundingTransaction>,
    balances: HashMap<Uuid, i64>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn materialize(tx: &NewFundingTransaction, status: FundingStatus) -> FundingTransaction {
    let now = Utc::now();
    FundingTransaction {
        reference: tx.reference.clone(),
        user_id: tx.user_id,
        email: tx.email.clone(),
        amount_minor: tx.amount_minor,
        currency: tx.currency.clone(),
        status: status.as_str().to_string(),
        metadata_json: tx.metadata.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn ensure_provisioned(&self) -> Result<()> {
        Ok(())
    }

    async fn record_pending(&self, tx: &NewFundingTransaction) -> Result<FundingTransaction> {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        let row = inner
            .transactions
            .entry(tx.reference.clone())
            .or_insert_with(|| materialize(tx, FundingStatus::Pending));
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn credit_once(&self, tx: &NewFundingTransaction) -> Result<CreditOutcome> {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        let already_credited = matches!(
            inner.transactions.get(&tx.reference),
            Some(row) if row.status == FundingStatus::Success.as_str()
        );
        if already_credited {
            return Ok(CreditOutcome::AlreadyCredited);
        }
        inner
            .transactions
            .entry(tx.reference.clone())
            .and_modify(|row| {
                row.status = FundingStatus::Success.as_str().to_string();
                row.amount_minor = tx.amount_minor;
                row.updated_at = Utc::now();
            })
            .or_insert_with(|| materialize(tx, FundingStatus::Success));
        *inner.balances.entry(tx.user_id).or_insert(0) += tx.amount_minor;
        Ok(CreditOutcome::Credited)
    }

    async fn mark_failed(&self, reference: &str) -> Result<Option<FundingTransaction>> {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        match inner.transactions.get_mut(reference) {
            Some(row) if row.status != FundingStatus::Success.as_str() => {
                row.status = FundingStatus::Failed.as_str().to_string();
                row.updated_at = Utc::now();
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn balance_minor(&self, user_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().expect("mutex poisoned");
        Ok(inner.balances.get(&user_id).copied().unwrap_or(0))
    }

    async fn find(&self, reference: &str) -> Result<Option<FundingTransaction>> {
        let inner = self.inner.lock().expect("mutex poisoned");
        Ok(inner.transactions.get(reference).cloned())
    }
}
