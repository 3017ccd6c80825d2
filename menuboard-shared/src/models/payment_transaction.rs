/// Subscription payment transactions
///
/// A checkout records a `pending` transaction with a random
/// `provider_reference`. The payment provider later reports the outcome for
/// that reference; on success the transaction is marked `succeeded` and the
/// tenant's premium period is extended, in the same database transaction.

use crate::models::tenant::Tenant;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub currency: String,

    /// Premium months bought
    pub months: i32,

    pub status: PaymentStatus,

    /// Token handed to the payment provider and echoed back on completion
    pub provider_reference: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentTransaction {
    pub amount: Decimal,
    pub currency: String,
    pub months: i32,
}

/// Result of applying a provider notification
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// Payment succeeded and premium was extended
    Activated {
        transaction: PaymentTransaction,
        tenant: Tenant,
    },

    /// The reference had already succeeded; nothing changed
    AlreadyActivated { transaction: PaymentTransaction },

    /// Payment failed and the transaction was marked failed
    Failed { transaction: PaymentTransaction },

    /// A failure reported for an already-succeeded payment; ignored
    Ignored { transaction: PaymentTransaction },
}

const PAYMENT_COLUMNS: &str =
    "id, tenant_id, amount, currency, months, status, provider_reference, created_at, updated_at";

/// Generates a provider reference: `mb_` followed by 32 hex characters
pub fn generate_reference() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    format!("mb_{}", hex::encode(bytes))
}

impl PaymentTransaction {
    /// Records a pending transaction with a fresh reference
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: CreatePaymentTransaction,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            INSERT INTO payment_transactions (tenant_id, amount, currency, months, provider_reference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(data.amount)
        .bind(data.currency)
        .bind(data.months)
        .bind(generate_reference())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_transactions WHERE provider_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(pool)
        .await
    }

    /// Lists one tenant's transactions, newest first
    pub async fn list_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payment_transactions
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Lists transactions of all tenants, newest first
    pub async fn list_all(
        pool: &PgPool,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM payment_transactions
            WHERE $1::payment_status IS NULL OR status = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Sum of succeeded payments (platform stats)
    pub async fn total_revenue(pool: &PgPool) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM payment_transactions WHERE status = 'succeeded'",
        )
        .fetch_one(pool)
        .await
    }

    /// Applies the provider's verdict for a reference
    ///
    /// The transaction row is locked, so concurrent deliveries of the same
    /// notification extend premium only once. Returns None for an unknown
    /// reference.
    pub async fn apply_provider_result(
        pool: &PgPool,
        reference: &str,
        succeeded: bool,
    ) -> Result<Option<PaymentOutcome>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(transaction) = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_transactions \
             WHERE provider_reference = $1 FOR UPDATE"
        ))
        .bind(reference)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let outcome = match (transaction.status, succeeded) {
            (PaymentStatus::Succeeded, true) => PaymentOutcome::AlreadyActivated { transaction },
            (PaymentStatus::Succeeded, false) => PaymentOutcome::Ignored { transaction },
            (_, true) => {
                let transaction = set_status(&mut tx, transaction.id, PaymentStatus::Succeeded).await?;
                let tenant = Tenant::activate_premium(&mut *tx, transaction.tenant_id, transaction.months)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                PaymentOutcome::Activated { transaction, tenant }
            }
            (_, false) => {
                let transaction = set_status(&mut tx, transaction.id, PaymentStatus::Failed).await?;
                PaymentOutcome::Failed { transaction }
            }
        };

        tx.commit().await?;
        Ok(Some(outcome))
    }

    /// Marks pending transactions created before `older_than` as failed
    pub async fn fail_stale_pending(
        pool: &PgPool,
        older_than: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'failed', updated_at = NOW()
            WHERE status = 'pending' AND created_at < $1
            "#,
        )
        .bind(older_than)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

async fn set_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    status: PaymentStatus,
) -> Result<PaymentTransaction, sqlx::Error> {
    sqlx::query_as::<_, PaymentTransaction>(&format!(
        r#"
        UPDATE payment_transactions SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
}
