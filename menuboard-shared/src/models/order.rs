/// Customer order model and database operations
///
/// Orders store a priced snapshot of the cart in `items` (JSONB) so later menu
/// edits don't change what was ordered. Status is a flat enum: any status may
/// be set at any time.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('pending', 'preparing', 'ready', 'completed', 'cancelled');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     order_number INTEGER NOT NULL,          -- per tenant, starts at 1
///     table_number INTEGER,
///     customer_name VARCHAR(255),
///     notes TEXT,
///     items JSONB NOT NULL DEFAULT '[]',
///     total_amount NUMERIC(10, 2) NOT NULL,
///     status order_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
///     UNIQUE (tenant_id, order_number)
/// );
/// ```

use crate::cart::OrderLine;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order lifecycle status
///
/// Typical flow is `pending → preparing → ready → completed`, but
/// transitions are not restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Orders still being worked on by the kitchen
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown order status '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// Human-facing number, sequential per tenant
    pub order_number: i32,

    pub table_number: Option<i32>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,

    /// Priced line snapshot
    pub items: Json<Vec<OrderLine>>,

    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub table_number: Option<i32>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
    pub total_amount: Decimal,
}

/// Filter for the admin order feed
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,

    /// Only rows changed after this instant (polling cursor)
    pub since: Option<DateTime<Utc>>,

    pub limit: i64,
}

/// Dashboard counters for one tenant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStats {
    pub orders_today: i64,

    /// Sum of today's orders that weren't cancelled
    pub revenue_today: Decimal,

    /// Open orders (pending, preparing, ready) regardless of day
    pub open_orders: i64,

    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

const ORDER_COLUMNS: &str = "id, tenant_id, order_number, table_number, customer_name, notes, \
     items, total_amount, status, created_at, updated_at";

impl Order {
    /// Inserts an order with the tenant's next order number
    ///
    /// The tenant row is locked for the duration of the insert so concurrent
    /// orders get distinct numbers.
    pub async fn create(
        pool: &PgPool,
        tenant_id: Uuid,
        data: CreateOrder,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM tenants WHERE id = $1 FOR UPDATE")
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders
                (tenant_id, order_number, table_number, customer_name, notes, items, total_amount)
            VALUES (
                $1,
                (SELECT COALESCE(MAX(order_number), 0) + 1 FROM orders WHERE tenant_id = $1),
                $2, $3, $4, $5, $6
            )
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(data.table_number)
        .bind(data.customer_name)
        .bind(data.notes)
        .bind(Json(data.items))
        .bind(data.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists orders
    ///
    /// With `since`, rows changed after it come oldest change first so a
    /// poller can page forward; without it, the most recent changes come first.
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        filter: OrderFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let order_by = if filter.since.is_some() {
            "updated_at, order_number"
        } else {
            "updated_at DESC, order_number DESC"
        };

        sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE tenant_id = $1
              AND ($2::order_status IS NULL OR status = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR updated_at > $3)
            ORDER BY {order_by}
            LIMIT $4
            "#
        ))
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.since)
        .bind(filter.limit)
        .fetch_all(pool)
        .await
    }

    /// Sets the status; any transition is allowed
    pub async fn update_status(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders SET status = $3, updated_at = clock_timestamp()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes dashboard counters; "today" starts at `day_start`
    pub async fn stats(
        pool: &PgPool,
        tenant_id: Uuid,
        day_start: DateTime<Utc>,
    ) -> Result<OrderStats, sqlx::Error> {
        let (orders_today, revenue_today, open_orders): (i64, Decimal, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE created_at >= $2),
                COALESCE(SUM(total_amount) FILTER (WHERE created_at >= $2 AND status <> 'cancelled'), 0),
                COUNT(*) FILTER (WHERE status IN ('pending', 'preparing', 'ready'))
            FROM orders
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(day_start)
        .fetch_one(pool)
        .await?;

        let by_status = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count FROM orders
            WHERE tenant_id = $1 AND created_at >= $2
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(tenant_id)
        .bind(day_start)
        .fetch_all(pool)
        .await?;

        Ok(OrderStats {
            orders_today,
            revenue_today,
            open_orders,
            by_status,
        })
    }

    /// Counts orders of all tenants created since `since` (platform stats)
    pub async fn count_all_since(pool: &PgPool, since: DateTime<Utc>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE created_at >= $1")
            .bind(since)
            .fetch_one(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("pending".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert_eq!(" Ready ".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert_eq!("cancelled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("served".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_round_trips_as_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Ready.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }
}
